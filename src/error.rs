use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Startup configuration problems. These are never recoverable.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid band {low} Hz - {high} Hz: require 0 < low < high < {nyquist} Hz (Nyquist)")]
    InvalidBand { low: f64, high: f64, nyquist: f64 },

    #[error("Invalid sample rate {0} Hz")]
    InvalidSampleRate(f64),

    #[error("Filter order must be at least 1")]
    InvalidOrder,
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Failed to connect to board: {0}")]
    Connection(String),

    #[error("Failed to read board data: {0}")]
    Read(String),

    #[error("EEG channel {channel} out of range, board has {available} EEG channels")]
    ChannelOutOfRange { channel: usize, available: usize },

    #[error("Board session not prepared")]
    NotPrepared,

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("EEG acquisition failed: {0}")]
    Failed(String),

    #[error("Timed out after {0:?} waiting for the EEG board")]
    ConnectTimeout(Duration),

    #[error("EEG acquisition stopped before becoming ready")]
    Stopped,
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Word list needs at least 3 entries, found {found}")]
    InsufficientWords { found: usize },

    #[error("Game needs at least one round")]
    NoRounds,

    #[error("Failed to read word list {path}: {source}")]
    WordList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read gaze script: {0}")]
    Script(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
}
