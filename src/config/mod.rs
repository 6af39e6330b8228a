use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::acquisition::AcquisitionConfig;
use crate::device::simulated::SIMULATED_SAMPLE_RATE;
use crate::error::ConfigError;
use crate::game::Variant;
use crate::processing::detectors::DeviationDetectorConfig;
use crate::processing::filters::BandPassFilterConfig;
use crate::utils::log::LoggingConfig;
use crate::visualization::VisualizationConfig;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub gaze: GazeConfig,
    pub eeg: EegConfig,
    pub filter: BandPassFilterConfig,
    pub detector: DeviationDetectorConfig,
    pub logging: LoggingConfig,
    pub visualization: VisualizationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub rounds: usize,
    pub variant: Variant,
    pub words_path: PathBuf,
    pub frame_rate: f64,
    /// Pause after each commit while the result is shown.
    pub result_display_ms: u64,
    /// Sleep between frames to hold `frame_rate`. Off for scripted replays.
    pub pace_frames: bool,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rounds: 10,
            variant: Variant::GazeTime,
            words_path: PathBuf::from("data/random_words.txt"),
            frame_rate: 30.0,
            result_display_ms: 2000,
            pace_frames: true,
            seed: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GazeSourceKind {
    #[default]
    Simulated,
    Script,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GazeConfig {
    pub source: GazeSourceKind,
    pub script_path: Option<PathBuf>,
    /// Simulated subject only.
    pub commit_every_frames: u32,
    pub seed: Option<u64>,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            source: GazeSourceKind::Simulated,
            script_path: None,
            commit_every_frames: 90,
            seed: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoardKind {
    #[default]
    Simulated,
    Playback,
}

/// What the session does when EEG acquisition fails.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EegFailurePolicy {
    /// End the run with an error.
    #[default]
    Abort,
    /// Keep playing without EEG feedback.
    Degrade,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EegConfig {
    pub board: BoardKind,
    pub playback_path: Option<PathBuf>,
    pub playback_sample_rate: f64,
    pub playback_has_headers: bool,
    pub board_seed: Option<u64>,
    pub on_failure: EegFailurePolicy,
    #[serde(flatten)]
    pub acquisition: AcquisitionConfig,
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            board: BoardKind::Simulated,
            playback_path: None,
            playback_sample_rate: SIMULATED_SAMPLE_RATE,
            playback_has_headers: false,
            board_seed: None,
            on_failure: EegFailurePolicy::Abort,
            acquisition: AcquisitionConfig::default(),
        }
    }
}

impl EegConfig {
    /// Sample rate the configured board will report.
    pub fn nominal_sample_rate(&self) -> f64 {
        match self.board {
            BoardKind::Simulated => SIMULATED_SAMPLE_RATE,
            BoardKind::Playback => self.playback_sample_rate,
        }
    }
}

impl Config {
    /// Startup checks. The word list is checked separately when loaded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.rounds == 0 {
            return Err(invalid("game.rounds", "must be at least 1"));
        }
        if !(self.game.frame_rate.is_finite() && self.game.frame_rate > 0.0) {
            return Err(invalid(
                "game.frame_rate",
                format!("must be positive, got {}", self.game.frame_rate),
            ));
        }
        if self.gaze.source == GazeSourceKind::Script && self.gaze.script_path.is_none() {
            return Err(invalid("gaze.script_path", "required when gaze.source is script"));
        }

        if self.game.variant == Variant::EegDeviation {
            if self.eeg.acquisition.chunk_size == 0 {
                return Err(invalid("eeg.chunk_size", "must be at least 1"));
            }
            if self.eeg.board == BoardKind::Playback && self.eeg.playback_path.is_none() {
                return Err(invalid("eeg.playback_path", "required when eeg.board is playback"));
            }
            if !(self.detector.threshold.is_finite() && self.detector.threshold >= 0.0) {
                return Err(invalid(
                    "detector.threshold",
                    format!("must be non-negative, got {}", self.detector.threshold),
                ));
            }
            self.filter.validate(self.eeg.nominal_sample_rate())?;
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&config_str).map_err(ConfigError::Parse)
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let yaml = serde_yaml::to_string(config).map_err(ConfigError::Serialize)?;

    fs::write(path, yaml).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::processing::detectors::AppendMode;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = "
game:
  rounds: 3
  variant: eeg_deviation
eeg:
  channel: 2
  on_failure: degrade
detector:
  append_mode: new_samples
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.game.rounds, 3);
        assert_eq!(config.game.variant, Variant::EegDeviation);
        assert_eq!(config.game.frame_rate, 30.0);
        assert_eq!(config.eeg.acquisition.channel, 2);
        assert_eq!(config.eeg.acquisition.chunk_size, 250);
        assert_eq!(config.eeg.on_failure, EegFailurePolicy::Degrade);
        assert_eq!(config.detector.append_mode, AppendMode::NewSamples);
        assert_eq!(config.detector.threshold, 50.0);
        assert_eq!(config.filter, BandPassFilterConfig::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.game.seed = Some(99);
        config.filter.f_high = 30.0;
        save_config(&config, &path).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }

    #[test]
    fn zero_rounds_is_invalid() {
        let mut config = Config::default();
        config.game.rounds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "game.rounds", .. })
        ));
    }

    #[test]
    fn band_above_nyquist_is_invalid_for_eeg_variant() {
        let mut config = Config::default();
        config.game.variant = Variant::EegDeviation;
        config.filter.f_high = 200.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Filter(FilterError::InvalidBand { .. }))
        ));

        config.game.variant = Variant::GazeTime;
        config.validate().unwrap();
    }

    #[test]
    fn script_source_needs_a_path() {
        let mut config = Config::default();
        config.gaze.source = GazeSourceKind::Script;
        assert!(config.validate().is_err());
    }
}
