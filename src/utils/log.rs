use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive. `RUST_LOG` takes precedence when set.
    pub level: String,
    pub log_to_file: bool,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// `<dir>/session_<timestamp>.log`
pub fn session_log_path(dir: &Path, started: DateTime<Local>) -> PathBuf {
    dir.join(format!("session_{}.log", started.format("%Y%m%d_%H%M%S")))
}

/// Install the global subscriber: stderr always, plus a plain-text session
/// file when `log_to_file` is set. Returns the file path if one was opened.
pub fn init_logging(config: &LoggingConfig) -> io::Result<Option<PathBuf>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, path) = if config.log_to_file {
        // Create directory if it doesn't exist
        fs::create_dir_all(&config.log_dir)?;
        let path = session_log_path(&config.log_dir, Local::now());
        let file = File::create(&path)?;
        let layer = fmt::layer()
            .with_ansi(false)
            .with_thread_names(true)
            .with_writer(Arc::new(file));
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    Ok(path)
}
