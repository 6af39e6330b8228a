use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use lex_insight::config::{load_config, save_config, Config};
use lex_insight::game::Variant;
use lex_insight::local::process_file::{analyse_file, print_file_analysis};
use lex_insight::local::run_session;
use lex_insight::utils::log::init_logging;

/// Gaze and EEG driven word experiment.
#[derive(Parser, Debug)]
#[command(name = "lex-insight")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a game session
    Run {
        /// YAML config; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration to PATH
    InitConfig { path: PathBuf },

    /// Replay a recorded CSV through the EEG pipeline
    ProcessFile {
        path: PathBuf,

        /// Column holding the EEG channel
        #[arg(long, default_value = "0")]
        column: usize,

        /// Sampling rate of the recording in Hz
        #[arg(long, default_value = "256")]
        sample_rate: f64,

        /// First row is a header
        #[arg(long)]
        headers: bool,

        /// Filter, detector and chunk size settings come from this config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(config),
        Commands::InitConfig { path } => {
            save_config(&Config::default(), &path)
                .with_context(|| format!("writing default config to {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
        Commands::ProcessFile {
            path,
            column,
            sample_rate,
            headers,
            config,
        } => {
            let config = read_config(config)?;
            init_logging(&config.logging).context("initialising logging")?;
            let analysis = analyse_file(
                &path,
                column,
                sample_rate,
                config.eeg.acquisition.chunk_size,
                headers,
                config.filter,
                config.detector,
            )
            .with_context(|| format!("processing {}", path.display()))?;
            print_file_analysis(&analysis);
            Ok(())
        }
    }
}

fn read_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            load_config(&path).with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = read_config(config_path)?;
    if let Some(log_file) = init_logging(&config.logging).context("initialising logging")? {
        info!(path = %log_file.display(), "Logging to file");
    }

    let outcome = run_session(&config).context("session failed")?;

    if config.visualization.enabled && config.game.variant == Variant::EegDeviation {
        match &outcome.eeg {
            Some(report) => show_session_window(&config, report, &outcome.results),
            None => warn!("No EEG recorded, skipping session window"),
        }
    }
    Ok(())
}

#[cfg(feature = "visualization")]
fn show_session_window(
    config: &Config,
    report: &lex_insight::acquisition::EegReport,
    results: &[lex_insight::game::RoundResult],
) {
    use lex_insight::visualization::window::SessionWindow;
    use lex_insight::visualization::SignalPlotter;

    let plotter = SignalPlotter::from_report(report, results, config.visualization.max_points);
    if let Err(e) = SessionWindow::run(plotter, config.visualization.clone()) {
        warn!(error = %e, "Session window failed");
    }
}

#[cfg(not(feature = "visualization"))]
fn show_session_window(
    _config: &Config,
    _report: &lex_insight::acquisition::EegReport,
    _results: &[lex_insight::game::RoundResult],
) {
    warn!("Built without the visualization feature, skipping session window");
}
