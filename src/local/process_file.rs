use std::path::Path;
use std::time::{Duration, Instant};

use colored::Colorize;
use tracing::info;

use crate::device::playback::read_signals_from_csv;
use crate::error::{AcquisitionError, DeviceError};
use crate::processing::detectors::{DeviationDetectorConfig, DeviationEvent};
use crate::processing::filters::BandPassFilterConfig;
use crate::processing::SignalProcessor;

/// How many events `print_file_analysis` lists before summarising.
const EVENTS_SHOWN: usize = 10;

#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub samples: usize,
    pub chunks: usize,
    pub sample_rate: f64,
    pub mean: f64,
    pub events: Vec<DeviationEvent>,
    pub elapsed: Duration,
}

/// Replay one column of a recorded CSV through the live signal pipeline,
/// `chunk_size` samples at a time.
pub fn analyse_file<P: AsRef<Path>>(
    path: P,
    column: usize,
    sample_rate: f64,
    chunk_size: usize,
    has_headers: bool,
    filter: BandPassFilterConfig,
    detector: DeviationDetectorConfig,
) -> Result<FileAnalysis, AcquisitionError> {
    let path = path.as_ref();
    let mut processor = SignalProcessor::new(filter, detector, sample_rate)?;

    let mut columns = read_signals_from_csv(path, has_headers)?;
    let available = columns.len();
    if column >= available {
        return Err(DeviceError::ChannelOutOfRange { channel: column, available }.into());
    }
    let signal = columns.swap_remove(column);

    info!(path = %path.display(), samples = signal.len(), "Processing recording");

    let start_time = Instant::now();
    let mut events = Vec::new();
    for (i, chunk) in signal.chunks(chunk_size.max(1)).enumerate() {
        let chunk_start = Instant::now();
        events.extend(processor.process_chunk(chunk));
        info!(
            chunk = i + 1,
            elapsed = ?chunk_start.elapsed(),
            events = events.len(),
            "Processed chunk"
        );
    }

    Ok(FileAnalysis {
        samples: signal.len(),
        chunks: processor.chunk_count(),
        sample_rate,
        mean: processor.statistics().mean,
        events,
        elapsed: start_time.elapsed(),
    })
}

pub fn print_file_analysis(analysis: &FileAnalysis) {
    println!("{}", "Recording analysis".bold());
    println!(
        "  {} samples in {} chunks at {} Hz ({:.1} s)",
        analysis.samples,
        analysis.chunks,
        analysis.sample_rate,
        analysis.samples as f64 / analysis.sample_rate
    );
    println!("  Mean: {:.4}", analysis.mean);
    println!(
        "  Deviations: {}",
        analysis.events.len().to_string().yellow().bold()
    );
    for event in analysis.events.iter().take(EVENTS_SHOWN) {
        println!(
            "    {:>9.4}s - {:>9.4}s  magnitude {:.2}",
            event.start_time, event.end_time, event.magnitude
        );
    }
    if analysis.events.len() > EVENTS_SHOWN {
        println!("    ... {} more", analysis.events.len() - EVENTS_SHOWN);
    }
    println!("  Processed in {:?}", analysis.elapsed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::detectors::AppendMode;
    use std::io::Write;

    fn recording(samples: &[f64]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for (i, v) in samples.iter().enumerate() {
            writeln!(file, "{},{}", i, v).unwrap();
        }
        file
    }

    fn detector() -> DeviationDetectorConfig {
        DeviationDetectorConfig {
            threshold: 50.0,
            append_mode: AppendMode::NewSamples,
        }
    }

    #[test]
    fn spike_in_recording_is_found() {
        let mut samples: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.3).sin() * 5.0).collect();
        samples[600] = 900.0;
        let file = recording(&samples);

        let analysis = analyse_file(
            file.path(),
            1,
            256.0,
            250,
            false,
            BandPassFilterConfig::default(),
            detector(),
        )
        .unwrap();

        assert_eq!(analysis.samples, 1000);
        assert_eq!(analysis.chunks, 4);
        assert!(analysis
            .events
            .iter()
            .any(|e| (e.start_time - 600.0 / 256.0).abs() < 1e-9));
    }

    #[test]
    fn missing_column_is_an_error() {
        let file = recording(&[1.0, 2.0, 3.0]);
        let result = analyse_file(
            file.path(),
            5,
            256.0,
            250,
            false,
            BandPassFilterConfig::default(),
            detector(),
        );
        assert!(matches!(
            result,
            Err(AcquisitionError::Device(DeviceError::ChannelOutOfRange {
                channel: 5,
                available: 2
            }))
        ));
    }
}
