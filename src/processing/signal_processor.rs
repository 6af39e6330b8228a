use tracing::debug;

use super::detectors::{detect, detect_from, AppendMode, DeviationDetectorConfig, DeviationEvent};
use super::filters::{BandPassFilter, BandPassFilterConfig};
use super::statistics::RunningStatistics;
use crate::error::FilterError;

/// Chunks of history needed before the first filter pass.
pub const MIN_CHUNKS_FOR_ANALYSIS: usize = 2;

// -----------------------------------------------------------------------------
// SIGNAL PROCESSOR
// -----------------------------------------------------------------------------

/// Per-tick EEG pipeline: chunk history, whole-history refilter, running mean
/// and deviation detection.
///
/// Every call to [`SignalProcessor::process_chunk`] refilters the entire
/// accumulated history and recomputes the mean from scratch, so cost grows
/// with session length. The same processor backs the live acquisition loop
/// and offline file analysis.
pub struct SignalProcessor {
    filter: BandPassFilter,
    detector: DeviationDetectorConfig,
    chunks: usize,
    raw: Vec<f64>,
    filtered: Vec<f64>,
    statistics: RunningStatistics,
    scanned: usize,
}

impl SignalProcessor {
    pub fn new(
        filter_config: BandPassFilterConfig,
        detector: DeviationDetectorConfig,
        fs: f64,
    ) -> Result<Self, FilterError> {
        Ok(SignalProcessor {
            filter: BandPassFilter::new(filter_config, fs)?,
            detector,
            chunks: 0,
            raw: Vec::new(),
            filtered: Vec::new(),
            statistics: RunningStatistics::default(),
            scanned: 0,
        })
    }

    /// Append one chunk and return the events to add to the session log.
    ///
    /// Empty chunks (nothing new from the board yet) are ignored and do not
    /// count towards [`MIN_CHUNKS_FOR_ANALYSIS`].
    pub fn process_chunk(&mut self, chunk: &[f64]) -> Vec<DeviationEvent> {
        if chunk.is_empty() {
            debug!("Board returned an empty chunk");
            return Vec::new();
        }

        self.raw.extend_from_slice(chunk);
        self.chunks += 1;

        if self.chunks < MIN_CHUNKS_FOR_ANALYSIS {
            return Vec::new();
        }

        self.filtered = self.filter.filter(&self.raw);
        self.statistics = RunningStatistics::from_samples(&self.filtered);

        let fs = self.filter.sample_rate();
        let threshold = self.detector.threshold;
        let mean = self.statistics.mean;
        let events = match self.detector.append_mode {
            AppendMode::WholeHistory => detect(&self.filtered, mean, threshold, fs),
            AppendMode::NewSamples => {
                detect_from(&self.filtered, self.scanned, mean, threshold, fs)
            }
        };
        self.scanned = self.filtered.len();

        debug!(
            chunks = self.chunks,
            samples = self.raw.len(),
            mean = self.statistics.mean,
            events = events.len(),
            "Processed EEG chunk"
        );

        events
    }

    pub fn sample_rate(&self) -> f64 {
        self.filter.sample_rate()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    pub fn filtered(&self) -> &[f64] {
        &self.filtered
    }

    pub fn statistics(&self) -> RunningStatistics {
        self.statistics
    }
}
