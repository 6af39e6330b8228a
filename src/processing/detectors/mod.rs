pub mod deviation;

pub use deviation::{detect, detect_from, AppendMode, DeviationDetectorConfig};

/// One sample-wide window where the filtered signal sat further than the
/// threshold from the running mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviationEvent {
    /// Seconds from the start of the recorded history.
    pub start_time: f64,
    pub end_time: f64,
    /// |sample - mean|
    pub magnitude: f64,
}

impl DeviationEvent {
    pub fn at_index(index: usize, magnitude: f64, fs: f64) -> Self {
        Self {
            start_time: index as f64 / fs,
            end_time: (index + 1) as f64 / fs,
            magnitude,
        }
    }
}
