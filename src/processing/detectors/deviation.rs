use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::DeviationEvent;

/// How events from each refiltered pass are added to the session log.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppendMode {
    /// Every event found over the whole history, on every tick. Earlier
    /// samples are counted again each time the history is refiltered.
    #[default]
    WholeHistory,
    /// Only events at sample indices that no earlier pass has scanned.
    NewSamples,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DeviationDetectorConfig {
    /// Absolute distance from the mean, in the units of the signal (µV).
    pub threshold: f64,
    pub append_mode: AppendMode,
}

impl Default for DeviationDetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 50.0,
            append_mode: AppendMode::WholeHistory,
        }
    }
}

/// One event per sample where `|sample - mean| > threshold`.
///
/// Adjacent exceeding samples are reported as separate events; nothing is
/// merged.
pub fn detect(filtered: &[f64], mean: f64, threshold: f64, fs: f64) -> Vec<DeviationEvent> {
    detect_from(filtered, 0, mean, threshold, fs)
}

/// Same as [`detect`] but only scans `filtered[from..]`. Event times stay
/// relative to the start of `filtered`.
pub fn detect_from(
    filtered: &[f64],
    from: usize,
    mean: f64,
    threshold: f64,
    fs: f64,
) -> Vec<DeviationEvent> {
    if from >= filtered.len() {
        return Vec::new();
    }

    filtered[from..]
        .par_iter()
        .enumerate()
        .filter_map(|(offset, &sample)| {
            let deviation = (sample - mean).abs();
            (deviation > threshold).then(|| DeviationEvent::at_index(from + offset, deviation, fs))
        })
        .collect()
}
