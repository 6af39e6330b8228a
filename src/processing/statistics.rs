// STATISTICS COMPONENT --------------------------------------------------------

/// Mean of every filtered sample seen so far.
///
/// Rebuilt from the full filtered history on each update rather than kept as
/// a streaming mean, because the history itself is refiltered every tick and
/// older samples change value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStatistics {
    pub sum: f64,
    pub count: usize,
    pub mean: f64,
}

impl RunningStatistics {
    pub fn from_samples(samples: &[f64]) -> Self {
        let sum: f64 = samples.iter().sum();
        let count = samples.len();
        let mean = if count > 0 { sum / count as f64 } else { 0.0 };
        Self { sum, count, mean }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_samples() {
        let stats = RunningStatistics::from_samples(&[1.0, 2.0, 3.0, 6.0]);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.sum, 12.0);
        assert_eq!(stats.mean, 3.0);
    }

    #[test]
    fn empty_history_has_zero_mean() {
        assert_eq!(RunningStatistics::from_samples(&[]), RunningStatistics::default());
    }
}
