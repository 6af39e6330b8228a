use crate::acquisition::EegReport;
use crate::game::RoundResult;

/// Plot-ready copy of one session: decimated `(time, value)` series, the
/// distinct deviation times and the round results.
#[derive(Debug, Clone, Default)]
pub struct SignalPlotter {
    raw: Vec<(f64, f64)>,
    filtered: Vec<(f64, f64)>,
    /// `(start, end)` in seconds, sorted, no repeats.
    deviations: Vec<(f64, f64)>,
    mean: f64,
    results: Vec<RoundResult>,
}

impl SignalPlotter {
    pub fn from_report(report: &EegReport, results: &[RoundResult], max_points: usize) -> Self {
        let fs = report.sample_rate;

        // Whole-history mode logs the same sample again on later ticks.
        let mut deviations: Vec<(f64, f64)> = report
            .events
            .iter()
            .map(|e| (e.start_time, e.end_time))
            .collect();
        deviations.sort_by(|a, b| a.0.total_cmp(&b.0));
        deviations.dedup();

        Self {
            raw: decimate(&report.raw, fs, max_points),
            filtered: decimate(&report.filtered, fs, max_points),
            deviations,
            mean: report.mean,
            results: results.to_vec(),
        }
    }

    pub fn raw(&self) -> &[(f64, f64)] {
        &self.raw
    }

    pub fn filtered(&self) -> &[(f64, f64)] {
        &self.filtered
    }

    pub fn deviations(&self) -> &[(f64, f64)] {
        &self.deviations
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.raw.first()?.0;
        let last = self.raw.last()?.0;
        Some((first, last))
    }
}

/// Every `ceil(len / max_points)`-th sample, stamped with its time.
fn decimate(samples: &[f64], fs: f64, max_points: usize) -> Vec<(f64, f64)> {
    if samples.is_empty() || fs <= 0.0 {
        return Vec::new();
    }
    let step = samples.len().div_ceil(max_points.max(1)).max(1);
    samples
        .iter()
        .enumerate()
        .step_by(step)
        .map(|(i, v)| (i as f64 / fs, *v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::AcquisitionStatus;
    use crate::processing::detectors::DeviationEvent;

    fn report(len: usize) -> EegReport {
        EegReport {
            status: AcquisitionStatus::Stopped,
            sample_rate: 100.0,
            mean: 1.5,
            raw: (0..len).map(|i| i as f64).collect(),
            filtered: vec![0.0; len],
            events: vec![
                DeviationEvent::at_index(7, 60.0, 100.0),
                DeviationEvent::at_index(3, 80.0, 100.0),
                DeviationEvent::at_index(7, 55.0, 100.0),
            ],
        }
    }

    #[test]
    fn long_histories_are_decimated() {
        let plot = SignalPlotter::from_report(&report(10_000), &[], 1000);
        assert_eq!(plot.raw().len(), 1000);
        assert_eq!(plot.raw()[1], (0.1, 10.0));
        assert_eq!(plot.time_range(), Some((0.0, 99.9)));
    }

    #[test]
    fn short_histories_are_kept_whole() {
        let plot = SignalPlotter::from_report(&report(50), &[], 1000);
        assert_eq!(plot.raw().len(), 50);
        assert_eq!(plot.filtered().len(), 50);
    }

    #[test]
    fn repeated_deviations_are_marked_once() {
        let plot = SignalPlotter::from_report(&report(50), &[], 1000);
        assert_eq!(plot.deviations(), &[(0.03, 0.04), (0.07, 0.08)]);
    }

    #[test]
    fn empty_report_has_no_time_range() {
        let plot = SignalPlotter::from_report(&EegReport::default(), &[], 1000);
        assert!(plot.time_range().is_none());
    }
}
