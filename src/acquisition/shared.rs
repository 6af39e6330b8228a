use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::AcquisitionError;
use crate::processing::detectors::DeviationEvent;
use crate::processing::signal_processor::SignalProcessor;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AcquisitionStatus {
    #[default]
    Connecting,
    Streaming,
    Failed(String),
    Stopped,
}

impl AcquisitionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Stopped)
    }
}

/// Cheap per-frame view of the EEG state.
#[derive(Debug, Clone, PartialEq)]
pub struct EegSnapshot {
    pub status: AcquisitionStatus,
    pub mean: f64,
    pub deviation_count: usize,
    pub samples: usize,
}

/// Everything the acquisition loop recorded, for end-of-session reporting.
#[derive(Debug, Clone, Default)]
pub struct EegReport {
    pub status: AcquisitionStatus,
    pub sample_rate: f64,
    pub mean: f64,
    pub raw: Vec<f64>,
    pub filtered: Vec<f64>,
    pub events: Vec<DeviationEvent>,
}

#[derive(Debug, Default)]
struct EegState {
    status: AcquisitionStatus,
    sample_rate: f64,
    mean: f64,
    raw: Vec<f64>,
    filtered: Vec<f64>,
    events: Vec<DeviationEvent>,
}

/// EEG state shared between the acquisition thread (sole writer) and the
/// game loop (reader).
///
/// Readers only ever get copies taken under the lock. Status changes wake
/// anyone blocked in [`SharedEegState::wait_until_ready`].
#[derive(Debug, Default)]
pub struct SharedEegState {
    state: Mutex<EegState>,
    status_changed: Condvar,
}

impl SharedEegState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> AcquisitionStatus {
        self.state.lock().status.clone()
    }

    pub fn deviation_count(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn snapshot(&self) -> EegSnapshot {
        let state = self.state.lock();
        EegSnapshot {
            status: state.status.clone(),
            mean: state.mean,
            deviation_count: state.events.len(),
            samples: state.raw.len(),
        }
    }

    pub fn report(&self) -> EegReport {
        let state = self.state.lock();
        EegReport {
            status: state.status.clone(),
            sample_rate: state.sample_rate,
            mean: state.mean,
            raw: state.raw.clone(),
            filtered: state.filtered.clone(),
            events: state.events.clone(),
        }
    }

    /// Block until the board is streaming, the loop gives up, or `timeout`
    /// passes.
    pub fn wait_until_ready(&self, timeout: Duration) -> Result<(), AcquisitionError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            match &state.status {
                AcquisitionStatus::Streaming => return Ok(()),
                AcquisitionStatus::Failed(reason) => {
                    return Err(AcquisitionError::Failed(reason.clone()))
                }
                AcquisitionStatus::Stopped => return Err(AcquisitionError::Stopped),
                AcquisitionStatus::Connecting => {}
            }
            if Instant::now() >= deadline {
                return Err(AcquisitionError::ConnectTimeout(timeout));
            }
            self.status_changed.wait_until(&mut state, deadline);
        }
    }

    /// Block until the loop has stopped or failed, or `timeout` passes.
    /// Returns the status at that point.
    pub fn wait_until_terminal(&self, timeout: Duration) -> AcquisitionStatus {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.status.is_terminal() {
            if self.status_changed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.status.clone()
    }

    pub(crate) fn set_status(&self, status: AcquisitionStatus) {
        let mut state = self.state.lock();
        state.status = status;
        self.status_changed.notify_all();
    }

    pub(crate) fn set_sample_rate(&self, sample_rate: f64) {
        self.state.lock().sample_rate = sample_rate;
    }

    /// Only the unseen tail of the raw history is copied under the lock. The
    /// filtered history changes as a whole every tick, so it is copied before
    /// locking and swapped in.
    pub(crate) fn publish(&self, processor: &SignalProcessor, new_events: Vec<DeviationEvent>) {
        let filtered = processor.filtered().to_vec();

        let previous = {
            let mut state = self.state.lock();
            state.mean = processor.statistics().mean;
            let seen = state.raw.len();
            let tail = processor.raw().get(seen..).unwrap_or_default();
            state.raw.extend_from_slice(tail);
            state.events.extend(new_events);
            std::mem::replace(&mut state.filtered, filtered)
        };
        drop(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn ready_once_streaming() {
        let shared = Arc::new(SharedEegState::new());
        let writer = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.set_status(AcquisitionStatus::Streaming);
        });

        shared.wait_until_ready(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn failure_ends_the_wait() {
        let shared = SharedEegState::new();
        shared.set_status(AcquisitionStatus::Failed("no headband".into()));
        match shared.wait_until_ready(Duration::from_secs(5)) {
            Err(AcquisitionError::Failed(reason)) => assert_eq!(reason, "no headband"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wait_times_out_while_connecting() {
        let shared = SharedEegState::new();
        let started = Instant::now();
        let result = shared.wait_until_ready(Duration::from_millis(30));
        assert!(matches!(result, Err(AcquisitionError::ConnectTimeout(_))));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn publish_appends_raw_and_replaces_filtered() {
        use crate::processing::detectors::DeviationDetectorConfig;
        use crate::processing::filters::BandPassFilterConfig;

        let shared = SharedEegState::new();
        let mut processor = SignalProcessor::new(
            BandPassFilterConfig::default(),
            DeviationDetectorConfig::default(),
            256.0,
        )
        .unwrap();

        for tick in 0..4 {
            let chunk: Vec<f64> = (0..100).map(|i| ((tick * 100 + i) as f64 * 0.1).sin()).collect();
            processor.process_chunk(&chunk);
            shared.publish(&processor, Vec::new());

            let report = shared.report();
            assert_eq!(report.raw, processor.raw());
            assert_eq!(report.filtered, processor.filtered());
            assert_eq!(report.mean, processor.statistics().mean);
        }

        // An empty read adds nothing.
        processor.process_chunk(&[]);
        shared.publish(&processor, Vec::new());
        assert_eq!(shared.report().raw.len(), 400);
    }

    #[test]
    fn fresh_state_is_empty() {
        let snapshot = SharedEegState::new().snapshot();
        assert_eq!(snapshot.status, AcquisitionStatus::Connecting);
        assert_eq!(snapshot.deviation_count, 0);
        assert_eq!(snapshot.samples, 0);
    }
}
