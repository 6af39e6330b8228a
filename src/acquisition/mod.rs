pub mod shared;

pub use shared::{AcquisitionStatus, EegReport, EegSnapshot, SharedEegState};

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::device::{BoardSession, EegBoard};
use crate::error::{AcquisitionError, DeviceError};
use crate::processing::detectors::DeviationDetectorConfig;
use crate::processing::filters::BandPassFilterConfig;
use crate::processing::SignalProcessor;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Index into the board's EEG channel list.
    pub channel: usize,
    /// Samples requested from the board per tick.
    pub chunk_size: usize,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            channel: 1,
            chunk_size: 250,
            poll_interval_ms: 1000,
            connect_timeout_ms: 10_000,
        }
    }
}

impl AcquisitionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Start the acquisition loop on its own thread.
///
/// The signal processor is built up front so an invalid band for this
/// board's sample rate is reported here instead of from inside the thread.
/// The board is released exactly once however the loop ends.
pub fn spawn(
    board: Box<dyn EegBoard>,
    config: AcquisitionConfig,
    filter: BandPassFilterConfig,
    detector: DeviationDetectorConfig,
) -> Result<AcquisitionHandle, AcquisitionError> {
    let processor = SignalProcessor::new(filter, detector, board.sampling_rate())?;

    let shared = Arc::new(SharedEegState::new());
    shared.set_sample_rate(board.sampling_rate());

    let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
    let timeout = config.connect_timeout();

    let worker = AcquisitionLoop {
        session: BoardSession::new(board),
        processor,
        config,
        shared: Arc::clone(&shared),
        stop: stop_rx,
    };

    let thread = thread::Builder::new()
        .name("eeg-acquisition".into())
        .spawn(move || worker.run())
        .map_err(|e| AcquisitionError::Failed(format!("could not spawn acquisition thread: {e}")))?;

    Ok(AcquisitionHandle {
        shared,
        stop: Some(stop_tx),
        thread: Some(thread),
        connect_timeout: timeout,
    })
}

// -----------------------------------------------------------------------------
// ACQUISITION LOOP
// -----------------------------------------------------------------------------

enum LoopExit {
    Cancelled,
    Failed(String),
}

struct AcquisitionLoop {
    session: BoardSession,
    processor: SignalProcessor,
    config: AcquisitionConfig,
    shared: Arc<SharedEegState>,
    stop: Receiver<()>,
}

impl AcquisitionLoop {
    fn run(mut self) {
        // Marks the state Failed if a panic unwinds through the loop. The
        // session's own Drop releases the board.
        let _panic_guard = PanicGuard(Arc::clone(&self.shared));

        info!(board = self.session.name(), "Connecting to EEG board");
        let exit = self.stream();
        self.session.release();

        match exit {
            LoopExit::Cancelled => {
                info!("EEG acquisition stopped");
                self.shared.set_status(AcquisitionStatus::Stopped);
            }
            LoopExit::Failed(reason) => {
                error!(%reason, "EEG acquisition failed");
                self.shared.set_status(AcquisitionStatus::Failed(reason));
            }
        }
    }

    fn stream(&mut self) -> LoopExit {
        if let Err(e) = self.session.connect() {
            return LoopExit::Failed(e.to_string());
        }
        if self.cancelled() {
            return LoopExit::Cancelled;
        }

        info!(
            board = self.session.name(),
            sample_rate = self.session.sampling_rate(),
            channel = self.config.channel,
            "EEG board streaming"
        );
        self.shared.set_status(AcquisitionStatus::Streaming);

        loop {
            if self.cancelled() {
                return LoopExit::Cancelled;
            }

            if let Err(e) = self.tick() {
                return LoopExit::Failed(e.to_string());
            }

            match self.stop.recv_timeout(self.config.poll_interval()) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return LoopExit::Cancelled,
            }
        }
    }

    fn tick(&mut self) -> Result<(), DeviceError> {
        let block = self
            .session
            .read_channel(self.config.chunk_size, self.config.channel)?;
        let events = self.processor.process_chunk(&block.samples);
        if !events.is_empty() {
            debug!(new_events = events.len(), "Deviations detected");
        }
        self.shared.publish(&self.processor, events);
        Ok(())
    }

    fn cancelled(&self) -> bool {
        match self.stop.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        }
    }
}

struct PanicGuard(Arc<SharedEegState>);

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0
                .set_status(AcquisitionStatus::Failed("acquisition thread panicked".into()));
        }
    }
}

// -----------------------------------------------------------------------------
// HANDLE
// -----------------------------------------------------------------------------

/// Owning handle to a running acquisition loop. Dropping it stops the loop
/// and joins the thread.
pub struct AcquisitionHandle {
    shared: Arc<SharedEegState>,
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    connect_timeout: Duration,
}

impl AcquisitionHandle {
    /// Wait for the board to start streaming, bounded by the configured
    /// connect timeout.
    pub fn wait_until_ready(&self) -> Result<(), AcquisitionError> {
        self.shared.wait_until_ready(self.connect_timeout)
    }

    pub fn status(&self) -> AcquisitionStatus {
        self.shared.status()
    }

    pub fn snapshot(&self) -> EegSnapshot {
        self.shared.snapshot()
    }

    pub fn deviation_count(&self) -> usize {
        self.shared.deviation_count()
    }

    pub fn report(&self) -> EegReport {
        self.shared.report()
    }

    pub fn shared(&self) -> Arc<SharedEegState> {
        Arc::clone(&self.shared)
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Signal the loop to stop and join it. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The loop may already have exited and dropped its receiver.
            let _ = stop.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("EEG acquisition thread panicked");
            }
        }
    }
}

impl AcquisitionHandle {
    /// Signal the loop to stop without waiting for it.
    ///
    /// For a loop that may be stuck inside the board's connect call. The
    /// thread finishes on its own once connect returns, and the board is
    /// still released exactly once.
    pub fn detach(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            debug!(thread = ?thread.thread().name(), "Detached EEG acquisition thread");
        }
    }
}

impl Drop for AcquisitionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
