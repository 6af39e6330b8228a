#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lex_insight::device::EegBoard;
use lex_insight::error::DeviceError;

pub const FS: f64 = 256.0;

/// Scripted board: fails where told to, counts releases, and can put a
/// large spike into one chunk.
pub struct MockBoard {
    pub releases: Arc<AtomicUsize>,
    pub reads: Arc<AtomicUsize>,
    pub fail_prepare: bool,
    pub fail_after_reads: Option<usize>,
    pub connect_delay: Duration,
    pub spike_in_read: Option<usize>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            releases: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
            fail_prepare: false,
            fail_after_reads: None,
            connect_delay: Duration::ZERO,
            spike_in_read: None,
        }
    }

    pub fn release_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }
}

impl EegBoard for MockBoard {
    fn name(&self) -> &str {
        "mock"
    }

    fn sampling_rate(&self) -> f64 {
        FS
    }

    fn eeg_channels(&self) -> Vec<usize> {
        vec![1]
    }

    fn prepare_session(&mut self) -> Result<(), DeviceError> {
        std::thread::sleep(self.connect_delay);
        if self.fail_prepare {
            return Err(DeviceError::Connection("headband not found".into()));
        }
        Ok(())
    }

    fn start_stream(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn get_current_board_data(&mut self, n: usize) -> Result<Vec<Vec<f64>>, DeviceError> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after_reads {
            if read >= limit {
                return Err(DeviceError::Read("stream dropped".into()));
            }
        }

        let offset = read * n;
        let mut eeg: Vec<f64> = (0..n)
            .map(|i| ((offset + i) as f64 * 0.2).sin() * 5.0)
            .collect();
        if self.spike_in_read == Some(read) && n > 0 {
            eeg[n / 2] = 1000.0;
        }
        Ok(vec![vec![read as f64; n], eeg])
    }

    fn release_session(&mut self) -> Result<(), DeviceError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn releases(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
