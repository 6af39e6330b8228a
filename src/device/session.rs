use tracing::{info, warn};

use super::{EegBoard, SampleBlock};
use crate::error::DeviceError;

/// Owns a board for the lifetime of one acquisition session and releases it
/// exactly once, whether the session ends normally, fails, or unwinds.
pub struct BoardSession {
    board: Box<dyn EegBoard>,
    released: bool,
}

impl BoardSession {
    pub fn new(board: Box<dyn EegBoard>) -> Self {
        Self {
            board,
            released: false,
        }
    }

    pub fn name(&self) -> &str {
        self.board.name()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.board.sampling_rate()
    }

    pub fn connect(&mut self) -> Result<(), DeviceError> {
        self.board.prepare_session()?;
        self.board.start_stream()
    }

    /// Newest `num_samples` for the `channel`-th EEG channel of the board.
    pub fn read_channel(
        &mut self,
        num_samples: usize,
        channel: usize,
    ) -> Result<SampleBlock, DeviceError> {
        let eeg_channels = self.board.eeg_channels();
        let row = *eeg_channels
            .get(channel)
            .ok_or(DeviceError::ChannelOutOfRange {
                channel,
                available: eeg_channels.len(),
            })?;

        let mut data = self.board.get_current_board_data(num_samples)?;
        let rows = data.len();
        if row >= rows {
            return Err(DeviceError::Read(format!(
                "board returned {rows} rows, EEG row {row} missing"
            )));
        }

        Ok(SampleBlock {
            samples: data.swap_remove(row),
            sample_rate: self.board.sampling_rate(),
        })
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.board.release_session() {
            Ok(()) => info!(board = self.board.name(), "Board session released"),
            Err(e) => warn!(board = self.board.name(), error = %e, "Failed to release board session"),
        }
    }
}

impl Drop for BoardSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingBoard {
        releases: Arc<AtomicUsize>,
    }

    impl EegBoard for CountingBoard {
        fn name(&self) -> &str {
            "counting"
        }
        fn sampling_rate(&self) -> f64 {
            100.0
        }
        fn eeg_channels(&self) -> Vec<usize> {
            vec![1, 2]
        }
        fn prepare_session(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }
        fn start_stream(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }
        fn get_current_board_data(&mut self, n: usize) -> Result<Vec<Vec<f64>>, DeviceError> {
            Ok((0..3).map(|row| vec![row as f64; n]).collect())
        }
        fn release_session(&mut self) -> Result<(), DeviceError> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn session() -> (BoardSession, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let board = CountingBoard {
            releases: Arc::clone(&releases),
        };
        (BoardSession::new(Box::new(board)), releases)
    }

    #[test]
    fn release_is_idempotent() {
        let (mut session, releases) = session();
        session.release();
        session.release();
        drop(session);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_unreleased_session() {
        let (session, releases) = session();
        drop(session);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reads_selected_eeg_row() {
        let (mut session, _) = session();
        session.connect().unwrap();
        let block = session.read_channel(4, 1).unwrap();
        assert_eq!(block.samples, vec![2.0; 4]);
        assert_eq!(block.sample_rate, 100.0);
    }

    #[test]
    fn out_of_range_channel_is_an_error() {
        let (mut session, _) = session();
        assert!(matches!(
            session.read_channel(4, 5),
            Err(DeviceError::ChannelOutOfRange {
                channel: 5,
                available: 2
            })
        ));
    }
}
