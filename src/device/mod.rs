pub mod playback;
pub mod session;
pub mod simulated;

pub use playback::PlaybackBoard;
pub use session::BoardSession;
pub use simulated::SimulatedBoard;

use crate::error::DeviceError;

/// Samples for one channel at a known rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    pub samples: Vec<f64>,
    pub sample_rate: f64,
}

/// EEG board driver contract, shaped after BrainFlow's `BoardShim`.
///
/// `get_current_board_data` returns a row-major block: one row per board
/// channel (package number, EEG, auxiliary, timestamp...), each holding up to
/// `num_samples` values. [`EegBoard::eeg_channels`] lists which rows carry EEG.
pub trait EegBoard: Send {
    fn name(&self) -> &str;
    fn sampling_rate(&self) -> f64;
    fn eeg_channels(&self) -> Vec<usize>;

    fn prepare_session(&mut self) -> Result<(), DeviceError>;
    fn start_stream(&mut self) -> Result<(), DeviceError>;
    fn get_current_board_data(&mut self, num_samples: usize) -> Result<Vec<Vec<f64>>, DeviceError>;
    fn release_session(&mut self) -> Result<(), DeviceError>;
}
