use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::EegBoard;
use crate::error::DeviceError;

// -----------------------------------------------------------------------------
// SETUP FOR THE SIMULATED SIGNALS
// -----------------------------------------------------------------------------

/// Muse 2 style layout: row 0 package number, rows 1-4 EEG (TP9, AF7, AF8,
/// TP10), row 5 timestamp.
const NUM_ROWS: usize = 6;
const EEG_ROWS: [usize; 4] = [1, 2, 3, 4];
const TIMESTAMP_ROW: usize = 5;

pub const SIMULATED_SAMPLE_RATE: f64 = 256.0;

const BACKGROUND_SLOW_FREQ: f64 = 1.0;
const BACKGROUND_THETA_FREQ: f64 = 6.0;
const BACKGROUND_ALPHA_FREQ: f64 = 10.0;
const NOISE_AMPLITUDE: f64 = 10.0;
const BURST_CHANCE_PER_SAMPLE: f64 = 0.002;

#[derive(Debug, Clone, Copy)]
struct Burst {
    amplitude: f64,
    frequency: f64,
    remaining: usize,
    phase: f64,
}

impl Burst {
    fn random(rng: &mut StdRng) -> Self {
        match rng.gen_range(0..3) {
            0 => Burst::new(120.0, 13.0, 60, 0.0),
            1 => Burst::new(150.0, 3.0, 40, std::f64::consts::PI),
            _ => Burst::new(90.0, 20.0, 30, 0.0),
        }
    }

    fn new(amplitude: f64, frequency: f64, remaining: usize, phase: f64) -> Self {
        Self {
            amplitude,
            frequency,
            remaining,
            phase,
        }
    }
}

// -----------------------------------------------------------------------------
// SIMULATED BOARD
// -----------------------------------------------------------------------------

/// Synthetic EEG board.
///
/// Background rhythms plus uniform noise, with occasional high-amplitude
/// sinusoidal bursts standing in for cognitive spikes. Each
/// `get_current_board_data(n)` call produces the next `n` samples, as if
/// polled exactly once per chunk duration.
pub struct SimulatedBoard {
    rng: StdRng,
    sample_index: u64,
    package_num: u64,
    burst: Option<Burst>,
    prepared: bool,
    streaming: bool,
}

impl SimulatedBoard {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            sample_index: 0,
            package_num: 0,
            burst: None,
            prepared: false,
            streaming: false,
        }
    }

    fn next_sample(&mut self, channel_offset: f64) -> f64 {
        let time = self.sample_index as f64 / SIMULATED_SAMPLE_RATE;
        let tau = 2.0 * std::f64::consts::PI;

        let background = 15.0 * (tau * BACKGROUND_SLOW_FREQ * time + channel_offset).sin()
            + 10.0 * (tau * BACKGROUND_THETA_FREQ * time).sin()
            + 20.0 * (tau * BACKGROUND_ALPHA_FREQ * time + channel_offset).sin();
        let noise = self.rng.gen_range(-NOISE_AMPLITUDE..NOISE_AMPLITUDE);

        let burst = match self.burst.as_mut() {
            Some(burst) => {
                burst.remaining -= 1;
                let value = burst.amplitude * (tau * burst.frequency * time + burst.phase).sin();
                if burst.remaining == 0 {
                    self.burst = None;
                }
                value
            }
            None => 0.0,
        };

        background + noise + burst
    }
}

impl EegBoard for SimulatedBoard {
    fn name(&self) -> &str {
        "simulated"
    }

    fn sampling_rate(&self) -> f64 {
        SIMULATED_SAMPLE_RATE
    }

    fn eeg_channels(&self) -> Vec<usize> {
        EEG_ROWS.to_vec()
    }

    fn prepare_session(&mut self) -> Result<(), DeviceError> {
        self.prepared = true;
        Ok(())
    }

    fn start_stream(&mut self) -> Result<(), DeviceError> {
        if !self.prepared {
            return Err(DeviceError::NotPrepared);
        }
        info!("Simulated board streaming at {} Hz", SIMULATED_SAMPLE_RATE);
        self.streaming = true;
        Ok(())
    }

    fn get_current_board_data(&mut self, num_samples: usize) -> Result<Vec<Vec<f64>>, DeviceError> {
        if !self.streaming {
            return Err(DeviceError::NotPrepared);
        }

        let mut data = vec![Vec::with_capacity(num_samples); NUM_ROWS];
        for _ in 0..num_samples {
            if self.burst.is_none() && self.rng.gen_bool(BURST_CHANCE_PER_SAMPLE) {
                self.burst = Some(Burst::random(&mut self.rng));
            }
            // Shared burst, per-channel background phase.
            let burst_snapshot = self.burst;
            for (offset, &row) in EEG_ROWS.iter().enumerate() {
                self.burst = burst_snapshot;
                let value = self.next_sample(offset as f64 * 0.3);
                data[row].push(value);
            }
            data[0].push(self.package_num as f64);
            data[TIMESTAMP_ROW].push(self.sample_index as f64 / SIMULATED_SAMPLE_RATE);
            self.package_num = (self.package_num + 1) % 256;
            self.sample_index += 1;
        }

        Ok(data)
    }

    fn release_session(&mut self) -> Result<(), DeviceError> {
        self.streaming = false;
        self.prepared = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming_board(seed: u64) -> SimulatedBoard {
        let mut board = SimulatedBoard::new(Some(seed));
        board.prepare_session().unwrap();
        board.start_stream().unwrap();
        board
    }

    #[test]
    fn requires_session_before_reading() {
        let mut board = SimulatedBoard::new(Some(1));
        assert!(board.start_stream().is_err());
        assert!(board.get_current_board_data(10).is_err());
    }

    #[test]
    fn produces_rows_for_full_layout() {
        let mut board = streaming_board(7);
        let data = board.get_current_board_data(250).unwrap();
        assert_eq!(data.len(), NUM_ROWS);
        assert!(data.iter().all(|row| row.len() == 250));
        assert_eq!(data[TIMESTAMP_ROW][1], 1.0 / SIMULATED_SAMPLE_RATE);
    }

    #[test]
    fn consecutive_reads_continue_the_signal() {
        let mut board = streaming_board(7);
        board.get_current_board_data(100).unwrap();
        let data = board.get_current_board_data(100).unwrap();
        assert_eq!(data[TIMESTAMP_ROW][0], 100.0 / SIMULATED_SAMPLE_RATE);
    }

    #[test]
    fn seeded_boards_are_reproducible() {
        let a = streaming_board(42).get_current_board_data(500).unwrap();
        let b = streaming_board(42).get_current_board_data(500).unwrap();
        assert_eq!(a, b);
    }
}
