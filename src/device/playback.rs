use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use super::EegBoard;
use crate::error::DeviceError;

// -----------------------------------------------------------------------------
// SETUP FOR IMPORTING SIGNALS FROM CSV
// -----------------------------------------------------------------------------

/// Read a recording with one column per channel. Returns channel-major data.
pub fn read_signals_from_csv<P: AsRef<Path>>(
    path: P,
    has_headers: bool,
) -> Result<Vec<Vec<f64>>, DeviceError> {
    let file = File::open(path.as_ref())
        .map_err(|e| DeviceError::Connection(format!("{}: {}", path.as_ref().display(), e)))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut data: Vec<Vec<f64>> = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        if data.is_empty() {
            data = vec![Vec::new(); record.len()];
        }
        for (channel, value) in record.iter().enumerate() {
            let sample: f64 = value.parse().map_err(|_| {
                DeviceError::Read(format!(
                    "row {}, column {}: '{}' is not a number",
                    line + 1,
                    channel,
                    value
                ))
            })?;
            if let Some(column) = data.get_mut(channel) {
                column.push(sample);
            }
        }
    }

    Ok(data)
}

// -----------------------------------------------------------------------------
// PLAYBACK BOARD
// -----------------------------------------------------------------------------

/// Replays a recorded CSV as if it were a live board, one chunk per read.
///
/// Every column is treated as an EEG channel. Once the recording runs out
/// the next read fails, which ends the acquisition loop.
pub struct PlaybackBoard {
    path: PathBuf,
    sample_rate: f64,
    has_headers: bool,
    channels: Vec<Vec<f64>>,
    cursor: usize,
    streaming: bool,
}

impl PlaybackBoard {
    pub fn new<P: Into<PathBuf>>(path: P, sample_rate: f64, has_headers: bool) -> Self {
        Self {
            path: path.into(),
            sample_rate,
            has_headers,
            channels: Vec::new(),
            cursor: 0,
            streaming: false,
        }
    }

    fn recording_len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

impl EegBoard for PlaybackBoard {
    fn name(&self) -> &str {
        "playback"
    }

    fn sampling_rate(&self) -> f64 {
        self.sample_rate
    }

    fn eeg_channels(&self) -> Vec<usize> {
        (0..self.channels.len()).collect()
    }

    fn prepare_session(&mut self) -> Result<(), DeviceError> {
        self.channels = read_signals_from_csv(&self.path, self.has_headers)?;
        if self.recording_len() == 0 {
            return Err(DeviceError::Connection(format!(
                "{} holds no samples",
                self.path.display()
            )));
        }
        self.cursor = 0;
        info!(
            path = %self.path.display(),
            channels = self.channels.len(),
            samples = self.recording_len(),
            "Loaded EEG recording"
        );
        Ok(())
    }

    fn start_stream(&mut self) -> Result<(), DeviceError> {
        if self.channels.is_empty() {
            return Err(DeviceError::NotPrepared);
        }
        self.streaming = true;
        Ok(())
    }

    fn get_current_board_data(&mut self, num_samples: usize) -> Result<Vec<Vec<f64>>, DeviceError> {
        if !self.streaming {
            return Err(DeviceError::NotPrepared);
        }
        let len = self.recording_len();
        if self.cursor >= len {
            return Err(DeviceError::Read("end of recording".to_string()));
        }

        let end = (self.cursor + num_samples).min(len);
        let chunk = self
            .channels
            .iter()
            .map(|channel| channel[self.cursor..end].to_vec())
            .collect();
        self.cursor = end;
        Ok(chunk)
    }

    fn release_session(&mut self) -> Result<(), DeviceError> {
        self.streaming = false;
        self.channels.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn recording(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_channel_major_columns() {
        let file = recording("tp9,af7\n1.0,10.0\n2.0,20.0\n3.0,30.0\n");
        let data = read_signals_from_csv(file.path(), true).unwrap();
        assert_eq!(data, vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]]);
    }

    #[test]
    fn rejects_non_numeric_samples() {
        let file = recording("1.0\nabc\n");
        assert!(matches!(
            read_signals_from_csv(file.path(), false),
            Err(DeviceError::Read(_))
        ));
    }

    #[test]
    fn replays_in_chunks_then_fails_at_end() {
        let file = recording("1\n2\n3\n4\n5\n");
        let mut board = PlaybackBoard::new(file.path(), 100.0, false);
        board.prepare_session().unwrap();
        board.start_stream().unwrap();

        assert_eq!(board.get_current_board_data(2).unwrap(), vec![vec![1.0, 2.0]]);
        assert_eq!(board.get_current_board_data(2).unwrap(), vec![vec![3.0, 4.0]]);
        assert_eq!(board.get_current_board_data(2).unwrap(), vec![vec![5.0]]);
        assert!(matches!(
            board.get_current_board_data(2),
            Err(DeviceError::Read(_))
        ));
    }

    #[test]
    fn missing_file_is_a_connection_error() {
        let mut board = PlaybackBoard::new("/nonexistent/recording.csv", 256.0, false);
        assert!(matches!(
            board.prepare_session(),
            Err(DeviceError::Connection(_))
        ));
    }
}
