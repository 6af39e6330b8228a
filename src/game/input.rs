use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use super::gaze::{GazeDirection, GazeObservation};
use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserSignal {
    Commit,
    Quit,
}

/// Everything the session driver consumes in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// `None` when the classifier produced nothing usable this tick.
    pub gaze: Option<GazeObservation>,
    pub signal: Option<UserSignal>,
}

impl Frame {
    pub fn looking(direction: GazeDirection) -> Self {
        Self {
            gaze: Some(GazeObservation::looking(direction)),
            signal: None,
        }
    }

    pub fn with_signal(mut self, signal: UserSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Gaze classifier plus input surface. One frame per tick; `None` once the
/// source is exhausted.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

// -----------------------------------------------------------------------------
// SCRIPTED FRAMES
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptedGaze {
    Left,
    Center,
    Right,
    None,
    Lost,
}

#[derive(Debug, Deserialize)]
struct ScriptRow {
    gaze: ScriptedGaze,
    signal: Option<UserSignal>,
}

impl From<ScriptRow> for Frame {
    fn from(row: ScriptRow) -> Self {
        let gaze = match row.gaze {
            ScriptedGaze::Left => Some(GazeObservation::looking(GazeDirection::Left)),
            ScriptedGaze::Center => Some(GazeObservation::looking(GazeDirection::Center)),
            ScriptedGaze::Right => Some(GazeObservation::looking(GazeDirection::Right)),
            ScriptedGaze::None => Some(GazeObservation::NONE),
            ScriptedGaze::Lost => None,
        };
        Frame {
            gaze,
            signal: row.signal,
        }
    }
}

/// Replays a fixed sequence of frames.
///
/// The CSV form has a `gaze,signal` header. `gaze` is one of
/// `left|center|right|none|lost` (`lost` being a classifier failure) and
/// `signal` is `commit`, `quit` or empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFrames {
    frames: VecDeque<Frame>,
}

impl ScriptedFrames {
    pub fn new<I: IntoIterator<Item = Frame>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GameError> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(rdr)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::from_csv(rdr)
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self, GameError> {
        let frames = rdr
            .deserialize::<ScriptRow>()
            .map(|row| row.map(Frame::from))
            .collect::<Result<VecDeque<_>, _>>()?;
        Ok(Self { frames })
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ScriptedFrames {
    fn next_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }
}

// -----------------------------------------------------------------------------
// SIMULATED FRAMES
// -----------------------------------------------------------------------------

const DIRECTION_CHANGE_CHANCE: f64 = 0.05;
const DROPOUT_CHANCE: f64 = 0.02;
const AWAY_CHANCE: f64 = 0.05;

/// Random subject: holds a direction for a while, sometimes looks away or
/// drops out of the classifier, and commits every `commit_every` frames.
/// Never exhausts.
pub struct SimulatedFrames {
    rng: StdRng,
    direction: GazeDirection,
    commit_every: u32,
    frame: u32,
}

impl SimulatedFrames {
    pub fn new(commit_every: u32, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let direction = random_direction(&mut rng);
        Self {
            rng,
            direction,
            commit_every: commit_every.max(1),
            frame: 0,
        }
    }
}

fn random_direction(rng: &mut StdRng) -> GazeDirection {
    GazeDirection::PRIORITY[rng.gen_range(0..GazeDirection::PRIORITY.len())]
}

impl FrameSource for SimulatedFrames {
    fn next_frame(&mut self) -> Option<Frame> {
        self.frame += 1;

        if self.rng.gen_bool(DIRECTION_CHANGE_CHANCE) {
            self.direction = random_direction(&mut self.rng);
        }

        let gaze = if self.rng.gen_bool(DROPOUT_CHANCE) {
            None
        } else if self.rng.gen_bool(AWAY_CHANCE) {
            Some(GazeObservation::NONE)
        } else {
            Some(GazeObservation::looking(self.direction))
        };

        let signal = (self.frame % self.commit_every == 0).then_some(UserSignal::Commit);
        Some(Frame { gaze, signal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_rows_become_frames() {
        let csv = "gaze,signal\nleft,\ncenter,\nlost,\nnone,commit\nright,quit\n";
        let mut frames = ScriptedFrames::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(frames.remaining(), 5);

        assert_eq!(frames.next_frame(), Some(Frame::looking(GazeDirection::Left)));
        assert_eq!(frames.next_frame(), Some(Frame::looking(GazeDirection::Center)));
        assert_eq!(frames.next_frame(), Some(Frame::default()));
        assert_eq!(
            frames.next_frame(),
            Some(Frame {
                gaze: Some(GazeObservation::NONE),
                signal: Some(UserSignal::Commit),
            })
        );
        assert_eq!(
            frames.next_frame(),
            Some(Frame::looking(GazeDirection::Right).with_signal(UserSignal::Quit))
        );
        assert_eq!(frames.next_frame(), None);
    }

    #[test]
    fn unknown_gaze_value_is_rejected() {
        let csv = "gaze,signal\nup,\n";
        assert!(matches!(
            ScriptedFrames::from_reader(csv.as_bytes()),
            Err(GameError::Script(_))
        ));
    }

    #[test]
    fn simulated_subject_commits_on_schedule() {
        let mut frames = SimulatedFrames::new(10, Some(1));
        let commits: Vec<usize> = (1..=40)
            .filter(|_| frames.next_frame().and_then(|f| f.signal) == Some(UserSignal::Commit))
            .collect();
        assert_eq!(commits, vec![10, 20, 30, 40]);
    }

    #[test]
    fn simulated_subject_is_reproducible() {
        let mut a = SimulatedFrames::new(30, Some(42));
        let mut b = SimulatedFrames::new(30, Some(42));
        for _ in 0..200 {
            assert_eq!(a.next_frame(), b.next_frame());
        }
    }
}
