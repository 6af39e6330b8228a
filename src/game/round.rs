use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::gaze::{GazeDirection, GazeObservation, GazeTally};
use super::words::{RoundWords, WordList};
use crate::error::GameError;

/// Recorded instead of a word when nothing was looked at on commit.
pub const NO_WORD: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Winner is the slot with the most gaze frames.
    #[default]
    GazeTime,
    /// Winner is the slot under the gaze at commit; metric is the EEG
    /// deviation count.
    EegDeviation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    AwaitingStart,
    RoundOpen(usize),
    RoundResolved(usize),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    GazeFrames(u32),
    Deviations(usize),
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::GazeFrames(frames) => write!(f, "{frames} frames"),
            Metric::Deviations(count) => write!(f, "{count} deviations"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    /// 1-based.
    pub index: usize,
    pub words: RoundWords,
    /// One of `words`, or [`NO_WORD`].
    pub chosen_word: String,
    pub metric: Metric,
}

// -----------------------------------------------------------------------------
// ROUND STATE MACHINE
// -----------------------------------------------------------------------------

/// Owns the word pool, the open round and the results of a run.
///
/// Calls that do not apply to the current state are ignored.
pub struct RoundStateMachine<R: Rng> {
    variant: Variant,
    words: WordList,
    rounds: usize,
    rng: R,
    state: GameState,
    current: Option<RoundWords>,
    tally: GazeTally,
    results: Vec<RoundResult>,
}

impl<R: Rng> RoundStateMachine<R> {
    pub fn new(variant: Variant, words: WordList, rounds: usize, rng: R) -> Result<Self, GameError> {
        if rounds == 0 {
            return Err(GameError::NoRounds);
        }
        Ok(Self {
            variant,
            words,
            rounds,
            rng,
            state: GameState::AwaitingStart,
            current: None,
            tally: GazeTally::default(),
            results: Vec::with_capacity(rounds),
        })
    }

    pub fn start(&mut self) {
        if self.state != GameState::AwaitingStart {
            debug!(state = ?self.state, "Ignoring start");
            return;
        }
        self.open_round(1);
    }

    /// Count one frame of gaze towards the open round.
    pub fn tick(&mut self, observation: Option<GazeObservation>) {
        if !matches!(self.state, GameState::RoundOpen(_)) || self.variant != Variant::GazeTime {
            return;
        }
        if let Some(direction) = observation.and_then(|o| o.direction()) {
            self.tally.record(direction);
        }
    }

    /// Resolve the open round and append it to the results.
    pub fn commit(
        &mut self,
        observation: Option<GazeObservation>,
        deviation_count: usize,
    ) -> Option<&RoundResult> {
        let GameState::RoundOpen(index) = self.state else {
            debug!(state = ?self.state, "Ignoring commit");
            return None;
        };
        let words = self.current.take()?;

        let (direction, metric) = match self.variant {
            Variant::GazeTime => {
                let (direction, frames) = self.tally.winner();
                (Some(direction), Metric::GazeFrames(frames))
            }
            Variant::EegDeviation => (
                observation.and_then(|o| o.direction()),
                Metric::Deviations(deviation_count),
            ),
        };
        let chosen_word = direction
            .map(|d: GazeDirection| words[d.slot()].clone())
            .unwrap_or_else(|| NO_WORD.to_string());

        info!(round = index, word = %chosen_word, %metric, "Round committed");

        self.results.push(RoundResult {
            index,
            words,
            chosen_word,
            metric,
        });
        self.state = GameState::RoundResolved(index);
        self.results.last()
    }

    pub fn advance(&mut self) {
        let GameState::RoundResolved(index) = self.state else {
            debug!(state = ?self.state, "Ignoring advance");
            return;
        };
        if index >= self.rounds {
            info!(rounds = self.results.len(), "Game finished");
            self.state = GameState::Finished;
        } else {
            self.open_round(index + 1);
        }
    }

    /// End the run. An open round is discarded.
    pub fn quit(&mut self) {
        if let GameState::RoundOpen(index) = self.state {
            info!(round = index, "Quit with round open, discarding it");
        }
        self.current = None;
        self.state = GameState::Finished;
    }

    fn open_round(&mut self, index: usize) {
        let previous = self.results.last().map(|r| &r.words);
        let words = self.words.sample_round(&mut self.rng, previous);
        debug!(round = index, ?words, "Round opened");
        self.current = Some(words);
        self.tally.reset();
        self.state = GameState::RoundOpen(index);
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == GameState::Finished
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn current_words(&self) -> Option<&RoundWords> {
        self.current.as_ref()
    }

    pub fn tally(&self) -> GazeTally {
        self.tally
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<RoundResult> {
        self.results
    }
}
