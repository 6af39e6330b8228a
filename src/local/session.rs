use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};

use super::summary::{print_round, print_summary};
use crate::acquisition::{self, AcquisitionHandle, AcquisitionStatus, EegReport, SharedEegState};
use crate::config::{BoardKind, Config, EegConfig, EegFailurePolicy, GazeSourceKind};
use crate::device::{EegBoard, PlaybackBoard, SimulatedBoard};
use crate::error::{AcquisitionError, ConfigError, SessionError};
use crate::game::{
    FrameSource, RoundResult, RoundStateMachine, ScriptedFrames, SimulatedFrames, UserSignal,
    Variant, WordList,
};

/// Wall-clock pacing of the frame loop. All `None` runs as fast as frames
/// arrive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pacing {
    pub frame_interval: Option<Duration>,
    pub result_display: Option<Duration>,
}

impl Pacing {
    pub fn from_config(config: &Config) -> Self {
        if !config.game.pace_frames {
            return Self::default();
        }
        Self {
            frame_interval: Duration::try_from_secs_f64(1.0 / config.game.frame_rate).ok(),
            result_display: Some(Duration::from_millis(config.game.result_display_ms)),
        }
    }

    fn wait_for_next_frame(&self, frame_start: Instant) {
        if let Some(interval) = self.frame_interval {
            if let Some(rest) = interval.checked_sub(frame_start.elapsed()) {
                thread::sleep(rest);
            }
        }
    }

    fn hold_result(&self) {
        if let Some(pause) = self.result_display {
            thread::sleep(pause);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    /// Every round was played.
    Completed,
    Quit,
    /// The frame source ran out, which counts as quitting.
    InputExhausted,
    /// EEG failed mid-session under the abort policy.
    EegFailed(String),
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub variant: Variant,
    pub end: SessionEnd,
    pub frames: u64,
    pub results: Vec<RoundResult>,
    /// Present when EEG acquisition ran, including runs where it failed.
    pub eeg: Option<EegReport>,
}

// -----------------------------------------------------------------------------
// EEG FEEDBACK
// -----------------------------------------------------------------------------

/// The game loop's read-only view of acquisition.
struct EegFeed<'a> {
    shared: Option<&'a SharedEegState>,
    policy: EegFailurePolicy,
    warned: bool,
}

impl<'a> EegFeed<'a> {
    /// `Err(reason)` once acquisition has failed and the policy is abort.
    /// Under degrade the failure is logged once and play continues.
    fn check(&mut self) -> Result<(), String> {
        let Some(shared) = self.shared else {
            return Ok(());
        };
        let AcquisitionStatus::Failed(reason) = shared.status() else {
            return Ok(());
        };
        match self.policy {
            EegFailurePolicy::Abort => Err(reason),
            EegFailurePolicy::Degrade => {
                if !self.warned {
                    warn!(%reason, "EEG acquisition failed, continuing without EEG feedback");
                    self.warned = true;
                }
                Ok(())
            }
        }
    }

    fn deviation_count(&self) -> usize {
        self.shared.map_or(0, SharedEegState::deviation_count)
    }
}

// -----------------------------------------------------------------------------
// FRAME LOOP
// -----------------------------------------------------------------------------

/// Drive `machine` from `frames` until the run finishes.
///
/// One frame per tick: the gaze goes to the machine, then any user signal is
/// applied. On commit the deviation count is read from `eeg` (zero without
/// EEG) and `on_round` gets the frozen result.
pub fn play<R, F>(
    machine: &mut RoundStateMachine<R>,
    frames: &mut F,
    eeg: Option<&SharedEegState>,
    policy: EegFailurePolicy,
    pacing: &Pacing,
    mut on_round: impl FnMut(&RoundResult),
) -> (SessionEnd, u64)
where
    R: Rng,
    F: FrameSource + ?Sized,
{
    let mut feed = EegFeed {
        shared: eeg,
        policy,
        warned: false,
    };
    let mut frame_count = 0;

    machine.start();
    while !machine.is_finished() {
        let frame_start = Instant::now();

        if let Err(reason) = feed.check() {
            error!(%reason, "EEG acquisition failed, ending the run");
            machine.quit();
            return (SessionEnd::EegFailed(reason), frame_count);
        }

        let Some(frame) = frames.next_frame() else {
            info!("Input exhausted, ending the run");
            machine.quit();
            return (SessionEnd::InputExhausted, frame_count);
        };
        frame_count += 1;

        machine.tick(frame.gaze);
        match frame.signal {
            Some(UserSignal::Quit) => {
                machine.quit();
                return (SessionEnd::Quit, frame_count);
            }
            Some(UserSignal::Commit) => {
                if let Some(result) = machine.commit(frame.gaze, feed.deviation_count()) {
                    on_round(result);
                    pacing.hold_result();
                }
                machine.advance();
            }
            None => {}
        }

        pacing.wait_for_next_frame(frame_start);
    }

    (SessionEnd::Completed, frame_count)
}

// -----------------------------------------------------------------------------
// SESSION
// -----------------------------------------------------------------------------

/// Run a full session from configuration: load words, build the frame
/// source and (for the EEG variant) the board, play, and report.
pub fn run_session(config: &Config) -> Result<SessionOutcome, SessionError> {
    config.validate()?;

    let words = WordList::load(&config.game.words_path)?;
    info!(
        path = %config.game.words_path.display(),
        words = words.len(),
        "Loaded word list"
    );

    let frames: Box<dyn FrameSource> = match config.gaze.source {
        GazeSourceKind::Simulated => Box::new(SimulatedFrames::new(
            config.gaze.commit_every_frames,
            config.gaze.seed,
        )),
        GazeSourceKind::Script => {
            let path = config.gaze.script_path.as_ref().ok_or(ConfigError::Invalid {
                field: "gaze.script_path",
                reason: "required when gaze.source is script".into(),
            })?;
            Box::new(ScriptedFrames::from_path(path)?)
        }
    };

    let board = match config.game.variant {
        Variant::GazeTime => None,
        Variant::EegDeviation => Some(build_board(&config.eeg)?),
    };

    run_session_with(config, words, frames, board)
}

pub fn build_board(config: &EegConfig) -> Result<Box<dyn EegBoard>, ConfigError> {
    match config.board {
        BoardKind::Simulated => Ok(Box::new(SimulatedBoard::new(config.board_seed))),
        BoardKind::Playback => {
            let path = config.playback_path.clone().ok_or(ConfigError::Invalid {
                field: "eeg.playback_path",
                reason: "required when eeg.board is playback".into(),
            })?;
            Ok(Box::new(PlaybackBoard::new(
                path,
                config.playback_sample_rate,
                config.playback_has_headers,
            )))
        }
    }
}

/// [`run_session`] with the collaborators supplied by the caller. `board` is
/// only used by the EEG variant.
pub fn run_session_with(
    config: &Config,
    words: WordList,
    mut frames: Box<dyn FrameSource>,
    board: Option<Box<dyn EegBoard>>,
) -> Result<SessionOutcome, SessionError> {
    config.validate()?;

    let variant = config.game.variant;
    let rng = match config.game.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut machine = RoundStateMachine::new(variant, words, config.game.rounds, rng)?;

    let mut acquisition = match (variant, board) {
        (Variant::EegDeviation, Some(board)) => start_acquisition(config, board)?,
        _ => None,
    };

    info!(?variant, rounds = config.game.rounds, "Starting session");
    let frame_rate = config.game.frame_rate;
    let shared = acquisition.as_ref().map(AcquisitionHandle::shared);
    let (end, frames_played) = play(
        &mut machine,
        frames.as_mut(),
        shared.as_deref(),
        config.eeg.on_failure,
        &Pacing::from_config(config),
        |result| print_round(result, frame_rate),
    );

    let eeg = acquisition.as_mut().map(|handle| {
        handle.stop();
        handle.report()
    });

    let results = machine.into_results();
    print_summary(&results, frame_rate, eeg.as_ref());
    info!(?end, rounds = results.len(), frames = frames_played, "Session ended");

    if let SessionEnd::EegFailed(reason) = &end {
        return Err(AcquisitionError::Failed(reason.clone()).into());
    }

    Ok(SessionOutcome {
        variant,
        end,
        frames: frames_played,
        results,
        eeg,
    })
}

/// Spawn acquisition and wait for the board. Under degrade, a board that
/// never becomes ready means playing on without EEG.
fn start_acquisition(
    config: &Config,
    board: Box<dyn EegBoard>,
) -> Result<Option<AcquisitionHandle>, SessionError> {
    let handle = acquisition::spawn(
        board,
        config.eeg.acquisition.clone(),
        config.filter.clone(),
        config.detector.clone(),
    )?;

    match handle.wait_until_ready() {
        Ok(()) => Ok(Some(handle)),
        Err(e) => {
            // The board may still be inside connect. Do not join it.
            handle.detach();
            match config.eeg.on_failure {
                EegFailurePolicy::Abort => {
                    error!(error = %e, "EEG board not ready");
                    Err(e.into())
                }
                EegFailurePolicy::Degrade => {
                    warn!(error = %e, "EEG board not ready, continuing without EEG feedback");
                    Ok(None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_follows_frame_rate() {
        let mut config = Config::default();
        config.game.frame_rate = 50.0;
        config.game.result_display_ms = 1500;

        let pacing = Pacing::from_config(&config);
        assert_eq!(pacing.frame_interval, Some(Duration::from_millis(20)));
        assert_eq!(pacing.result_display, Some(Duration::from_millis(1500)));

        config.game.pace_frames = false;
        let pacing = Pacing::from_config(&config);
        assert!(pacing.frame_interval.is_none());
        assert!(pacing.result_display.is_none());
    }

    #[test]
    fn zero_frame_rate_does_not_panic() {
        let mut config = Config::default();
        config.game.frame_rate = 0.0;
        assert!(Pacing::from_config(&config).frame_interval.is_none());
    }
}
