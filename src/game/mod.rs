pub mod gaze;
pub mod input;
pub mod round;
pub mod words;

pub use gaze::{GazeDirection, GazeObservation, GazeTally};
pub use input::{Frame, FrameSource, ScriptedFrames, SimulatedFrames, UserSignal};
pub use round::{GameState, Metric, RoundResult, RoundStateMachine, Variant, NO_WORD};
pub use words::{RoundWords, WordList};
