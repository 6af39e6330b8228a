pub mod process_file;
pub mod session;
pub mod summary;

pub use session::{run_session, run_session_with, SessionEnd, SessionOutcome};
