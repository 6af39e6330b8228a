pub mod detectors;
pub mod filters;
pub mod signal_processor;
pub mod statistics;

pub use signal_processor::SignalProcessor;
