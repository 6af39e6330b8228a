pub mod bandpass;

pub use bandpass::{bandpass_filter, BandPassFilter, BandPassFilterConfig};
