pub mod plotter;
#[cfg(feature = "visualization")]
pub mod window;

use serde::{Deserialize, Serialize};

pub use plotter::SignalPlotter;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Open the end-of-session window after a run with EEG.
    pub enabled: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// Points per plotted line; longer histories are decimated.
    pub max_points: usize,
    pub show_raw_signal: bool,
    pub show_filtered_signal: bool,
    pub show_deviations: bool,
    pub plot_height_per_signal: u32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window_width: 1200,
            window_height: 800,
            max_points: 5000,
            show_raw_signal: true,
            show_filtered_signal: true,
            show_deviations: true,
            plot_height_per_signal: 150,
        }
    }
}
