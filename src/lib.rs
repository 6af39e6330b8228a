pub mod acquisition;
pub mod config;
pub mod device;
pub mod error;
pub mod game;
pub mod local;
pub mod processing;
pub mod utils;
pub mod visualization;
