//! Terminal front end for the oscillator period sweep
//!
//! Runs a sweep described by a YAML configuration file (plus command line
//! overrides) and shows the period surface as a live heatmap, either in a
//! full-screen terminal UI or as log lines with a final plain-text heatmap.

pub mod app;
pub mod config;
pub mod export;
pub mod headless;
pub mod heatmap;
pub mod logging;

pub use app::App;
pub use config::{AppConfig, SweepOverrides};
pub use logging::init_logging;
