//! Parallel parameter sweep over the oscillator's (mu, nu) plane.
//!
//! The grid builder enumerates every parameter pair, the driver fans the
//! pairs out to a worker pool, and every finished point is pushed onto the
//! result channel the moment it is ready:
//!
//! ```ignore
//! use periodsweep_core::analysis::{OscillatorEvaluator, SweepConfig, SweepProgress, run_sweep};
//! use periodsweep_core::channel::result_channel;
//! use periodsweep_core::pool::WorkerPool;
//!
//! let config = SweepConfig::default();
//! let grid = config.grid()?;
//! let pool = WorkerPool::new(config.workers)?;
//! let (sender, receiver) = result_channel();
//! let progress = SweepProgress::new(grid.len());
//!
//! let summary = run_sweep(&grid, &OscillatorEvaluator::from_config(&config), &pool, sender, &progress);
//! ```
//!
//! # Grid layout
//!
//! Rows vary mu and columns vary nu. Cells are addressed by a one-based
//! `PointId` in row-major order, so an N x M grid uses ids `1..=N*M`.

mod config;
mod evaluator;
mod results;

pub use config::*;
pub use evaluator::*;
pub use results::*;
