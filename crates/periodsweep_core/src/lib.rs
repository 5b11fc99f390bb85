//! Parallel parameter sweep of a nonlinear oscillator with live plotting
//!
//! For every (mu, nu) pair of two linear ranges this crate integrates the
//! oscillator `x' = nu*y`, `y' = mu*(1 - x^2)*y - x`, estimates its period from
//! the spacing of local maxima, and streams each result to a single
//! coordinator that fills a 2-D plot buffer as results arrive.
//!
//! ```ignore
//! use periodsweep_core::{MemorySink, OscillatorEvaluator, SweepConfig, WorkerPool, run_live_sweep};
//!
//! let config = SweepConfig::default();
//! let pool = WorkerPool::new(config.workers)?;
//! let report = run_live_sweep(
//!     &config,
//!     pool,
//!     OscillatorEvaluator::from_config(&config),
//!     MemorySink::default(),
//!     |_| false,
//! )?;
//! println!("{} of {} cells reported", report.buffer.reported(), report.buffer.total());
//! ```

#![warn(clippy::all)]

// ============================================================================
// Numerics
// ============================================================================

pub mod ode;
pub mod period;

// ============================================================================
// Sweep execution
// ============================================================================

pub mod analysis;
pub mod channel;
pub mod coordinator;
pub mod error;
pub mod plot;
pub mod pool;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::{
    OscillatorEvaluator, ParameterGrid, PointEvaluator, PointId, SweepConfig, SweepResult,
    SweepSummary,
};
pub use coordinator::{Coordinator, CoordinatorExit, SweepReport, run_live_sweep};
pub use error::{IntegrationError, SweepError};
pub use plot::{CellStatus, LivePlot, MemorySink, PlotBuffer, RenderSink};
pub use pool::{PoolProfile, WorkerPool};
