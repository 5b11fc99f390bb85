//! Integration tests for the sweep engine
//!
//! Tests are organized by topic:
//! - `grid` - Range generation, grid layout and point ids
//! - `solver` - Integrator accuracy and failure modes
//! - `period` - Period estimation from sampled signals
//! - `channel` - Result streaming between workers and the coordinator
//! - `pool` - Worker pool creation and resizing
//! - `plot` - Plot buffer, redraw throttling and the coordinator loop
//! - `sweep` - End-to-end sweeps with mock and real evaluators

mod pool;
mod solver;

use crate::analysis::{LinearRange, ParameterGrid, PointId, SweepResult};
use crate::period::PeriodEstimate;

/// Grid of `rows` x `cols` points over unit-ish ranges
fn small_grid(rows: usize, cols: usize) -> ParameterGrid {
    ParameterGrid::build(
        &LinearRange::new(1.0, rows as f64, rows),
        &LinearRange::new(10.0, 10.0 * cols as f64, cols),
    )
    .unwrap()
}

fn period_result(id: usize, period: f64) -> SweepResult {
    SweepResult {
        id: PointId(id),
        mu: 1.0,
        nu: 1.0,
        outcome: Ok(PeriodEstimate::Mean(period)),
    }
}
