//! Sweep without a terminal UI: progress goes to the log, the final heatmap to
//! stdout.

use std::time::Instant;

use periodsweep_core::error::RenderError;
use periodsweep_core::{
    OscillatorEvaluator, PlotBuffer, PointId, PoolProfile, RenderSink, SweepConfig, SweepReport,
    WorkerPool, run_live_sweep,
};

use crate::heatmap::heatmap_text;

/// Render sink that reports progress as log events
#[derive(Debug)]
pub struct LogSink {
    started: Instant,
    last_reported: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            last_reported: 0,
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for LogSink {
    fn initialize(&mut self, shape: (usize, usize)) -> Result<(), RenderError> {
        self.started = Instant::now();
        tracing::info!(rows = shape.0, cols = shape.1, "Sweep plot initialized");
        Ok(())
    }

    fn update_cell(&mut self, id: PointId, value: f64) -> Result<(), RenderError> {
        tracing::debug!(id = id.0, value, "Cell reported");
        Ok(())
    }

    fn redraw(&mut self, buffer: &PlotBuffer) -> Result<(), RenderError> {
        // The final redraw can repeat the previous state
        if buffer.reported() == self.last_reported && self.last_reported > 0 {
            return Ok(());
        }
        self.last_reported = buffer.reported();

        tracing::info!(
            reported = buffer.reported(),
            total = buffer.total(),
            failed = buffer.failed(),
            undefined = buffer.undefined(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Sweep progress"
        );
        Ok(())
    }
}

/// Run the sweep and print the final heatmap
pub fn run_headless(sweep: &SweepConfig, profile: &PoolProfile) -> color_eyre::Result<SweepReport> {
    let pool = WorkerPool::from_profile(profile)?;
    let evaluator = OscillatorEvaluator::from_config(sweep);
    let report = run_live_sweep(sweep, pool, evaluator, LogSink::new(), |_| false)?;

    println!("{}", heatmap_text(&report.buffer));
    println!("{}", summary_line(&report));
    Ok(report)
}

/// One-line summary of a finished sweep
pub fn summary_line(report: &SweepReport) -> String {
    let summary = &report.summary;
    format!(
        "{} points: {} delivered, {} failed, {} lost, {} skipped in {:.2}s ({} frames)",
        summary.total,
        summary.delivered,
        summary.failed,
        summary.lost,
        summary.skipped,
        summary.elapsed.as_secs_f64(),
        report.frames,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use periodsweep_core::analysis::LinearRange;

    #[test]
    fn test_small_headless_sweep() {
        let sweep = SweepConfig {
            mu: LinearRange::new(0.5, 1.0, 2),
            nu: LinearRange::new(100.0, 120.0, 2),
            workers: 2,
            ..Default::default()
        };
        let report = run_headless(&sweep, &PoolProfile::local(2)).unwrap();

        assert!(report.summary.is_complete());
        assert!(report.buffer.is_complete());
        assert!(summary_line(&report).starts_with("4 points: 4 delivered, 0 failed"));
    }
}
