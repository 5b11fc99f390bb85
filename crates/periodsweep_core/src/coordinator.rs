//! Single-threaded consumer of the result stream.

use std::time::Duration;

use crate::analysis::{PointEvaluator, SweepConfig, SweepProgress, SweepSummary, spawn_sweep};
use crate::channel::{RecvTimeoutError, ResultReceiver, result_channel};
use crate::error::{RenderError, SweepError};
use crate::plot::{LivePlot, PlotBuffer, RenderSink};
use crate::pool::WorkerPool;

/// Longest wait on the channel when no redraw is pending, so the stop
/// predicate is polled regularly
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Why the coordinator loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorExit {
    /// Every sender was dropped
    Completed,
    /// The stop predicate asked to quit
    Stopped,
}

/// Receives results one at a time and feeds them into the live plot
pub struct Coordinator<S> {
    plot: LivePlot<S>,
    receiver: ResultReceiver,
    received: usize,
}

impl<S: RenderSink> Coordinator<S> {
    pub fn new(plot: LivePlot<S>, receiver: ResultReceiver) -> Self {
        Self {
            plot,
            receiver,
            received: 0,
        }
    }

    /// Consume until every sender is gone
    pub fn run(&mut self) -> Result<CoordinatorExit, RenderError> {
        self.run_until(|_| false)
    }

    /// Consume until every sender is gone or `stop` returns true.
    ///
    /// Waits on the channel for at most the time left before the next due
    /// redraw, so pending frames are flushed without polling. The final state
    /// is always rendered.
    pub fn run_until<F>(&mut self, mut stop: F) -> Result<CoordinatorExit, RenderError>
    where
        F: FnMut(&PlotBuffer) -> bool,
    {
        loop {
            if stop(self.plot.buffer()) {
                tracing::info!(received = self.received, "Coordinator stopped");
                self.plot.finish()?;
                return Ok(CoordinatorExit::Stopped);
            }

            let timeout = self
                .plot
                .time_until_redraw()
                .map_or(IDLE_POLL, |due| due.min(IDLE_POLL));

            match self.receiver.recv_timeout(timeout) {
                Ok(result) => {
                    self.received += 1;
                    self.plot.apply(&result)?;
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.plot.tick()?;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.plot.finish()?;
                    tracing::info!(
                        received = self.received,
                        frames = self.plot.frames(),
                        "Result stream closed"
                    );
                    return Ok(CoordinatorExit::Completed);
                }
            }
        }
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn plot(&self) -> &LivePlot<S> {
        &self.plot
    }

    /// Drops the receiver, so later sends fail
    pub fn into_plot(self) -> LivePlot<S> {
        self.plot
    }
}

/// Outcome of [`run_live_sweep`]
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub summary: SweepSummary,
    pub buffer: PlotBuffer,
    /// Frames drawn by the sink
    pub frames: usize,
    pub exit: CoordinatorExit,
}

/// Run a full sweep: the driver on a background thread and the coordinator on
/// the calling thread.
///
/// When `stop` returns true the remaining points are cancelled and results
/// still in flight are dropped.
pub fn run_live_sweep<E, S, F>(
    config: &SweepConfig,
    pool: WorkerPool,
    evaluator: E,
    sink: S,
    stop: F,
) -> Result<SweepReport, SweepError>
where
    E: PointEvaluator + 'static,
    S: RenderSink,
    F: FnMut(&PlotBuffer) -> bool,
{
    config.validate()?;
    let grid = config.grid()?;
    let plot = LivePlot::new(PlotBuffer::new(&grid), config.redraw_interval(), sink)?;

    let (sender, receiver) = result_channel();
    let progress = SweepProgress::new(grid.len());
    let handle = spawn_sweep(grid, evaluator, pool, sender, progress)?;

    let mut coordinator = Coordinator::new(plot, receiver);
    let outcome = coordinator.run_until(stop);
    if !matches!(outcome, Ok(CoordinatorExit::Completed)) {
        handle.cancel();
    }
    let plot = coordinator.into_plot();

    let summary = handle.join()?;
    let exit = outcome?;
    let frames = plot.frames();
    let (buffer, _) = plot.into_parts();

    Ok(SweepReport {
        summary,
        buffer,
        frames,
        exit,
    })
}
