//! Parallel sweep driver: evaluates every grid point on the worker pool and
//! streams each result to the coordinator as soon as it is computed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use rayon::prelude::*;

use crate::channel::ResultSender;
use crate::error::{IntegrationError, SweepError};
use crate::ode::{Oscillator, SolverSettings, State, solve_oscillator};
use crate::period::{PeriodEstimate, estimate_series_period};
use crate::pool::WorkerPool;

use super::{GridPoint, ParameterGrid, SweepConfig, SweepResult, SweepSummary};

/// Progress tracking for a running sweep
#[derive(Debug, Clone)]
pub struct SweepProgress {
    /// Completed points counter
    completed: Arc<AtomicUsize>,
    /// Total points
    total: Arc<AtomicUsize>,
    /// Cancellation flag
    cancelled: Arc<AtomicBool>,
}

impl SweepProgress {
    /// Create a new progress tracker
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the number of evaluated points
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get the total number of points
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Increment the completed counter
    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset the counters, keeping the cancellation flag
    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Stop starting new points
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check if cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for SweepProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Computes the outcome for a single grid point.
///
/// Implementations run concurrently on pool threads.
pub trait PointEvaluator: Send + Sync {
    fn evaluate(&self, point: &GridPoint) -> Result<PeriodEstimate, IntegrationError>;
}

impl<F> PointEvaluator for F
where
    F: Fn(&GridPoint) -> Result<PeriodEstimate, IntegrationError> + Send + Sync,
{
    fn evaluate(&self, point: &GridPoint) -> Result<PeriodEstimate, IntegrationError> {
        self(point)
    }
}

/// Integrates the oscillator at the point's (mu, nu) and estimates its period
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorEvaluator {
    pub settings: SolverSettings,
    pub span_factor: f64,
    pub initial_state: State,
}

impl OscillatorEvaluator {
    #[must_use]
    pub fn from_config(config: &SweepConfig) -> Self {
        Self {
            settings: config.solver.clone(),
            span_factor: config.span_factor,
            initial_state: config.initial_state,
        }
    }
}

impl Default for OscillatorEvaluator {
    fn default() -> Self {
        Self::from_config(&SweepConfig::default())
    }
}

impl PointEvaluator for OscillatorEvaluator {
    fn evaluate(&self, point: &GridPoint) -> Result<PeriodEstimate, IntegrationError> {
        let oscillator = Oscillator::new(point.mu, point.nu);
        let series = solve_oscillator(
            &oscillator,
            self.initial_state,
            self.span_factor,
            &self.settings,
        )?;
        Ok(estimate_series_period(&series))
    }
}

#[derive(Default)]
struct Tally {
    delivered: AtomicUsize,
    failed: AtomicUsize,
    lost: AtomicUsize,
    skipped: AtomicUsize,
}

/// Evaluate every grid point on `pool`, sending each result as soon as it is
/// ready.
///
/// Failures stay local to their point: an integration error is delivered as a
/// failed result, while a panicking evaluation or a send to a closed channel
/// is counted as lost. Once `progress` is cancelled no new points start.
///
/// The sender is dropped when this returns, so the receiver observes the end
/// of the stream.
pub fn run_sweep<E>(
    grid: &ParameterGrid,
    evaluator: &E,
    pool: &WorkerPool,
    sender: ResultSender,
    progress: &SweepProgress,
) -> SweepSummary
where
    E: PointEvaluator + ?Sized,
{
    let points = grid.points();
    let total = points.len();
    progress.reset(total);

    tracing::info!(
        total_points = total,
        workers = pool.workers(),
        "Starting sweep"
    );

    let start = Instant::now();
    let tally = Tally::default();

    pool.install(|| {
        points
            .par_iter()
            .for_each_with(sender, |sender, point| {
                evaluate_point(point, evaluator, sender, progress, &tally);
            });
    });

    let summary = SweepSummary {
        total,
        delivered: tally.delivered.into_inner(),
        failed: tally.failed.into_inner(),
        lost: tally.lost.into_inner(),
        skipped: tally.skipped.into_inner(),
        cancelled: progress.is_cancelled(),
        elapsed: start.elapsed(),
    };

    tracing::info!(
        delivered = summary.delivered,
        failed = summary.failed,
        lost = summary.lost,
        skipped = summary.skipped,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Sweep finished"
    );

    summary
}

fn evaluate_point<E>(
    point: &GridPoint,
    evaluator: &E,
    sender: &ResultSender,
    progress: &SweepProgress,
    tally: &Tally,
) where
    E: PointEvaluator + ?Sized,
{
    if progress.is_cancelled() {
        tally.skipped.fetch_add(1, Ordering::Relaxed);
        return;
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(point)));
    progress.increment();

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(payload) => {
            tracing::error!(
                id = point.id.0,
                mu = point.mu,
                nu = point.nu,
                reason = %panic_message(payload.as_ref()),
                "Evaluation panicked, point lost"
            );
            tally.lost.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    if let Err(e) = &outcome {
        tracing::warn!(
            id = point.id.0,
            mu = point.mu,
            nu = point.nu,
            error = %e,
            "Integration failed"
        );
        tally.failed.fetch_add(1, Ordering::Relaxed);
    }

    let result = SweepResult {
        id: point.id,
        mu: point.mu,
        nu: point.nu,
        outcome,
    };
    match sender.send(result) {
        Ok(()) => {
            tally.delivered.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            tracing::debug!(error = %e, "Dropping result");
            tally.lost.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Handle to a sweep running on a background driver thread
pub struct SweepHandle {
    progress: SweepProgress,
    thread: Option<JoinHandle<SweepSummary>>,
}

impl SweepHandle {
    #[must_use]
    pub fn progress(&self) -> &SweepProgress {
        &self.progress
    }

    /// Request cancellation of the remaining points
    pub fn cancel(&self) {
        self.progress.cancel();
    }

    /// Wait for the driver to finish and return its summary
    pub fn join(mut self) -> Result<SweepSummary, SweepError> {
        let thread = self
            .thread
            .take()
            .ok_or_else(|| SweepError::Driver("driver already joined".to_string()))?;
        thread
            .join()
            .map_err(|payload| SweepError::Driver(panic_message(payload.as_ref())))
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.progress.cancel();
            let _ = thread.join();
        }
    }
}

/// Run [`run_sweep`] on a dedicated driver thread.
///
/// The pool and evaluator move into the driver and are dropped when it ends.
pub fn spawn_sweep<E>(
    grid: ParameterGrid,
    evaluator: E,
    pool: WorkerPool,
    sender: ResultSender,
    progress: SweepProgress,
) -> Result<SweepHandle, SweepError>
where
    E: PointEvaluator + 'static,
{
    let driver_progress = progress.clone();
    let thread = thread::Builder::new()
        .name("sweep-driver".to_string())
        .spawn(move || run_sweep(&grid, &evaluator, &pool, sender, &driver_progress))
        .map_err(|e| SweepError::Driver(e.to_string()))?;

    Ok(SweepHandle {
        progress,
        thread: Some(thread),
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
