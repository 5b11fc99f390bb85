//! Incrementally filled period surface and the throttled render loop around it.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::analysis::{ParameterGrid, PointId, SweepGrid, SweepResult};
use crate::error::RenderError;
use crate::period::PeriodEstimate;

/// What is known about a plot cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellStatus {
    /// No result received yet
    #[default]
    Pending,
    /// A numeric period was reported
    Period,
    /// Reported, but fewer than two maxima were found
    Undefined,
    /// Reported as an integration failure
    Failed,
}

/// Plot values for every grid cell, NaN until reported.
///
/// Only the coordinator mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotBuffer {
    values: SweepGrid<f64>,
    status: SweepGrid<CellStatus>,
    mu_values: Vec<f64>,
    nu_values: Vec<f64>,
    reported: usize,
    failed: usize,
    undefined: usize,
}

impl PlotBuffer {
    pub fn new(grid: &ParameterGrid) -> Self {
        let (rows, cols) = grid.shape();
        Self {
            values: SweepGrid::new(vec![rows, cols], f64::NAN),
            status: SweepGrid::new(vec![rows, cols], CellStatus::Pending),
            mu_values: grid.mu_values.clone(),
            nu_values: grid.nu_values.clone(),
            reported: 0,
            failed: 0,
            undefined: 0,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.mu_values.len(), self.nu_values.len())
    }

    pub fn mu_values(&self) -> &[f64] {
        &self.mu_values
    }

    pub fn nu_values(&self) -> &[f64] {
        &self.nu_values
    }

    pub fn values(&self) -> &SweepGrid<f64> {
        &self.values
    }

    pub fn statuses(&self) -> &SweepGrid<CellStatus> {
        &self.status
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(&[row, col]).copied()
    }

    pub fn status(&self, row: usize, col: usize) -> Option<CellStatus> {
        self.status.get(&[row, col]).copied()
    }

    /// Write a result into its cell.
    ///
    /// Returns the `(row, col)` written, or `None` when the id is outside the
    /// grid or the cell was already reported.
    pub fn apply(&mut self, result: &SweepResult) -> Option<(usize, usize)> {
        let flat = result.id.flat()?;
        let indices = self.status.multi_index(flat)?;
        if self.status.get_flat(flat) != Some(&CellStatus::Pending) {
            tracing::warn!(id = result.id.0, "Duplicate result ignored");
            return None;
        }

        let status = match &result.outcome {
            Ok(PeriodEstimate::Mean(_)) => CellStatus::Period,
            Ok(PeriodEstimate::Undefined) => {
                self.undefined += 1;
                CellStatus::Undefined
            }
            Err(_) => {
                self.failed += 1;
                CellStatus::Failed
            }
        };
        self.values.set_flat(flat, result.value());
        self.status.set_flat(flat, status);
        self.reported += 1;

        Some((indices[0], indices[1]))
    }

    pub fn total(&self) -> usize {
        self.values.len()
    }

    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn pending(&self) -> usize {
        self.total() - self.reported
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn undefined(&self) -> usize {
        self.undefined
    }

    pub fn is_complete(&self) -> bool {
        self.reported == self.total()
    }

    /// Min and max over the finite values, `None` when there are none
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .data()
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A surface the live plot is drawn on
pub trait RenderSink {
    /// Called once before any result arrives
    fn initialize(&mut self, shape: (usize, usize)) -> Result<(), RenderError>;

    /// Called for every applied result, before any redraw
    #[allow(unused_variables)]
    fn update_cell(&mut self, id: PointId, value: f64) -> Result<(), RenderError> {
        Ok(())
    }

    /// Draw the whole buffer
    fn redraw(&mut self, buffer: &PlotBuffer) -> Result<(), RenderError>;
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn initialize(&mut self, shape: (usize, usize)) -> Result<(), RenderError> {
        (**self).initialize(shape)
    }

    fn update_cell(&mut self, id: PointId, value: f64) -> Result<(), RenderError> {
        (**self).update_cell(id, value)
    }

    fn redraw(&mut self, buffer: &PlotBuffer) -> Result<(), RenderError> {
        (**self).redraw(buffer)
    }
}

/// Limits redraws to one per interval
#[derive(Debug, Clone)]
pub struct RedrawThrottle {
    interval: Duration,
    last_redraw: Option<Instant>,
    dirty: bool,
    frames: usize,
}

impl RedrawThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_redraw: None,
            dirty: false,
            frames: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Dirty and at least one interval since the last redraw
    pub fn should_redraw(&self, now: Instant) -> bool {
        self.dirty && self.time_until_due(now) == Some(Duration::ZERO)
    }

    /// Time left before a pending redraw is due, `None` when nothing is pending
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if !self.dirty {
            return None;
        }
        Some(match self.last_redraw {
            None => Duration::ZERO,
            Some(last) => self.interval.saturating_sub(now.saturating_duration_since(last)),
        })
    }

    pub fn record_redraw(&mut self, now: Instant) {
        self.last_redraw = Some(now);
        self.dirty = false;
        self.frames += 1;
    }

    /// The final state has not been drawn
    pub fn needs_final(&self) -> bool {
        self.dirty || self.frames == 0
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

/// Plot buffer wired to a render sink through a redraw throttle
#[derive(Debug)]
pub struct LivePlot<S> {
    buffer: PlotBuffer,
    throttle: RedrawThrottle,
    sink: S,
}

impl<S: RenderSink> LivePlot<S> {
    /// Initializes the sink with the buffer's shape
    pub fn new(buffer: PlotBuffer, interval: Duration, mut sink: S) -> Result<Self, RenderError> {
        sink.initialize(buffer.shape())?;
        Ok(Self {
            buffer,
            throttle: RedrawThrottle::new(interval),
            sink,
        })
    }

    /// Record a result and redraw if the throttle allows it.
    ///
    /// Returns whether a frame was drawn.
    pub fn apply(&mut self, result: &SweepResult) -> Result<bool, RenderError> {
        if self.buffer.apply(result).is_some() {
            self.sink.update_cell(result.id, result.value())?;
            self.throttle.mark_dirty();
        }
        self.tick()
    }

    /// Redraw if a pending redraw is due
    pub fn tick(&mut self) -> Result<bool, RenderError> {
        let now = Instant::now();
        if !self.throttle.should_redraw(now) {
            return Ok(false);
        }
        self.sink.redraw(&self.buffer)?;
        self.throttle.record_redraw(now);
        Ok(true)
    }

    /// Draw the final state unless it is already on screen
    pub fn finish(&mut self) -> Result<(), RenderError> {
        if self.throttle.needs_final() {
            self.sink.redraw(&self.buffer)?;
            self.throttle.record_redraw(Instant::now());
        }
        Ok(())
    }

    pub fn time_until_redraw(&self) -> Option<Duration> {
        self.throttle.time_until_due(Instant::now())
    }

    pub fn buffer(&self) -> &PlotBuffer {
        &self.buffer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn frames(&self) -> usize {
        self.throttle.frames()
    }

    pub fn into_parts(self) -> (PlotBuffer, S) {
        (self.buffer, self.sink)
    }
}

/// Sink that records everything it is asked to draw
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub shape: Option<(usize, usize)>,
    pub updates: Vec<(PointId, f64)>,
    /// Snapshot of the values at every redraw
    pub frames: Vec<Vec<f64>>,
}

impl RenderSink for MemorySink {
    fn initialize(&mut self, shape: (usize, usize)) -> Result<(), RenderError> {
        self.shape = Some(shape);
        Ok(())
    }

    fn update_cell(&mut self, id: PointId, value: f64) -> Result<(), RenderError> {
        self.updates.push((id, value));
        Ok(())
    }

    fn redraw(&mut self, buffer: &PlotBuffer) -> Result<(), RenderError> {
        self.frames.push(buffer.values().data().to_vec());
        Ok(())
    }
}
