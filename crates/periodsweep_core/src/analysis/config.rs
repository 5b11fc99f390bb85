//! Configuration and grid types for the parameter sweep.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SweepError;
use crate::ode::{INITIAL_STATE, SPAN_FACTOR, SolverSettings, State};

/// N-dimensional grid storage with flat backing array and stride-based indexing.
///
/// Stores values in row-major order where the last dimension varies fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid<T> {
    /// The data stored in row-major order
    data: Vec<T>,
    /// Shape of each dimension (e.g., [6, 6] for a 6x6 grid)
    shape: Vec<usize>,
    /// Precomputed strides for index calculation
    strides: Vec<usize>,
}

impl<T: Clone> SweepGrid<T> {
    /// Create a new grid with the given shape, filled with `fill`.
    pub fn new(shape: Vec<usize>, fill: T) -> Self {
        let total_size: usize = shape.iter().product();
        let strides = compute_strides(&shape);
        Self {
            data: vec![fill; total_size],
            shape,
            strides,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert multi-dimensional indices to flat index
    pub fn flat_index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (i, (&idx, &size)) in indices.iter().zip(&self.shape).enumerate() {
            if idx >= size {
                return None;
            }
            flat += idx * self.strides[i];
        }
        Some(flat)
    }

    /// Convert flat index to multi-dimensional indices
    pub fn multi_index(&self, flat: usize) -> Option<Vec<usize>> {
        if flat >= self.data.len() {
            return None;
        }
        let mut indices = Vec::with_capacity(self.shape.len());
        let mut remaining = flat;
        for &stride in &self.strides {
            indices.push(remaining / stride);
            remaining %= stride;
        }
        Some(indices)
    }

    pub fn get(&self, indices: &[usize]) -> Option<&T> {
        self.flat_index(indices).map(|i| &self.data[i])
    }

    pub fn get_flat(&self, flat: usize) -> Option<&T> {
        self.data.get(flat)
    }

    /// Set the value at the given indices
    pub fn set(&mut self, indices: &[usize], value: T) -> bool {
        if let Some(i) = self.flat_index(indices) {
            self.data[i] = value;
            true
        } else {
            false
        }
    }

    /// Set the value at a flat index
    pub fn set_flat(&mut self, flat: usize, value: T) -> bool {
        match self.data.get_mut(flat) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }
}

/// Compute strides for row-major order
fn compute_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return Vec::new();
    }
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len() - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Linearly spaced values from `start` to `end` inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRange {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl LinearRange {
    pub fn new(start: f64, end: f64, count: usize) -> Self {
        Self { start, end, count }
    }

    /// Generate the range values
    pub fn values(&self) -> Vec<f64> {
        if self.count == 0 {
            return Vec::new();
        }
        if self.count == 1 {
            return vec![self.start];
        }
        let step_size = (self.end - self.start) / (self.count - 1) as f64;
        (0..self.count)
            .map(|i| {
                // Pin the last value so rounding never drifts past `end`
                if i == self.count - 1 {
                    self.end
                } else {
                    self.start + step_size * i as f64
                }
            })
            .collect()
    }

    fn validate(&self, name: &str) -> Result<(), SweepError> {
        if self.count == 0 {
            return Err(SweepError::Config(format!("{name} range needs at least one point")));
        }
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(SweepError::Config(format!("{name} range bounds must be finite")));
        }
        Ok(())
    }
}

/// One-based linear index of a grid cell (row-major)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointId(pub usize);

impl PointId {
    pub fn from_flat(flat: usize) -> Self {
        PointId(flat + 1)
    }

    /// Zero-based flat index, `None` for the invalid id 0
    pub fn flat(&self) -> Option<usize> {
        self.0.checked_sub(1)
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One (mu, nu) combination and its position in the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub id: PointId,
    pub row: usize,
    pub col: usize,
    pub mu: f64,
    pub nu: f64,
}

/// Full Cartesian pairing of the mu and nu ranges.
///
/// Rows vary mu, columns vary nu.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    pub mu_values: Vec<f64>,
    pub nu_values: Vec<f64>,
    pub mu: SweepGrid<f64>,
    pub nu: SweepGrid<f64>,
}

impl ParameterGrid {
    pub fn build(mu: &LinearRange, nu: &LinearRange) -> Result<Self, SweepError> {
        mu.validate("mu")?;
        nu.validate("nu")?;

        let mu_values = mu.values();
        let nu_values = nu.values();
        let shape = vec![mu_values.len(), nu_values.len()];

        let mut mu_grid = SweepGrid::new(shape.clone(), 0.0);
        let mut nu_grid = SweepGrid::new(shape, 0.0);
        for (i, &m) in mu_values.iter().enumerate() {
            for (j, &n) in nu_values.iter().enumerate() {
                mu_grid.set(&[i, j], m);
                nu_grid.set(&[i, j], n);
            }
        }

        Ok(Self {
            mu_values,
            nu_values,
            mu: mu_grid,
            nu: nu_grid,
        })
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.mu_values.len(), self.nu_values.len())
    }

    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }

    pub fn point(&self, id: PointId) -> Option<GridPoint> {
        let flat = id.flat()?;
        let indices = self.mu.multi_index(flat)?;
        Some(GridPoint {
            id,
            row: indices[0],
            col: indices[1],
            mu: *self.mu.get_flat(flat)?,
            nu: *self.nu.get_flat(flat)?,
        })
    }

    /// All grid points in row-major order
    pub fn points(&self) -> Vec<GridPoint> {
        (0..self.len())
            .filter_map(|flat| self.point(PointId::from_flat(flat)))
            .collect()
    }
}

/// Configuration for one sweep run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_mu")]
    pub mu: LinearRange,
    #[serde(default = "default_nu")]
    pub nu: LinearRange,
    #[serde(default)]
    pub solver: SolverSettings,
    /// The integration interval is `[0, span_factor * mu]`
    #[serde(default = "default_span_factor")]
    pub span_factor: f64,
    #[serde(default = "default_initial_state")]
    pub initial_state: State,
    /// Number of pool workers (defaults to CPU count)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Minimum time between plot redraws
    #[serde(default = "default_redraw_interval_ms")]
    pub redraw_interval_ms: u64,
}

fn default_mu() -> LinearRange {
    LinearRange::new(0.5, 2.0, 6)
}

fn default_nu() -> LinearRange {
    LinearRange::new(100.0, 150.0, 6)
}

fn default_span_factor() -> f64 {
    SPAN_FACTOR
}

fn default_initial_state() -> State {
    INITIAL_STATE
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_redraw_interval_ms() -> u64 {
    100
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            mu: default_mu(),
            nu: default_nu(),
            solver: SolverSettings::default(),
            span_factor: default_span_factor(),
            initial_state: default_initial_state(),
            workers: default_workers(),
            redraw_interval_ms: default_redraw_interval_ms(),
        }
    }
}

impl SweepConfig {
    pub fn grid(&self) -> Result<ParameterGrid, SweepError> {
        ParameterGrid::build(&self.mu, &self.nu)
    }

    pub fn total_points(&self) -> usize {
        self.mu.count * self.nu.count
    }

    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms)
    }

    /// Check everything a sweep needs before any work is scheduled
    pub fn validate(&self) -> Result<(), SweepError> {
        self.mu.validate("mu")?;
        self.nu.validate("nu")?;
        if self.workers == 0 {
            return Err(SweepError::Config("worker count must be positive".to_string()));
        }
        if !(self.span_factor > 0.0) {
            return Err(SweepError::Config("span_factor must be positive".to_string()));
        }
        if !(self.solver.rtol > 0.0) || !(self.solver.atol > 0.0) {
            return Err(SweepError::Config("solver tolerances must be positive".to_string()));
        }
        Ok(())
    }
}
