//! Stiff-capable adaptive integration of planar ODE systems.
//!
//! The integrator is the linearly implicit Rosenbrock (2,3) pair known from
//! `ode23s`: one Jacobian evaluation and one 2x2 inverse per step attempt, a
//! second-order solution and a third-order error estimate. It is L-stable,
//! so stiff parameter corners of the sweep do not collapse the step size.

use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;

/// State of a planar system `(x, y)`
pub type State = [f64; 2];

/// Jacobian of a planar system, row-major
pub type Jacobian = [[f64; 2]; 2];

/// Fixed initial state of the oscillator
pub const INITIAL_STATE: State = [2.0, 0.0];

/// The integration interval is `[0, SPAN_FACTOR * mu]`
pub const SPAN_FACTOR: f64 = 20.0;

// Rosenbrock coefficients
const GAMMA: f64 = 1.0 / (2.0 + std::f64::consts::SQRT_2);
const E32: f64 = 6.0 + std::f64::consts::SQRT_2;

// Step size controller
const SAFETY: f64 = 0.8;
const MAX_GROWTH: f64 = 5.0;
const MIN_SHRINK: f64 = 0.2;

/// User-supplied planar ODE system `y' = f(t, y)`.
pub trait OdeSystem {
    /// Right-hand side `f(t, y)`.
    fn rhs(&self, t: f64, y: &State) -> State;

    /// Partial derivatives `df/dy`.
    fn jacobian(&self, t: f64, y: &State) -> Jacobian;

    /// Partial derivative `df/dt`. Autonomous systems keep the default.
    #[allow(unused_variables)]
    fn time_derivative(&self, t: f64, y: &State) -> State {
        [0.0, 0.0]
    }
}

/// Nonlinear oscillator `x' = nu*y`, `y' = mu*(1 - x^2)*y - x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    pub mu: f64,
    pub nu: f64,
}

impl Oscillator {
    pub fn new(mu: f64, nu: f64) -> Self {
        Self { mu, nu }
    }

    /// Integration interval `[0, span_factor * mu]`
    pub fn time_span(&self, span_factor: f64) -> (f64, f64) {
        (0.0, span_factor * self.mu)
    }
}

impl OdeSystem for Oscillator {
    fn rhs(&self, _t: f64, y: &State) -> State {
        let [x, v] = *y;
        [self.nu * v, self.mu * (1.0 - x * x) * v - x]
    }

    fn jacobian(&self, _t: f64, y: &State) -> Jacobian {
        let [x, v] = *y;
        [
            [0.0, self.nu],
            [-2.0 * self.mu * x * v - 1.0, self.mu * (1.0 - x * x)],
        ]
    }
}

/// Tolerances and limits for the adaptive integrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Relative tolerance
    pub rtol: f64,
    /// Absolute tolerance
    pub atol: f64,
    /// Maximum number of step attempts (accepted + rejected)
    pub max_steps: usize,
    /// First step size. Estimated from the initial slope when `None`.
    pub initial_step: Option<f64>,
    /// Largest allowed step. Defaults to a tenth of the interval.
    pub max_step: Option<f64>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-6,
            max_steps: 200_000,
            initial_step: None,
            max_step: None,
        }
    }
}

/// Accepted solver steps: times and the state at each time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    pub times: Vec<f64>,
    pub states: Vec<State>,
}

impl TimeSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            times: Vec::with_capacity(capacity),
            states: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, t: f64, y: State) {
        self.times.push(t);
        self.states.push(y);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Values of one state component (0 = x, 1 = y)
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.states.iter().map(|s| s[index]).collect()
    }

    pub fn last(&self) -> Option<(f64, State)> {
        Some((*self.times.last()?, *self.states.last()?))
    }
}

/// Integrate `system` from `(t0, y0)` to `tf`.
///
/// Every accepted step is recorded, including the initial state. The last
/// sample is at exactly `tf`.
pub fn integrate<S: OdeSystem>(
    system: &S,
    t0: f64,
    tf: f64,
    y0: State,
    settings: &SolverSettings,
) -> Result<TimeSeries, IntegrationError> {
    if !t0.is_finite() || !tf.is_finite() || tf <= t0 {
        return Err(IntegrationError::InvalidSpan { t0, tf });
    }

    let span = tf - t0;
    let max_step = settings.max_step.unwrap_or(span / 10.0).min(span);

    let mut t = t0;
    let mut y = y0;
    let mut f0 = system.rhs(t, &y);
    if !is_finite(&y) || !is_finite(&f0) {
        return Err(IntegrationError::NonFiniteState { t });
    }

    let mut h = settings
        .initial_step
        .unwrap_or_else(|| initial_step(&y, &f0, settings))
        .min(max_step);

    let mut series = TimeSeries::with_capacity(256);
    series.push(t, y);

    let mut steps = 0;
    while t < tf {
        if steps >= settings.max_steps {
            return Err(IntegrationError::TooManySteps { t, steps });
        }
        steps += 1;

        let h_min = 16.0 * f64::EPSILON * t.abs().max(1.0);
        h = h.min(max_step).max(h_min);

        // Stretch the step when the remainder is within 10%
        let last = t + 1.1 * h >= tf;
        if last {
            h = tf - t;
        }

        let jac = system.jacobian(t, &y);
        let hg = h * GAMMA;
        let w_inv = invert_iteration_matrix(&jac, hg)
            .ok_or(IntegrationError::SingularIterationMatrix { t })?;
        let dfdt = system.time_derivative(t, &y);
        let t_term = [hg * dfdt[0], hg * dfdt[1]];

        let k1 = mul(&w_inv, &[f0[0] + t_term[0], f0[1] + t_term[1]]);
        let y_mid = [y[0] + 0.5 * h * k1[0], y[1] + 0.5 * h * k1[1]];
        let f1 = system.rhs(t + 0.5 * h, &y_mid);
        let k2_rhs = mul(&w_inv, &[f1[0] - k1[0], f1[1] - k1[1]]);
        let k2 = [k2_rhs[0] + k1[0], k2_rhs[1] + k1[1]];
        let y_new = [y[0] + h * k2[0], y[1] + h * k2[1]];
        let f2 = system.rhs(t + h, &y_new);
        let k3 = mul(
            &w_inv,
            &[
                f2[0] - E32 * (k2[0] - f1[0]) - 2.0 * (k1[0] - f0[0]) + t_term[0],
                f2[1] - E32 * (k2[1] - f1[1]) - 2.0 * (k1[1] - f0[1]) + t_term[1],
            ],
        );

        let mut err = 0.0_f64;
        for i in 0..2 {
            let est = h / 6.0 * (k1[i] - 2.0 * k2[i] + k3[i]);
            let scale = settings.atol + settings.rtol * y[i].abs().max(y_new[i].abs());
            err = err.max(est.abs() / scale);
        }

        if !err.is_finite() || !is_finite(&y_new) || !is_finite(&f2) {
            let shrunk = h * MIN_SHRINK;
            if shrunk < h_min {
                return Err(IntegrationError::NonFiniteState { t });
            }
            h = shrunk;
            continue;
        }

        let factor = if err == 0.0 {
            MAX_GROWTH
        } else {
            (SAFETY * err.powf(-1.0 / 3.0)).clamp(MIN_SHRINK, MAX_GROWTH)
        };

        if err <= 1.0 {
            t = if last { tf } else { t + h };
            y = y_new;
            f0 = f2;
            series.push(t, y);
            h *= factor;
        } else {
            let shrunk = h * factor.min(1.0);
            if shrunk < h_min {
                return Err(IntegrationError::StepSizeTooSmall { t, h: shrunk });
            }
            h = shrunk;
        }
    }

    Ok(series)
}

/// Integrate the oscillator over `[0, span_factor * mu]` from `initial_state`.
pub fn solve_oscillator(
    oscillator: &Oscillator,
    initial_state: State,
    span_factor: f64,
    settings: &SolverSettings,
) -> Result<TimeSeries, IntegrationError> {
    let (t0, tf) = oscillator.time_span(span_factor);
    integrate(oscillator, t0, tf, initial_state, settings)
}

/// Starting step from the scaled magnitude of the state and its slope
fn initial_step(y: &State, f0: &State, settings: &SolverSettings) -> f64 {
    let mut d0 = 0.0;
    let mut d1 = 0.0;
    for i in 0..2 {
        let scale = settings.atol + settings.rtol * y[i].abs();
        d0 += (y[i] / scale).powi(2);
        d1 += (f0[i] / scale).powi(2);
    }
    let d0 = (d0 / 2.0).sqrt();
    let d1 = (d1 / 2.0).sqrt();
    if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    }
}

/// Inverse of `I - hg*J`, or `None` when it is singular
fn invert_iteration_matrix(jac: &Jacobian, hg: f64) -> Option<Jacobian> {
    let a = 1.0 - hg * jac[0][0];
    let b = -hg * jac[0][1];
    let c = -hg * jac[1][0];
    let d = 1.0 - hg * jac[1][1];
    let det = a * d - b * c;
    if !det.is_finite() || det.abs() < f64::MIN_POSITIVE {
        return None;
    }
    Some([[d / det, -b / det], [-c / det, a / det]])
}

fn mul(m: &Jacobian, v: &State) -> State {
    [
        m[0][0] * v[0] + m[0][1] * v[1],
        m[1][0] * v[0] + m[1][1] * v[1],
    ]
}

fn is_finite(v: &State) -> bool {
    v.iter().all(|x| x.is_finite())
}
