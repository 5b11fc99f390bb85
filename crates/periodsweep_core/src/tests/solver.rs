//! Tests for the stiff integrator and the oscillator model

use crate::error::IntegrationError;
use crate::ode::{INITIAL_STATE, OdeSystem, Oscillator, SolverSettings, integrate, solve_oscillator};
use crate::period::{PeriodEstimate, estimate_series_period};

fn tight_settings() -> SolverSettings {
    SolverSettings {
        rtol: 1e-6,
        atol: 1e-9,
        max_step: Some(0.01),
        ..Default::default()
    }
}

/// Exponential decay `y' = -k*y` on both components
struct Decay {
    k: f64,
}

impl OdeSystem for Decay {
    fn rhs(&self, _t: f64, y: &[f64; 2]) -> [f64; 2] {
        [-self.k * y[0], -self.k * y[1]]
    }

    fn jacobian(&self, _t: f64, _y: &[f64; 2]) -> [[f64; 2]; 2] {
        [[-self.k, 0.0], [0.0, -self.k]]
    }
}

#[test]
fn test_exponential_decay_accuracy() {
    let settings = SolverSettings {
        rtol: 1e-6,
        atol: 1e-10,
        ..Default::default()
    };
    let series = integrate(&Decay { k: 2.0 }, 0.0, 1.0, [1.0, 0.5], &settings).unwrap();
    let (t, y) = series.last().unwrap();

    assert_eq!(t, 1.0);
    let expected = (-2.0_f64).exp();
    assert!((y[0] - expected).abs() < 1e-4, "got {}", y[0]);
    assert!((y[1] - 0.5 * expected).abs() < 1e-4, "got {}", y[1]);
}

#[test]
fn test_stiff_decay_takes_few_steps() {
    // An explicit method would need thousands of steps at k = 1e5
    let series = integrate(
        &Decay { k: 1e5 },
        0.0,
        10.0,
        [1.0, 1.0],
        &SolverSettings::default(),
    )
    .unwrap();
    assert!(series.len() < 2_000, "took {} steps", series.len());
    let (_, y) = series.last().unwrap();
    assert!(y[0].abs() < 1e-3);
}

#[test]
fn test_series_starts_at_initial_state_and_ends_at_final_time() {
    let oscillator = Oscillator::new(0.5, 100.0);
    let series =
        solve_oscillator(&oscillator, INITIAL_STATE, 20.0, &SolverSettings::default()).unwrap();

    assert_eq!(series.times[0], 0.0);
    assert_eq!(series.states[0], INITIAL_STATE);
    assert_eq!(*series.times.last().unwrap(), 10.0);
    assert!(series.times.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn test_van_der_pol_limit_cycle_period() {
    // mu = 1, nu = 1 is the classic Van der Pol oscillator, period ~6.6633
    let oscillator = Oscillator::new(1.0, 1.0);
    let series = solve_oscillator(&oscillator, INITIAL_STATE, 40.0, &tight_settings()).unwrap();

    match estimate_series_period(&series) {
        PeriodEstimate::Mean(period) => {
            assert!((period - 6.6633).abs() < 0.05, "period {period}");
        }
        PeriodEstimate::Undefined => panic!("expected a defined period"),
    }
}

#[test]
fn test_reference_corner_has_fast_oscillation() {
    // nu = 100 gives angular frequency ~sqrt(nu) = 10
    let oscillator = Oscillator::new(0.5, 100.0);
    let series =
        solve_oscillator(&oscillator, INITIAL_STATE, 20.0, &SolverSettings::default()).unwrap();

    let period = estimate_series_period(&series).value().unwrap();
    let expected = 2.0 * std::f64::consts::PI / 10.0;
    assert!(
        (period - expected).abs() / expected < 0.05,
        "period {period}, expected ~{expected}"
    );
}

#[test]
fn test_step_budget_exhausted() {
    let settings = SolverSettings {
        max_steps: 5,
        ..Default::default()
    };
    let result = solve_oscillator(&Oscillator::new(1.0, 1.0), INITIAL_STATE, 20.0, &settings);
    assert!(matches!(
        result,
        Err(IntegrationError::TooManySteps { steps: 5, .. })
    ));
}

#[test]
fn test_invalid_span() {
    let result = integrate(
        &Oscillator::new(1.0, 1.0),
        1.0,
        1.0,
        INITIAL_STATE,
        &SolverSettings::default(),
    );
    assert!(matches!(result, Err(IntegrationError::InvalidSpan { .. })));

    // mu = 0 collapses the interval to a point
    let result = solve_oscillator(
        &Oscillator::new(0.0, 1.0),
        INITIAL_STATE,
        20.0,
        &SolverSettings::default(),
    );
    assert!(matches!(result, Err(IntegrationError::InvalidSpan { .. })));
}

#[test]
fn test_non_finite_initial_state() {
    let result = integrate(
        &Oscillator::new(1.0, 1.0),
        0.0,
        1.0,
        [f64::NAN, 0.0],
        &SolverSettings::default(),
    );
    assert!(matches!(
        result,
        Err(IntegrationError::NonFiniteState { .. })
    ));
}

#[test]
fn test_oscillator_jacobian_matches_finite_difference() {
    let oscillator = Oscillator::new(1.5, 120.0);
    let y = [0.7, -0.3];
    let jac = oscillator.jacobian(0.0, &y);
    let eps = 1e-7;

    for j in 0..2 {
        let mut yp = y;
        yp[j] += eps;
        let f0 = oscillator.rhs(0.0, &y);
        let f1 = oscillator.rhs(0.0, &yp);
        for i in 0..2 {
            let fd = (f1[i] - f0[i]) / eps;
            assert!((fd - jac[i][j]).abs() < 1e-4, "J[{i}][{j}]");
        }
    }
}
