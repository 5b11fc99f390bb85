//! Oscillation period from the spacing of local maxima.

use serde::{Deserialize, Serialize};

use crate::ode::TimeSeries;

/// Result of period estimation for one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PeriodEstimate {
    /// Mean spacing between consecutive maxima
    Mean(f64),
    /// Fewer than two maxima were found
    Undefined,
}

impl PeriodEstimate {
    /// Numeric value for plotting, NaN when undefined
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            PeriodEstimate::Mean(p) => *p,
            PeriodEstimate::Undefined => f64::NAN,
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            PeriodEstimate::Mean(p) => Some(*p),
            PeriodEstimate::Undefined => None,
        }
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        matches!(self, PeriodEstimate::Mean(_))
    }
}

/// Indices of strict local maxima: interior samples greater than both neighbours.
pub fn local_maxima(values: &[f64]) -> Vec<usize> {
    values
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, _)| i + 1)
        .collect()
}

/// Mean time between consecutive local maxima of `values`.
///
/// `times` and `values` must have the same length; extra samples on either
/// side are ignored.
pub fn estimate_period(times: &[f64], values: &[f64]) -> PeriodEstimate {
    let n = times.len().min(values.len());
    let peaks = local_maxima(&values[..n]);
    if peaks.len() < 2 {
        return PeriodEstimate::Undefined;
    }

    // Telescoping sum of the consecutive differences
    let first = times[peaks[0]];
    let last = times[peaks[peaks.len() - 1]];
    PeriodEstimate::Mean((last - first) / (peaks.len() - 1) as f64)
}

/// Period of the second state component of a solver time series
pub fn estimate_series_period(series: &TimeSeries) -> PeriodEstimate {
    estimate_period(&series.times, &series.component(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_maxima_strict() {
        // Plateau at index 2-3 is not a strict maximum
        let values = [0.0, 1.0, 3.0, 3.0, 1.0, 2.0, 0.0];
        assert_eq!(local_maxima(&values), vec![5]);
    }

    #[test]
    fn test_endpoints_are_not_maxima() {
        let values = [5.0, 1.0, 0.0, 1.0, 5.0];
        assert!(local_maxima(&values).is_empty());
    }

    #[test]
    fn test_short_inputs() {
        assert!(local_maxima(&[]).is_empty());
        assert!(local_maxima(&[1.0, 2.0]).is_empty());
        assert_eq!(estimate_period(&[], &[]), PeriodEstimate::Undefined);
    }

    #[test]
    fn test_undefined_as_nan() {
        assert!(PeriodEstimate::Undefined.as_f64().is_nan());
        assert_eq!(PeriodEstimate::Undefined.value(), None);
        assert_eq!(PeriodEstimate::Mean(2.5).as_f64(), 2.5);
    }
}
