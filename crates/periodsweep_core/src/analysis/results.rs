use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;
use crate::period::PeriodEstimate;

use super::PointId;

/// Outcome of evaluating one grid point, as sent over the result channel
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub id: PointId,
    pub mu: f64,
    pub nu: f64,
    pub outcome: Result<PeriodEstimate, IntegrationError>,
}

impl SweepResult {
    /// Value written into the plot: the period, or NaN when undefined or failed
    #[must_use]
    pub fn value(&self) -> f64 {
        match &self.outcome {
            Ok(estimate) => estimate.as_f64(),
            Err(_) => f64::NAN,
        }
    }
}

/// Summary of a finished (or cancelled) sweep run
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Grid points in the sweep
    pub total: usize,
    /// Results handed to the channel, failed ones included
    pub delivered: usize,
    /// Points whose integration failed
    pub failed: usize,
    /// Points with no delivered result: panicked evaluations and failed sends
    pub lost: usize,
    /// Points never started because the sweep was cancelled
    pub skipped: usize,
    pub cancelled: bool,
    #[serde(with = "duration_secs")]
    pub elapsed: std::time::Duration,
}

impl SweepSummary {
    /// Every point was delivered
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.delivered == self.total
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
