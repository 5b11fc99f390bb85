//! JSON export of a finished sweep.

use std::fs;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use periodsweep_core::{CellStatus, SweepReport, SweepSummary};
use serde::Serialize;

/// Serialized form of the final plot
#[derive(Debug, Clone, Serialize)]
pub struct SweepExport {
    pub mu: Vec<f64>,
    pub nu: Vec<f64>,
    /// Row-major by mu, `null` where no period is known
    pub values: Vec<Vec<Option<f64>>>,
    pub status: Vec<Vec<CellStatus>>,
    pub counts: CellCounts,
    pub summary: SweepSummary,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CellCounts {
    pub total: usize,
    pub reported: usize,
    pub pending: usize,
    pub failed: usize,
    pub undefined: usize,
}

impl SweepExport {
    pub fn from_report(report: &SweepReport) -> Self {
        let buffer = &report.buffer;
        let (rows, cols) = buffer.shape();

        let values = (0..rows)
            .map(|i| {
                (0..cols)
                    .map(|j| buffer.value(i, j).filter(|v| v.is_finite()))
                    .collect()
            })
            .collect();
        let status = (0..rows)
            .map(|i| {
                (0..cols)
                    .map(|j| buffer.status(i, j).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self {
            mu: buffer.mu_values().to_vec(),
            nu: buffer.nu_values().to_vec(),
            values,
            status,
            counts: CellCounts {
                total: buffer.total(),
                reported: buffer.reported(),
                pending: buffer.pending(),
                failed: buffer.failed(),
                undefined: buffer.undefined(),
            },
            summary: report.summary,
        }
    }
}

/// Write the report as pretty JSON, replacing `path` atomically
pub fn write_json(path: &Path, report: &SweepReport) -> color_eyre::Result<()> {
    let json = serde_json::to_string_pretty(&SweepExport::from_report(report))?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, json)
        .wrap_err_with(|| format!("Failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .wrap_err_with(|| format!("Failed to move export to {}", path.display()))?;

    tracing::info!(path = %path.display(), "Exported sweep results");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use periodsweep_core::analysis::{LinearRange, ParameterGrid, PointId, SweepResult};
    use periodsweep_core::period::PeriodEstimate;
    use periodsweep_core::{CoordinatorExit, PlotBuffer};
    use tempfile::tempdir;

    fn report() -> SweepReport {
        let grid = ParameterGrid::build(
            &LinearRange::new(1.0, 2.0, 2),
            &LinearRange::new(10.0, 20.0, 2),
        )
        .unwrap();
        let mut buffer = PlotBuffer::new(&grid);
        buffer.apply(&SweepResult {
            id: PointId(1),
            mu: 1.0,
            nu: 10.0,
            outcome: Ok(PeriodEstimate::Mean(6.5)),
        });
        buffer.apply(&SweepResult {
            id: PointId(4),
            mu: 2.0,
            nu: 20.0,
            outcome: Ok(PeriodEstimate::Undefined),
        });

        SweepReport {
            summary: SweepSummary {
                total: 4,
                delivered: 2,
                lost: 2,
                ..Default::default()
            },
            buffer,
            frames: 1,
            exit: CoordinatorExit::Completed,
        }
    }

    #[test]
    fn test_sentinels_become_null() {
        let value = serde_json::to_value(SweepExport::from_report(&report())).unwrap();

        assert_eq!(value["values"][0][0], 6.5);
        assert!(value["values"][0][1].is_null());
        assert!(value["values"][1][1].is_null());
        assert_eq!(value["status"][0][1], "Pending");
        assert_eq!(value["status"][1][1], "Undefined");
        assert_eq!(value["counts"]["reported"], 2);
        assert_eq!(value["counts"]["pending"], 2);
        assert_eq!(value["summary"]["lost"], 2);
    }

    #[test]
    fn test_write_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.json");

        write_json(&path, &report()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["mu"], serde_json::json!([1.0, 2.0]));
        assert_eq!(value["nu"], serde_json::json!([10.0, 20.0]));
        assert!(!path.with_extension("json.tmp").exists());
    }
}
