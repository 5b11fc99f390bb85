//! YAML configuration file and command line overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{WrapErr, eyre};
use periodsweep_core::PoolProfile;
use periodsweep_core::analysis::{LinearRange, SweepConfig, default_workers};
use serde::{Deserialize, Serialize};

/// Name of the profile used when the file defines none
pub const LOCAL_PROFILE: &str = "local";

/// Contents of `config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sweep: SweepConfig,
    /// Named worker pool profiles
    pub profiles: BTreeMap<String, PoolProfile>,
    /// Profile used when none is given on the command line
    pub active_profile: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sweep: SweepConfig::default(),
            profiles: BTreeMap::from([(
                LOCAL_PROFILE.to_string(),
                PoolProfile::local(default_workers()),
            )]),
            active_profile: None,
        }
    }
}

/// Values given on the command line. They take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepOverrides {
    pub profile: Option<String>,
    pub workers: Option<usize>,
    pub mu: Option<LinearRange>,
    pub nu: Option<LinearRange>,
    pub redraw_ms: Option<u64>,
}

impl AppConfig {
    /// Default config file location
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.yaml")
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_saphyr::ser::Error> {
        serde_saphyr::to_string(self)
    }

    /// Load the file, or defaults when it does not exist
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .map_err(|e| eyre!("Failed to parse {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Pool profile by name, falling back to the active profile and then to
    /// a local pool of `sweep.workers` threads
    pub fn pool_profile(&self, name: Option<&str>) -> color_eyre::Result<PoolProfile> {
        match name.or(self.active_profile.as_deref()) {
            Some(name) => self.profiles.get(name).cloned().ok_or_else(|| {
                let known: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
                eyre!("Unknown pool profile '{name}' (known: {})", known.join(", "))
            }),
            None => Ok(PoolProfile::local(self.sweep.workers)),
        }
    }

    /// Merge command line overrides and return the sweep to run and the pool
    /// to run it on
    pub fn resolve(&self, overrides: &SweepOverrides) -> color_eyre::Result<(SweepConfig, PoolProfile)> {
        let mut sweep = self.sweep.clone();
        if let Some(mu) = overrides.mu {
            sweep.mu = mu;
        }
        if let Some(nu) = overrides.nu {
            sweep.nu = nu;
        }
        if let Some(ms) = overrides.redraw_ms {
            sweep.redraw_interval_ms = ms;
        }

        let mut profile = self.pool_profile(overrides.profile.as_deref())?;
        if let Some(workers) = overrides.workers {
            profile.workers = workers;
        }
        sweep.workers = profile.workers;

        sweep.validate()?;
        Ok((sweep, profile))
    }
}

/// Parse `START END COUNT` from the command line
pub fn parse_range(values: &[f64]) -> color_eyre::Result<LinearRange> {
    let [start, end, count] = values else {
        return Err(eyre!("Expected START END COUNT, got {} values", values.len()));
    };
    if count.fract() != 0.0 || *count < 1.0 {
        return Err(eyre!("COUNT must be a positive integer, got {count}"));
    }
    Ok(LinearRange::new(*start, *end, *count as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
sweep:
  mu:
    start: 1.0
    end: 3.0
    count: 3
  redraw_interval_ms: 250
profiles:
  local:
    workers: 2
  cluster:
    workers: 32
    stack_size_mb: 8
active_profile: cluster
";

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.sweep.mu, LinearRange::new(1.0, 3.0, 3));
        // Unspecified fields keep their defaults
        assert_eq!(config.sweep.nu, LinearRange::new(100.0, 150.0, 6));
        assert_eq!(config.sweep.span_factor, 20.0);
        assert_eq!(config.sweep.redraw_interval_ms, 250);
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.profiles["cluster"].stack_size_mb, Some(8));
        assert_eq!(config.active_profile.as_deref(), Some("cluster"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(AppConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_active_profile_applies() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        let (sweep, profile) = config.resolve(&SweepOverrides::default()).unwrap();
        assert_eq!(profile.workers, 32);
        assert_eq!(sweep.workers, 32);
        assert_eq!(sweep.mu.count, 3);
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        let overrides = SweepOverrides {
            profile: Some("local".to_string()),
            workers: Some(5),
            mu: Some(LinearRange::new(0.1, 0.2, 2)),
            nu: None,
            redraw_ms: Some(10),
        };
        let (sweep, profile) = config.resolve(&overrides).unwrap();

        assert_eq!(profile.workers, 5);
        assert_eq!(sweep.workers, 5);
        assert_eq!(sweep.mu, LinearRange::new(0.1, 0.2, 2));
        assert_eq!(sweep.nu, LinearRange::new(100.0, 150.0, 6));
        assert_eq!(sweep.redraw_interval_ms, 10);
    }

    #[test]
    fn test_unknown_profile() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        let overrides = SweepOverrides {
            profile: Some("gpu".to_string()),
            ..Default::default()
        };
        let err = config.resolve(&overrides).unwrap_err();
        assert!(err.to_string().contains("gpu"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let config = AppConfig::default();
        let overrides = SweepOverrides {
            workers: Some(0),
            ..Default::default()
        };
        assert!(config.resolve(&overrides).is_err());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(&AppConfig::path(dir.path())).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = AppConfig::path(dir.path());
        std::fs::write(&path, "sweep: [not, a, map]\n").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.active_profile.as_deref(), Some("cluster"));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_range(&[0.5, 2.0, 6.0]).unwrap(),
            LinearRange::new(0.5, 2.0, 6)
        );
        assert!(parse_range(&[0.5, 2.0, 2.5]).is_err());
        assert!(parse_range(&[0.5, 2.0, 0.0]).is_err());
        assert!(parse_range(&[0.5, 2.0]).is_err());
    }
}
