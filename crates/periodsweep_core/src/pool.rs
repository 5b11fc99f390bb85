//! Fixed-size worker pool the sweep runs on.

use serde::{Deserialize, Serialize};

use crate::error::SweepError;

/// Name prefix of pool worker threads
pub const WORKER_THREAD_PREFIX: &str = "sweep-worker";

/// Named worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolProfile {
    pub workers: usize,
    /// Worker thread stack size in MiB (rayon default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_size_mb: Option<usize>,
}

impl PoolProfile {
    pub fn local(workers: usize) -> Self {
        Self {
            workers,
            stack_size_mb: None,
        }
    }
}

/// rayon thread pool with a fixed worker count
#[derive(Debug)]
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    profile: PoolProfile,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, SweepError> {
        Self::from_profile(&PoolProfile::local(workers))
    }

    pub fn from_profile(profile: &PoolProfile) -> Result<Self, SweepError> {
        if profile.workers == 0 {
            return Err(SweepError::Pool("worker count must be positive".to_string()));
        }

        let mut builder = rayon::ThreadPoolBuilder::new()
            .num_threads(profile.workers)
            .thread_name(|i| format!("{WORKER_THREAD_PREFIX}-{i}"));
        if let Some(mb) = profile.stack_size_mb {
            let bytes = mb.checked_mul(1024 * 1024).ok_or_else(|| {
                SweepError::Pool(format!("stack size of {mb} MiB is too large"))
            })?;
            builder = builder.stack_size(bytes);
        }
        let pool = builder
            .build()
            .map_err(|e| SweepError::Pool(e.to_string()))?;

        tracing::debug!(
            workers = profile.workers,
            stack_size_mb = profile.stack_size_mb,
            "Worker pool created"
        );

        Ok(Self {
            pool,
            profile: profile.clone(),
        })
    }

    /// Replace the pool with one of `workers` threads. The old threads exit
    /// once their queued work is done.
    pub fn resize(&mut self, workers: usize) -> Result<(), SweepError> {
        let profile = PoolProfile {
            workers,
            ..self.profile.clone()
        };
        *self = Self::from_profile(&profile)?;
        Ok(())
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    #[must_use]
    pub fn profile(&self) -> &PoolProfile {
        &self.profile
    }

    /// Run `op` inside the pool so parallel iterators use its threads
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}
