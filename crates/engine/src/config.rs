//! Process-wide configuration, built once in `main` and threaded explicitly
//! into the engine and pool controller constructors (spec §9 "Global
//! state" — the only remaining process-wide state besides this is the
//! signal flag and the content-hash cache).

use std::time::Duration;

/// Which outputs `DagEngine::clean` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanMode {
    /// Remove every declared target, final or intermediate.
    AllOutputs,
    /// Remove only targets that are also another node's source — leaves
    /// the workflow's final deliverables untouched.
    IntermediateOnly,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub local_jobs_max: u32,
    pub remote_jobs_max: u32,
    pub retry_enabled: bool,
    pub retry_max: u32,
    pub submit_timeout: Duration,
    pub preserve_symlinks: bool,
    pub clean_mode: CleanMode,
    /// `BATCH_OPTIONS` (spec §6): extra flags appended to every backend
    /// submission, pushed once into each queue via `set_option`.
    pub batch_options: Option<String>,
}

impl Config {
    pub fn new(local_jobs_max: u32, remote_jobs_max: u32) -> Self {
        Self {
            local_jobs_max,
            remote_jobs_max,
            retry_enabled: true,
            retry_max: 0,
            submit_timeout: Duration::from_secs(3600),
            preserve_symlinks: false,
            clean_mode: CleanMode::IntermediateOnly,
            batch_options: None,
        }
    }

    /// Default `local_jobs_max` (spec §5): the number of CPUs.
    pub fn default_local_jobs_max() -> u32 {
        std::thread::available_parallelism().map(|n| n.get() as u32).unwrap_or(1)
    }

    /// Default `remote_jobs_max` (spec §5): 1000 for the distributed queue,
    /// 100 for everything else, 1x CPUs for a local-only backend.
    pub fn default_remote_jobs_max(kind: flowctl_queue::BatchQueueKind) -> u32 {
        match kind {
            flowctl_queue::BatchQueueKind::Distributed => 1000,
            flowctl_queue::BatchQueueKind::Local | flowctl_queue::BatchQueueKind::NoOp => {
                Self::default_local_jobs_max()
            }
            _ => 100,
        }
    }

    /// Applies the §6 environment-variable overrides, exactly once, as
    /// `main` builds the `Config`.
    pub fn with_env_overrides(self) -> Self {
        let local = std::env::var("MAKEFLOW_MAX_LOCAL_JOBS").ok().and_then(|v| v.parse().ok());
        let remote = std::env::var("MAKEFLOW_MAX_REMOTE_JOBS").ok().and_then(|v| v.parse().ok());
        let batch_options = std::env::var("BATCH_OPTIONS").ok();
        self.apply_overrides(local, remote, batch_options)
    }

    /// The pure, testable core of `with_env_overrides`: both job caps are
    /// lower-only clamps, never raised by an override.
    pub(crate) fn apply_overrides(
        mut self,
        local_cap: Option<u32>,
        remote_cap: Option<u32>,
        batch_options: Option<String>,
    ) -> Self {
        if let Some(n) = local_cap {
            self.local_jobs_max = self.local_jobs_max.min(n);
        }
        if let Some(n) = remote_cap {
            self.remote_jobs_max = self.remote_jobs_max.min(n);
        }
        if batch_options.is_some() {
            self.batch_options = batch_options;
        }
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
