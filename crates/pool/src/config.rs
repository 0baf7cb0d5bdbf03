//! Pool controller configuration: re-read from disk once per cycle so an
//! operator can reshape a running factory without restarting it (spec
//! §4.3 step 1).

use crate::error::PoolError;
use flowctl_core::ResourceRequest;
use flowctl_queue::BatchQueueKind;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// On-disk shape. Every field is optional so a partial file only overrides
/// what it mentions; [`PoolConfig::from_raw`] fills the rest with defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    manager_pattern: Option<String>,
    foremen_pattern: Option<String>,
    min_workers: Option<u32>,
    max_workers: Option<u32>,
    max_new_workers_per_cycle: Option<u32>,
    tasks_per_worker: Option<u32>,
    worker_idle_timeout_s: Option<u64>,
    cycle_interval_s: Option<u64>,
    manager_timeout_s: Option<u64>,
    consider_capacity: Option<bool>,
    worker_command: Option<String>,
    worker_options: Option<String>,
    backend: Option<String>,
    backend_requirements: Option<String>,
    worker_cores: Option<u32>,
    worker_memory_mb: Option<u64>,
    worker_disk_mb: Option<u64>,
    worker_gpus: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub manager_pattern: String,
    /// A second, independently-matched name pattern for foreman-fronted
    /// managers (spec §4.3 "target-manager name pattern (optional foremen
    /// pattern)"). Query results from both patterns are merged by name.
    pub foremen_pattern: Option<String>,
    pub min_workers: u32,
    pub max_workers: u32,
    pub max_new_workers_per_cycle: u32,
    pub tasks_per_worker: u32,
    pub worker_idle_timeout: Duration,
    pub cycle_interval: Duration,
    pub manager_timeout: Duration,
    pub consider_capacity: bool,
    pub worker_command: String,
    pub worker_options: Option<String>,
    pub backend: BatchQueueKind,
    pub backend_requirements: Option<String>,
    pub worker_resources: ResourceRequest,
}

impl PoolConfig {
    pub fn load(path: &Path) -> Result<Self, PoolError> {
        let text = std::fs::read_to_string(path)?;
        let raw: RawConfig =
            toml::from_str(&text).map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        let config = Self::from_raw(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, PoolError> {
        let backend = raw
            .backend
            .as_deref()
            .unwrap_or("local")
            .parse::<BatchQueueKind>()
            .map_err(|e| PoolError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            manager_pattern: raw.manager_pattern.unwrap_or_else(|| ".*".to_string()),
            foremen_pattern: raw.foremen_pattern,
            min_workers: raw.min_workers.unwrap_or(0),
            max_workers: raw.max_workers.unwrap_or(100),
            max_new_workers_per_cycle: raw.max_new_workers_per_cycle.unwrap_or(10),
            tasks_per_worker: raw.tasks_per_worker.unwrap_or(1).max(1),
            worker_idle_timeout: Duration::from_secs(raw.worker_idle_timeout_s.unwrap_or(900)),
            cycle_interval: Duration::from_secs(raw.cycle_interval_s.unwrap_or(30)),
            manager_timeout: Duration::from_secs(raw.manager_timeout_s.unwrap_or(900)),
            consider_capacity: raw.consider_capacity.unwrap_or(true),
            worker_command: raw.worker_command.unwrap_or_default(),
            worker_options: raw.worker_options,
            backend,
            backend_requirements: raw.backend_requirements,
            worker_resources: ResourceRequest {
                cores: raw.worker_cores,
                memory_mb: raw.worker_memory_mb,
                disk_mb: raw.worker_disk_mb,
                gpus: raw.worker_gpus,
                wall_time_s: None,
                mpi_processes: None,
            },
        })
    }

    /// §4.3 step 1: `min ≤ max`, patterns compile, nothing else. Callers
    /// keep the previous config on error rather than propagating a
    /// half-applied reload.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.min_workers > self.max_workers {
            return Err(PoolError::InvalidConfig(format!(
                "min_workers ({}) > max_workers ({})",
                self.min_workers, self.max_workers
            )));
        }
        regex::Regex::new(&self.manager_pattern)
            .map_err(|e| PoolError::BadPattern(self.manager_pattern.clone(), e))?;
        if let Some(pattern) = &self.foremen_pattern {
            regex::Regex::new(pattern).map_err(|e| PoolError::BadPattern(pattern.clone(), e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
