//! The pool controller's main control loop (spec §4.3): on each cycle,
//! query the directory service for manager demand, compute how many
//! ephemeral workers are needed, submit the shortfall, reap finished
//! workers, and publish this factory's own status back.

use crate::config::PoolConfig;
use crate::directory::DirectoryClient;
use crate::error::PoolError;
use flowctl_core::{BatchJobId, Clock, ResourceRequest};
use flowctl_queue::{BatchQueue, BatchQueueKind, JobSpec, WaitOutcome};
use flowctl_wire::{CapacityVector, ManagerSummary, PoolStatus};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// What one `run_once` cycle did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub needed: u64,
    pub submitted_this_cycle: u32,
    pub reaped: u32,
    pub workers_in_flight: u32,
}

pub struct PoolController<C: Clock> {
    config: PoolConfig,
    config_path: Option<PathBuf>,
    directory: Arc<dyn DirectoryClient>,
    queue: Arc<dyn BatchQueue>,
    clock: C,
    in_flight: HashSet<BatchJobId>,
    last_manager_seen_ms: u64,
}

impl<C: Clock> PoolController<C> {
    pub fn new(
        config: PoolConfig,
        config_path: Option<PathBuf>,
        directory: Arc<dyn DirectoryClient>,
        queue: Arc<dyn BatchQueue>,
        clock: C,
    ) -> Self {
        let last_manager_seen_ms = clock.epoch_ms();
        Self { config, config_path, directory, queue, clock, in_flight: HashSet::new(), last_manager_seen_ms }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn workers_in_flight(&self) -> u32 {
        self.in_flight.len() as u32
    }

    /// Drives [`run_once`](Self::run_once) every `cycle_interval` until
    /// `should_stop` returns true or the factory timeout fires.
    pub async fn run(&mut self, mut should_stop: impl FnMut() -> bool) -> Result<(), PoolError> {
        loop {
            if should_stop() {
                return Ok(());
            }
            match self.run_once().await {
                Ok(_) => {}
                Err(PoolError::ManagerTimeout(pattern, timeout)) => {
                    tracing::info!(pattern, ?timeout, "no manager seen recently, factory exiting");
                    return Ok(());
                }
                Err(e) => tracing::warn!(error = %e, "pool control cycle failed"),
            }
            tokio::time::sleep(self.config.cycle_interval).await;
        }
    }

    /// One full 9-step cycle (spec §4.3).
    pub async fn run_once(&mut self) -> Result<CycleReport, PoolError> {
        self.reload_config();

        let managers = self.query_managers().await?;
        self.check_manager_timeout(&managers)?;

        let needed = managers.iter().map(|m| needed_for_manager(&self.config, m)).sum::<u64>();
        let needed = needed.clamp(self.config.min_workers as u64, self.config.max_workers as u64);

        let already_submitted = self.in_flight.len() as u64;
        // Workers a manager has already connected directly are not
        // observable through the wire contract this controller consumes
        // (no DTO field names them); treated as zero, per spec §4.3 step 5.
        let seen_externally = 0u64;
        let new_to_submit = needed
            .saturating_sub(already_submitted)
            .saturating_sub(seen_externally)
            .min(self.config.max_new_workers_per_cycle as u64);

        let submitted_this_cycle = self.submit_workers(new_to_submit).await;
        let reaped = self.reap_completed().await?;
        self.propagate_blocklist(&managers);
        self.publish_status(&managers, needed, submitted_this_cycle).await;

        Ok(CycleReport {
            needed,
            submitted_this_cycle,
            reaped,
            workers_in_flight: self.in_flight.len() as u32,
        })
    }

    fn reload_config(&mut self) {
        let Some(path) = &self.config_path else { return };
        match PoolConfig::load(path) {
            Ok(config) => self.config = config,
            Err(e) => tracing::warn!(error = %e, "keeping previous pool config"),
        }
    }

    async fn query_managers(&self) -> Result<Vec<ManagerSummary>, PoolError> {
        let mut managers = self.directory.query(&self.config.manager_pattern).await?;
        if let Some(pattern) = self.config.foremen_pattern.clone() {
            for foreman in self.directory.query(&pattern).await? {
                if !managers.iter().any(|m| m.name == foreman.name) {
                    managers.push(foreman);
                }
            }
        }
        Ok(managers)
    }

    fn check_manager_timeout(&mut self, managers: &[ManagerSummary]) -> Result<(), PoolError> {
        let now = self.clock.epoch_ms();
        if !managers.is_empty() {
            self.last_manager_seen_ms = now;
            return Ok(());
        }
        let elapsed = Duration::from_millis(now.saturating_sub(self.last_manager_seen_ms));
        if elapsed > self.config.manager_timeout {
            return Err(PoolError::ManagerTimeout(self.config.manager_pattern.clone(), self.config.manager_timeout));
        }
        Ok(())
    }

    async fn submit_workers(&mut self, count: u64) -> u32 {
        if count > 0 && self.config.backend == BatchQueueKind::Condor {
            self.queue.set_option("autosize", "yes");
        }
        if let Some(options) = &self.config.worker_options {
            self.queue.set_option("batch-options", options);
        }
        if let Some(requirements) = &self.config.backend_requirements {
            self.queue.set_option("requirements", requirements);
        }

        let spec = JobSpec::new(self.config.worker_command.clone()).with_resources(self.config.worker_resources);
        let mut submitted = 0u32;
        for _ in 0..count {
            match self.queue.submit(&spec).await {
                Ok(job_id) => {
                    self.in_flight.insert(job_id);
                    submitted += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "worker submission failed, stopping for this cycle");
                    break;
                }
            }
        }
        submitted
    }

    async fn reap_completed(&mut self) -> Result<u32, PoolError> {
        let mut reaped = 0u32;
        loop {
            match self.queue.wait(Duration::ZERO).await? {
                WaitOutcome::Completed(job_id, _info) => {
                    self.in_flight.remove(&job_id);
                    reaped += 1;
                }
                WaitOutcome::None | WaitOutcome::Interrupted => break,
            }
        }
        Ok(reaped)
    }

    fn propagate_blocklist(&self, managers: &[ManagerSummary]) {
        let mut blocked: Vec<&str> = managers.iter().flat_map(|m| m.workers_blocked.iter().map(String::as_str)).collect();
        blocked.sort_unstable();
        blocked.dedup();
        if !blocked.is_empty() {
            self.queue.set_option("workers-blocked", &blocked.join(" "));
        }
    }

    async fn publish_status(&self, managers: &[ManagerSummary], needed: u64, submitted_this_cycle: u32) {
        let mut status = PoolStatus::new(Some(self.config.manager_pattern.clone()), self.config.foremen_pattern.clone());
        status.managers = managers.to_vec();
        status.workers_submitted = self.in_flight.len() as u64;
        status.workers_needed = needed;
        status.workers_requested_this_cycle = submitted_this_cycle as u64;
        // Whether a submitted worker has actually connected to its manager
        // is manager-side state this controller never observes.
        status.workers_waiting_to_connect = 0;

        if let Err(e) = self.directory.publish(&status).await {
            tracing::warn!(error = %e, "status publish failed, will retry next cycle");
        }
    }
}

/// §4.3 step 3: demand-based need, capped by published capacity, floored
/// by published per-resource task totals.
fn needed_for_manager(config: &PoolConfig, manager: &ManagerSummary) -> u64 {
    let mut base = manager.tasks_waiting + manager.tasks_left;
    if !manager.has_foremen {
        base += manager.tasks_running;
    }
    let demand = base.div_ceil(config.tasks_per_worker as u64);

    let demand = match (config.consider_capacity, capacity_ratio(&manager.capacity, &config.worker_resources)) {
        (true, Some(cap)) => demand.min(cap),
        _ => demand,
    };

    demand.max(task_totals_floor(manager, &config.worker_resources))
}

/// Ceiling-divides a published capacity vector by the per-worker resource
/// request, per resource, returning the minimum ratio across resources
/// present on both sides. Mirrors `ResourceRequest::min_capacity_ratio`'s
/// algorithm; reimplemented here rather than reused because the wire
/// contract's `CapacityVector` and the core `ResourceRequest` do not share
/// a common struct shape (see DESIGN.md).
fn capacity_ratio(capacity: &CapacityVector, request: &ResourceRequest) -> Option<u64> {
    let pairs = [
        (capacity.capacity_cores, request.cores.map(u64::from)),
        (capacity.capacity_memory, request.memory_mb),
        (capacity.capacity_disk, request.disk_mb),
        (capacity.capacity_gpus, request.gpus.map(u64::from)),
    ];
    pairs.into_iter().filter_map(|(cap, req)| match (cap, req) {
        (Some(cap), Some(req)) if req > 0 => Some(cap.div_ceil(req)),
        _ => None,
    }).min()
}

/// The independent "published task totals" upper bound from step 3: the
/// max, across resources, of total queued demand divided by the
/// per-worker request.
fn task_totals_floor(manager: &ManagerSummary, request: &ResourceRequest) -> u64 {
    let pairs = [
        (manager.tasks_total_cores, request.cores.map(u64::from)),
        (manager.tasks_total_memory, request.memory_mb),
        (manager.tasks_total_disk, request.disk_mb),
        (manager.tasks_total_gpus, request.gpus.map(u64::from)),
    ];
    pairs.into_iter().filter_map(|(total, req)| match (total, req) {
        (Some(total), Some(req)) if req > 0 => Some(total.div_ceil(req)),
        _ => None,
    }).max().unwrap_or(0)
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
