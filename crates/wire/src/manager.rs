//! The manager-side record the directory service publishes for each
//! running workflow manager, and the pool controller's query result.

use serde::{Deserialize, Serialize};

/// Published capacity, keyed by resource, alongside the raw task counts.
/// A field is `None` when the manager does not track that resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityVector {
    pub capacity_tasks: Option<u64>,
    pub capacity_cores: Option<u64>,
    pub capacity_memory: Option<u64>,
    pub capacity_disk: Option<u64>,
    pub capacity_gpus: Option<u64>,
    pub capacity_weighted: Option<u64>,
}

/// One manager record as returned by a directory-service query (or a
/// direct single-manager query, per `DirectoryClient::query_direct`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSummary {
    pub name: String,
    pub project: Option<String>,
    pub has_foremen: bool,
    pub tasks_waiting: u64,
    pub tasks_on_workers: u64,
    pub tasks_left: u64,
    pub tasks_running: u64,
    /// Per-resource totals across all currently-queued tasks, used for the
    /// independent "published task totals" upper bound on needed workers.
    pub tasks_total_cores: Option<u64>,
    pub tasks_total_memory: Option<u64>,
    pub tasks_total_disk: Option<u64>,
    pub tasks_total_gpus: Option<u64>,
    pub capacity: CapacityVector,
    pub workers_blocked: Vec<String>,
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
