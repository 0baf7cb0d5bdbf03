//! Per-node/per-category resource requests.
//!
//! Fields are `Option` rather than the original's sentinel `-1`: backends
//! are free to ignore fields they cannot enforce, and an absent field is
//! represented directly instead of through a magic value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub cores: Option<u32>,
    pub memory_mb: Option<u64>,
    pub disk_mb: Option<u64>,
    pub gpus: Option<u32>,
    pub wall_time_s: Option<u64>,
    pub mpi_processes: Option<u32>,
}

impl ResourceRequest {
    pub fn new() -> Self {
        Self::default()
    }

    crate::setters! {
        option {
            cores: u32,
            memory_mb: u64,
            disk_mb: u64,
            gpus: u32,
            wall_time_s: u64,
            mpi_processes: u32,
        }
    }

    /// Ceiling-divide a published capacity vector by this request, per
    /// resource, returning the minimum ratio across resources present on
    /// both sides. Used by the pool controller's "consider capacity" clamp.
    pub fn min_capacity_ratio(&self, capacity: &ResourceRequest) -> Option<u64> {
        let pairs = [
            (capacity.cores.map(|v| v as u64), self.cores.map(|v| v as u64)),
            (capacity.memory_mb, self.memory_mb),
            (capacity.disk_mb, self.disk_mb),
            (capacity.gpus.map(|v| v as u64), self.gpus.map(|v| v as u64)),
        ];
        pairs
            .into_iter()
            .filter_map(|(cap, req)| match (cap, req) {
                (Some(cap), Some(req)) if req > 0 => Some(cap.div_ceil(req)),
                _ => None,
            })
            .min()
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
