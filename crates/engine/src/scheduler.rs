//! Job-table bookkeeping and the node readiness rule (spec §4.1, §5).

use flowctl_core::{BatchJobId, Dag, NodeId, NodeState, Placement};
use std::collections::HashMap;

/// A node is ready to dispatch once every source file either has no
/// producing node, or its producing node has completed (spec §3
/// invariant: a node runs only after all its producers are `Complete`).
/// Producers are looked up through the file table rather than a
/// precomputed parent list, since the DAG only ever records the
/// source/target relation directly.
pub fn is_ready(dag: &Dag, node_id: NodeId) -> bool {
    let node = dag.node(node_id);
    if node.state != NodeState::Waiting {
        return false;
    }
    node.sources.iter().all(|source| match dag.files.get(&source.outer) {
        Some(record) => match record.creator {
            Some(producer) => dag.node(producer).state == NodeState::Complete,
            None => true,
        },
        None => true,
    })
}

/// Tracks which jobs are in flight, split by placement so the engine can
/// enforce `local_jobs_max` and `remote_jobs_max` independently.
#[derive(Debug, Default)]
pub struct Scheduler {
    running: HashMap<BatchJobId, NodeId>,
    local_count: u32,
    remote_count: u32,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_count(&self) -> u32 {
        self.local_count
    }

    pub fn remote_count(&self) -> u32 {
        self.remote_count
    }

    pub fn has_capacity(&self, placement: Placement, local_max: u32, remote_max: u32) -> bool {
        match placement {
            Placement::Local => self.local_count < local_max,
            Placement::Remote => self.remote_count < remote_max,
        }
    }

    pub fn record_dispatch(&mut self, job_id: BatchJobId, node_id: NodeId, placement: Placement) {
        self.running.insert(job_id, node_id);
        match placement {
            Placement::Local => self.local_count += 1,
            Placement::Remote => self.remote_count += 1,
        }
    }

    /// Removes and returns the node a completed/removed job belonged to.
    pub fn record_completion(&mut self, job_id: BatchJobId, placement: Placement) -> Option<NodeId> {
        let node_id = self.running.remove(&job_id)?;
        match placement {
            Placement::Local => self.local_count = self.local_count.saturating_sub(1),
            Placement::Remote => self.remote_count = self.remote_count.saturating_sub(1),
        }
        Some(node_id)
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    pub fn node_for(&self, job_id: BatchJobId) -> Option<NodeId> {
        self.running.get(&job_id).copied()
    }

    pub fn in_flight_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.running.values().copied()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
