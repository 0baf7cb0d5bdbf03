//! Backend factory: the one place that maps a [`BatchQueueKind`] tag onto
//! a concrete [`BatchQueue`], mirroring `batch_queue_create()` /
//! `batch_queue_modules[]` in the original.

use crate::backends::{cloud::CloudQueue, cluster::ClusterQueue, condor::CondorQueue, distributed::DistributedQueue, dryrun::DryRunQueue, local::LocalQueue, noop::NoOpQueue};
use crate::error::QueueError;
use crate::kind::BatchQueueKind;
use crate::queue::BatchQueue;
use std::path::Path;

/// Instantiates the backend named by `kind`. `work_dir` is where a
/// backend that needs on-disk scratch state (wrapper scripts, status
/// files, a spool directory) keeps it; backends that need none ignore it.
pub fn create(kind: BatchQueueKind, work_dir: &Path) -> Result<Box<dyn BatchQueue>, QueueError> {
    Ok(match kind {
        BatchQueueKind::Local => Box::new(LocalQueue::new()),
        BatchQueueKind::Cluster(system) => Box::new(ClusterQueue::new(system, work_dir.to_path_buf())),
        BatchQueueKind::Condor => Box::new(CondorQueue::new(work_dir.to_path_buf())),
        BatchQueueKind::Cloud => Box::new(CloudQueue::new()),
        BatchQueueKind::Distributed => Box::new(DistributedQueue::new(work_dir.to_path_buf())),
        BatchQueueKind::DryRun => Box::new(DryRunQueue::new()),
        BatchQueueKind::NoOp => Box::new(NoOpQueue::new()),
    })
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
