//! The batch-queue type registry: a closed-at-build-time, open-in-principle
//! set of backend tags, mirroring `BATCH_QUEUE_TYPE_*` /
//! `batch_queue_modules[]` in the original.

use crate::error::QueueError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterSystem {
    Sge,
    Pbs,
    Torque,
    Lsf,
    Slurm,
    Moab,
    /// A site-defined cluster driven entirely by the `BATCH_QUEUE_CLUSTER_*`
    /// style options (submit/remove commands, submit-options, jobname var).
    Generic,
}

flowctl_core::simple_display! {
    ClusterSystem {
        Sge => "sge",
        Pbs => "pbs",
        Torque => "torque",
        Lsf => "lsf",
        Slurm => "slurm",
        Moab => "moab",
        Generic => "cluster",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchQueueKind {
    Local,
    Cluster(ClusterSystem),
    Condor,
    Cloud,
    Distributed,
    DryRun,
    NoOp,
}

impl BatchQueueKind {
    pub const fn tag(self) -> &'static str {
        match self {
            BatchQueueKind::Local => "local",
            BatchQueueKind::Cluster(ClusterSystem::Sge) => "sge",
            BatchQueueKind::Cluster(ClusterSystem::Pbs) => "pbs",
            BatchQueueKind::Cluster(ClusterSystem::Torque) => "torque",
            BatchQueueKind::Cluster(ClusterSystem::Lsf) => "lsf",
            BatchQueueKind::Cluster(ClusterSystem::Slurm) => "slurm",
            BatchQueueKind::Cluster(ClusterSystem::Moab) => "moab",
            BatchQueueKind::Cluster(ClusterSystem::Generic) => "cluster",
            BatchQueueKind::Condor => "condor",
            BatchQueueKind::Cloud => "cloud",
            BatchQueueKind::Distributed => "wq",
            BatchQueueKind::DryRun => "dryrun",
            BatchQueueKind::NoOp => "noop",
        }
    }

    pub fn all() -> &'static [BatchQueueKind] {
        use ClusterSystem::*;
        &[
            BatchQueueKind::Local,
            BatchQueueKind::Cluster(Sge),
            BatchQueueKind::Cluster(Pbs),
            BatchQueueKind::Cluster(Torque),
            BatchQueueKind::Cluster(Lsf),
            BatchQueueKind::Cluster(Slurm),
            BatchQueueKind::Cluster(Moab),
            BatchQueueKind::Cluster(Generic),
            BatchQueueKind::Condor,
            BatchQueueKind::Cloud,
            BatchQueueKind::Distributed,
            BatchQueueKind::DryRun,
            BatchQueueKind::NoOp,
        ]
    }
}

impl std::fmt::Display for BatchQueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for BatchQueueKind {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ClusterSystem::*;
        Ok(match s {
            "local" => BatchQueueKind::Local,
            "sge" => BatchQueueKind::Cluster(Sge),
            "pbs" => BatchQueueKind::Cluster(Pbs),
            "torque" => BatchQueueKind::Cluster(Torque),
            "lsf" => BatchQueueKind::Cluster(Lsf),
            "slurm" => BatchQueueKind::Cluster(Slurm),
            "moab" => BatchQueueKind::Cluster(Moab),
            "cluster" => BatchQueueKind::Cluster(Generic),
            "condor" => BatchQueueKind::Condor,
            "cloud" => BatchQueueKind::Cloud,
            "wq" | "distributed" => BatchQueueKind::Distributed,
            "dryrun" => BatchQueueKind::DryRun,
            "noop" => BatchQueueKind::NoOp,
            other => return Err(QueueError::UnknownKind(other.to_string())),
        })
    }
}

#[cfg(test)]
#[path = "kind_tests.rs"]
mod tests;
