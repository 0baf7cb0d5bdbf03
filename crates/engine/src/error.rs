//! Error kinds produced by the DAG engine.

use flowctl_core::{CoreError, NodeId};
use flowctl_journal::JournalError;
use flowctl_queue::QueueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Fatal: an inner sandbox name collides with a different outer name
    /// after exhausting both rewrite alternatives (spec §4.2 Sandboxing,
    /// §9 open question — the two-rewrite limit is preserved as-is).
    #[error("sandbox name collision: {outer:?} and {other_outer:?} both resolve to {inner:?}")]
    SandboxCollision { outer: String, other_outer: String, inner: String },

    #[error("node {0} is not a nested-workflow node")]
    NotAWorkflowNode(NodeId),

    /// Set once any node is permanently `Failed`; the run finishes its
    /// in-flight jobs, then returns this so the CLI collaborator can choose
    /// a non-zero exit code (spec §6 "Signal exit codes").
    #[error("workflow did not complete successfully")]
    WorkflowFailed,
}
