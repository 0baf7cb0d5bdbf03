//! Error kinds produced by `BatchQueue` implementations.

use flowctl_core::BatchJobId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("submission rejected: {0}")]
    SubmitFailed(String),

    #[error("no such job: {0}")]
    JobNotFound(BatchJobId),

    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    /// Distinguishes a synthetic "no heartbeat for 120s" cluster failure
    /// from a real terminating signal. The original C implementation
    /// reports both as `exit_signal = 1`, leaving callers unable to tell
    /// them apart (`spec §9` open question); this reimplementation keeps
    /// them as separate error kinds instead.
    #[error("heartbeat lost for job {0} (no status update within the timeout)")]
    HeartbeatLost(BatchJobId),

    #[error("unknown batch queue type: {0:?}")]
    UnknownKind(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
