//! Error kinds produced by the pool controller.

use flowctl_queue::QueueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid manager-name pattern {0:?}: {1}")]
    BadPattern(String, regex::Error),

    #[error("directory service query failed: {0}")]
    DirectoryQuery(String),

    #[error("directory service publish failed: {0}")]
    DirectoryPublish(String),

    /// No manager matching the configured pattern has been seen for
    /// longer than the configured timeout; the controller exits cleanly
    /// rather than submitting workers forever into the void.
    #[error("no manager matching {0:?} seen in over {1:?}")]
    ManagerTimeout(String, std::time::Duration),
}
