//! The uniform submit/wait/cancel contract over execution backends.

use crate::error::QueueError;
use crate::spec::JobSpec;
use async_trait::async_trait;
use flowctl_core::{BatchJobId, JobInfo};
use std::path::Path;
use std::time::Duration;

/// The result of one `wait` call. `None` means nothing completed within
/// the timeout; `Interrupted` means a signal (or other external event)
/// cut the wait short before the timeout elapsed.
#[derive(Debug)]
pub enum WaitOutcome {
    Completed(BatchJobId, JobInfo),
    None,
    Interrupted,
}

/// Hides the submit/wait/cancel differences between execution backends
/// behind one contract. Each variant (local-process, cluster
/// submit-and-poll, Condor-style, cloud-per-task, distributed queue,
/// dry-run, no-op) implements this trait; the engine holds a
/// `Box<dyn BatchQueue>` for its local backend and one for its remote
/// backend and never inspects which concrete type it has.
#[async_trait]
pub trait BatchQueue: Send + Sync {
    /// Submit one job; returns its backend-assigned id (`>= 1`) or an
    /// error. The engine retries `SubmitFailed` with exponential backoff
    /// (see `flowctl-engine::scheduler`); other error kinds are fatal
    /// to the submission attempt but not to the workflow.
    async fn submit(&self, spec: &JobSpec) -> Result<BatchJobId, QueueError>;

    /// Block up to `timeout` for the next completion.
    async fn wait(&self, timeout: Duration) -> Result<WaitOutcome, QueueError>;

    /// Request cancellation; the cancellation surfaces as a completion
    /// through a later `wait` call, not synchronously here.
    async fn remove(&self, job_id: BatchJobId) -> Result<(), QueueError>;

    /// Free-form string options interpreted by the backend (submit
    /// flags, a project name, the worker blocklist, ...).
    fn set_option(&self, key: &str, value: &str);

    fn get_option(&self, key: &str) -> Option<String>;

    /// Some backends (Condor, the distributed queue) need a persistent
    /// event log; others ignore this.
    fn set_logfile(&self, _path: &Path) -> Result<(), QueueError> {
        Err(QueueError::Unsupported("set_logfile"))
    }

    /// Query a named capability (e.g. `"survives-engine-restart"` for
    /// the Condor family). Generalizes the original's per-type feature
    /// bitmask into a queried string->string map.
    fn supports_feature(&self, _name: &str) -> Option<String> {
        None
    }

    // --- filesystem shims; default to unsupported, overridden only by
    // backends whose execution environment has its own namespace. ---

    async fn fs_chdir(&self, _path: &str) -> Result<(), QueueError> {
        Err(QueueError::Unsupported("fs_chdir"))
    }

    async fn fs_mkdir(&self, _path: &str) -> Result<(), QueueError> {
        Err(QueueError::Unsupported("fs_mkdir"))
    }

    async fn fs_put(&self, _local: &str, _remote: &str) -> Result<(), QueueError> {
        Err(QueueError::Unsupported("fs_put"))
    }

    async fn fs_rename(&self, _from: &str, _to: &str) -> Result<(), QueueError> {
        Err(QueueError::Unsupported("fs_rename"))
    }

    async fn fs_stat(&self, _path: &str) -> Result<(), QueueError> {
        Err(QueueError::Unsupported("fs_stat"))
    }

    async fn fs_unlink(&self, _path: &str) -> Result<(), QueueError> {
        Err(QueueError::Unsupported("fs_unlink"))
    }
}
