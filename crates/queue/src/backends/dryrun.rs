//! Journals the commands it would run instead of executing them.

use crate::error::QueueError;
use crate::queue::{BatchQueue, WaitOutcome};
use crate::spec::JobSpec;
use async_trait::async_trait;
use flowctl_core::{BatchJobId, JobInfo, SystemClock};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Appends each submitted command to a shell script (`<name>.dryrun.sh` by
/// the CLI collaborator's naming convention) and immediately reports
/// success, so a workflow can be validated end to end without running
/// anything.
pub struct DryRunQueue {
    next_id: AtomicI64,
    options: Mutex<HashMap<String, String>>,
    script_path: Mutex<Option<PathBuf>>,
    pending: Mutex<VecDeque<(BatchJobId, JobInfo)>>,
}

impl DryRunQueue {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            options: Mutex::new(HashMap::new()),
            script_path: Mutex::new(None),
            pending: Mutex::new(VecDeque::new()),
        }
    }
}

impl Default for DryRunQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchQueue for DryRunQueue {
    async fn submit(&self, spec: &JobSpec) -> Result<BatchJobId, QueueError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        if let Some(path) = self.script_path.lock().as_ref() {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            writeln!(file, "# job {id}")?;
            writeln!(file, "{}", spec.command)?;
        }

        self.pending.lock().push_back((
            id,
            JobInfo {
                submitted_epoch_ms: Some(SystemClock.epoch_ms()),
                finished_epoch_ms: Some(SystemClock.epoch_ms()),
                ..JobInfo::success(0)
            },
        ));
        Ok(id)
    }

    async fn wait(&self, _timeout: Duration) -> Result<WaitOutcome, QueueError> {
        match self.pending.lock().pop_front() {
            Some((id, info)) => Ok(WaitOutcome::Completed(id, info)),
            None => Ok(WaitOutcome::None),
        }
    }

    async fn remove(&self, job_id: BatchJobId) -> Result<(), QueueError> {
        self.pending.lock().retain(|(id, _)| *id != job_id);
        Ok(())
    }

    fn set_option(&self, key: &str, value: &str) {
        if key == "dryrun-script" {
            *self.script_path.lock() = Some(PathBuf::from(value));
        }
        self.options.lock().insert(key.to_string(), value.to_string());
    }

    fn get_option(&self, key: &str) -> Option<String> {
        self.options.lock().get(key).cloned()
    }
}

#[cfg(test)]
#[path = "dryrun_tests.rs"]
mod tests;
