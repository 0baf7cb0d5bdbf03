//! A scriptable in-memory [`BatchQueue`] double for engine/pool unit
//! tests, in the spirit of the teacher's `FakeAgentAdapter`: tests queue
//! up canned completions and assert on what was submitted, without any
//! process or filesystem involvement.

use crate::error::QueueError;
use crate::queue::{BatchQueue, WaitOutcome};
use crate::spec::JobSpec;
use async_trait::async_trait;
use flowctl_core::{BatchJobId, JobInfo};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct FakeQueue {
    next_id: AtomicI64,
    options: Mutex<HashMap<String, String>>,
    submitted: Mutex<Vec<JobSpec>>,
    removed: Mutex<Vec<BatchJobId>>,
    /// Completions to hand back, in order, one per `wait()` call. Tests
    /// populate this directly via [`FakeQueue::push_completion`].
    scripted: Mutex<VecDeque<ScriptedWait>>,
    /// When set, every `submit` fails with this instead of succeeding.
    fail_submissions: Mutex<Option<String>>,
}

enum ScriptedWait {
    Completed(BatchJobId, JobInfo),
    HeartbeatLost(BatchJobId),
}

impl FakeQueue {
    pub fn new() -> Self {
        Self { next_id: AtomicI64::new(1), ..Default::default() }
    }

    pub fn push_completion(&self, job_id: BatchJobId, info: JobInfo) {
        self.scripted.lock().push_back(ScriptedWait::Completed(job_id, info));
    }

    /// Scripts a `wait()` call to return `QueueError::HeartbeatLost`, as
    /// `ClusterQueue` does for a job with no status update within the
    /// timeout.
    pub fn push_heartbeat_lost(&self, job_id: BatchJobId) {
        self.scripted.lock().push_back(ScriptedWait::HeartbeatLost(job_id));
    }

    pub fn fail_next_submissions(&self, message: impl Into<String>) {
        *self.fail_submissions.lock() = Some(message.into());
    }

    pub fn submitted(&self) -> Vec<JobSpec> {
        self.submitted.lock().clone()
    }

    pub fn removed(&self) -> Vec<BatchJobId> {
        self.removed.lock().clone()
    }
}

#[async_trait]
impl BatchQueue for FakeQueue {
    async fn submit(&self, spec: &JobSpec) -> Result<BatchJobId, QueueError> {
        if let Some(message) = self.fail_submissions.lock().clone() {
            return Err(QueueError::SubmitFailed(message));
        }
        self.submitted.lock().push(spec.clone());
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn wait(&self, _timeout: Duration) -> Result<WaitOutcome, QueueError> {
        match self.scripted.lock().pop_front() {
            Some(ScriptedWait::Completed(id, info)) => Ok(WaitOutcome::Completed(id, info)),
            Some(ScriptedWait::HeartbeatLost(id)) => Err(QueueError::HeartbeatLost(id)),
            None => Ok(WaitOutcome::None),
        }
    }

    async fn remove(&self, job_id: BatchJobId) -> Result<(), QueueError> {
        self.removed.lock().push(job_id);
        Ok(())
    }

    fn set_option(&self, key: &str, value: &str) {
        self.options.lock().insert(key.to_string(), value.to_string());
    }

    fn get_option(&self, key: &str) -> Option<String> {
        self.options.lock().get(key).cloned()
    }
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
