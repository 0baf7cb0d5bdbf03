//! A do-nothing backend for testing the engine's dispatch/journal paths
//! without involving process execution at all: every submission reports
//! success on the next `wait`.

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
pub struct NoOpQueue {
    next_id: AtomicI64,
    options: Mutex<HashMap<String, String>>,
    pending: Mutex<VecDeque<BatchJobId>>,
}

impl NoOpQueue {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }
}

#[async_trait]
impl BatchQueue for NoOpQueue {
    async fn submit(&self, _spec: &JobSpec) -> Result<BatchJobId, QueueError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().push_back(id);
        Ok(id)
    }

    async fn wait(&self, _timeout: Duration) -> Result<WaitOutcome, QueueError> {
        match self.pending.lock().pop_front() {
            Some(id) => Ok(WaitOutcome::Completed(id, JobInfo::success(0))),
            None => Ok(WaitOutcome::None),
        }
    }

    async fn remove(&self, job_id: BatchJobId) -> Result<(), QueueError> {
        self.pending.lock().retain(|id| *id != job_id);
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
#[path = "noop_tests.rs"]
mod tests;
