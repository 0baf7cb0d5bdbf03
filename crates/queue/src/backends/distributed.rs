//! Delegates execution to an external work-stealing manager process via a
//! spool directory: one JSON task file per submission, one JSON result
//! file per completion. The manager and its workers are out of process;
//! this backend only speaks the spool protocol, the same arm's-length
//! relationship the cluster backend has with `qsub`.
//!
//! Each input/output is tagged `cache` or `noncache`: a `cache` file is
//! fetched once by a worker and reused across tasks that name the same
//! outer name, while `noncache` is re-transferred per task. Tagging
//! piggybacks on `JobSpec::env`, keyed `"cache:{outer}" = "yes"`, rather
//! than widening `FileRef` for a property only this backend understands.

use crate::error::QueueError;
use crate::queue::{BatchQueue, WaitOutcome};
use crate::spec::JobSpec;
use async_trait::async_trait;
use flowctl_core::{BatchJobId, FileRef, JobInfo};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct TaskFile {
    id: BatchJobId,
    command: String,
    inputs: Vec<TaggedFile>,
    outputs: Vec<TaggedFile>,
    env: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TaggedFile {
    outer: String,
    inner: Option<String>,
    cached: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultFile {
    id: BatchJobId,
    exit_code: Option<i32>,
    exit_signal: Option<i32>,
    stdout: String,
}

pub struct DistributedQueue {
    spool_dir: PathBuf,
    options: Mutex<HashMap<String, String>>,
    next_id: AtomicI64,
    pending: Mutex<HashMap<BatchJobId, ()>>,
}

impl DistributedQueue {
    pub fn new(spool_dir: PathBuf) -> Self {
        Self {
            spool_dir,
            options: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn tasks_dir(&self) -> PathBuf {
        self.spool_dir.join("tasks")
    }

    fn results_dir(&self) -> PathBuf {
        self.spool_dir.join("results")
    }

    fn cancel_dir(&self) -> PathBuf {
        self.spool_dir.join("cancel")
    }

    fn ensure_dirs(&self) -> Result<(), QueueError> {
        for dir in [self.tasks_dir(), self.results_dir(), self.cancel_dir()] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    fn tag_files(files: &[FileRef], env: &indexmap::IndexMap<String, String>) -> Vec<TaggedFile> {
        files
            .iter()
            .map(|f| {
                let cached = env.get(&format!("cache:{}", f.outer)).map(String::as_str) == Some("yes");
                TaggedFile {
                    outer: f.outer.to_string(),
                    inner: f.inner.as_ref().map(|s| s.to_string()),
                    cached,
                }
            })
            .collect()
    }

    fn poll_results(&self) -> Result<Vec<ResultFile>, QueueError> {
        let mut results = Vec::new();
        let dir = self.results_dir();
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Ok(results);
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            let result: ResultFile = serde_json::from_str(&contents)
                .map_err(|e| QueueError::SubmitFailed(format!("malformed result file {path:?}: {e}")))?;
            std::fs::remove_file(&path)?;
            results.push(result);
        }
        Ok(results)
    }
}

#[async_trait]
impl BatchQueue for DistributedQueue {
    async fn submit(&self, spec: &JobSpec) -> Result<BatchJobId, QueueError> {
        self.ensure_dirs()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let task = TaskFile {
            id,
            command: spec.command.clone(),
            inputs: Self::tag_files(&spec.input_files, &spec.env),
            outputs: Self::tag_files(&spec.output_files, &spec.env),
            env: spec.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        };
        let body = serde_json::to_string_pretty(&task)
            .map_err(|e| QueueError::SubmitFailed(e.to_string()))?;
        std::fs::write(self.tasks_dir().join(format!("{id}.json")), body)?;
        self.pending.lock().insert(id, ());
        Ok(id)
    }

    async fn wait(&self, timeout: Duration) -> Result<WaitOutcome, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.pending.lock().is_empty() {
                return Ok(WaitOutcome::None);
            }
            for result in self.poll_results()? {
                if self.pending.lock().remove(&result.id).is_none() {
                    continue;
                }
                if result.exit_code != Some(0) {
                    // stdout echo-on-error: the manager's captured output
                    // is otherwise invisible once the spool file is gone.
                    tracing::warn!(job_id = result.id, stdout = %result.stdout, "task failed");
                }
                let info = match (result.exit_code, result.exit_signal) {
                    (Some(code), _) => JobInfo::success(code),
                    (None, Some(signal)) => JobInfo::signalled(signal),
                    (None, None) => JobInfo::signalled(9),
                };
                return Ok(WaitOutcome::Completed(result.id, info));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(WaitOutcome::None);
            }
            tokio::time::sleep(Duration::from_millis(200).min(timeout)).await;
        }
    }

    async fn remove(&self, job_id: BatchJobId) -> Result<(), QueueError> {
        self.pending.lock().remove(&job_id);
        self.ensure_dirs()?;
        std::fs::write(self.cancel_dir().join(format!("{job_id}")), "")?;
        let _ = std::fs::remove_file(self.tasks_dir().join(format!("{job_id}.json")));
        Ok(())
    }

    fn set_option(&self, key: &str, value: &str) {
        self.options.lock().insert(key.to_string(), value.to_string());
    }

    fn get_option(&self, key: &str) -> Option<String> {
        self.options.lock().get(key).cloned()
    }

    /// Task file names are dropped into a shared spool directory and must
    /// be namespace-legal, slash-free names — the engine's sandbox
    /// translator runs ahead of submission for this backend.
    fn supports_feature(&self, name: &str) -> Option<String> {
        match name {
            "needs-sandbox-names" => Some("yes".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "distributed_tests.rs"]
mod tests;
