//! In-process forking executor: fork+exec each job as a child process and
//! reap it through the engine's own `wait` path.

use crate::error::QueueError;
use crate::queue::{BatchQueue, WaitOutcome};
use crate::spec::JobSpec;
use async_trait::async_trait;
use flowctl_core::{BatchJobId, JobInfo, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;

type SharedChild = Arc<tokio::sync::Mutex<tokio::process::Child>>;

/// Mirrors `batch_job_local.c`: `fork`/`exec` via the login shell, one
/// child process per job, reaped through `process_wait`-equivalent
/// polling — here, a background task per child feeding a shared
/// completion channel so `wait` can `select!` across all of them.
pub struct LocalQueue {
    next_id: AtomicI64,
    options: Mutex<HashMap<String, String>>,
    running: Arc<Mutex<HashMap<BatchJobId, SharedChild>>>,
    completions_tx: mpsc::UnboundedSender<(BatchJobId, JobInfo)>,
    completions_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<(BatchJobId, JobInfo)>>,
}

impl LocalQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            next_id: AtomicI64::new(1),
            options: Mutex::new(HashMap::new()),
            running: Arc::new(Mutex::new(HashMap::new())),
            completions_tx: tx,
            completions_rx: tokio::sync::Mutex::new(rx),
        }
    }
}

impl Default for LocalQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchQueue for LocalQueue {
    async fn submit(&self, spec: &JobSpec) -> Result<BatchJobId, QueueError> {
        let mut command = Command::new("/bin/sh");
        command.arg("-c").arg(&spec.command);
        for (k, v) in &spec.env {
            command.env(k, v);
        }
        if let Some(extra) = self.get_option("batch-options") {
            command.env("BATCH_OPTIONS", extra);
        }
        command.stdin(Stdio::null());

        let child = command
            .spawn()
            .map_err(|e| QueueError::SubmitFailed(e.to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let submitted_at = SystemClock.epoch_ms();
        let child = Arc::new(tokio::sync::Mutex::new(child));
        self.running.lock().insert(id, Arc::clone(&child));

        let running = Arc::clone(&self.running);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = child.lock().await.wait().await;
            running.lock().remove(&id);

            let mut info = JobInfo {
                submitted_epoch_ms: Some(submitted_at),
                finished_epoch_ms: Some(SystemClock.epoch_ms()),
                ..Default::default()
            };
            match result {
                Ok(exit_status) => {
                    #[cfg(unix)]
                    {
                        use std::os::unix::process::ExitStatusExt;
                        if let Some(code) = exit_status.code() {
                            info.exited_normally = true;
                            info.exit_code = Some(code);
                        } else if let Some(signal) = exit_status.signal() {
                            info.exited_normally = false;
                            info.exit_signal = Some(signal);
                        }
                    }
                    #[cfg(not(unix))]
                    {
                        info.exited_normally = true;
                        info.exit_code = exit_status.code();
                    }
                }
                Err(_) => {
                    info.exited_normally = false;
                    info.exit_signal = Some(-1);
                }
            }
            let _ = tx.send((id, info));
        });

        Ok(id)
    }

    async fn wait(&self, timeout: Duration) -> Result<WaitOutcome, QueueError> {
        let mut rx = self.completions_rx.lock().await;
        if let Ok((id, info)) = rx.try_recv() {
            return Ok(WaitOutcome::Completed(id, info));
        }
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some((id, info))) => Ok(WaitOutcome::Completed(id, info)),
            Ok(None) => Ok(WaitOutcome::None),
            Err(_elapsed) => Ok(WaitOutcome::None),
        }
    }

    async fn remove(&self, job_id: BatchJobId) -> Result<(), QueueError> {
        if let Some(child) = self.running.lock().remove(&job_id) {
            let _ = child.lock().await.start_kill();
        }
        Ok(())
    }

    fn set_option(&self, key: &str, value: &str) {
        self.options.lock().insert(key.to_string(), value.to_string());
    }

    fn get_option(&self, key: &str) -> Option<String> {
        self.options.lock().get(key).cloned()
    }

    fn supports_feature(&self, name: &str) -> Option<String> {
        match name {
            "local-job-queue" => Some("yes".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
