//! Per-task cloud-instance backend: provisions one VM per job (or reuses
//! a warm pool up to an idle timeout), ships inputs over `scp`, runs the
//! command over `ssh`, and tears the instance down on completion.
//!
//! Instance lifecycle is delegated to configurable provisioning/teardown
//! commands rather than a cloud SDK, the same way the cluster backend
//! shells out to `qsub`/`sbatch` rather than linking a scheduler client
//! library. Renaming an output back to an outer name the same way the
//! local input was renamed inward is not supported here: a cloud
//! instance has no shared filesystem to alias, so `inner` names are
//! taken literally as remote paths and never round-tripped.

use crate::error::QueueError;
use crate::queue::{BatchQueue, WaitOutcome};
use crate::spec::JobSpec;
use async_trait::async_trait;
use flowctl_core::{BatchJobId, JobInfo};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

type CompletionRx = tokio::sync::Mutex<mpsc::UnboundedReceiver<(BatchJobId, JobInfo)>>;

struct Instance {
    address: String,
    idle_since: Option<tokio::time::Instant>,
}

/// Bounds how many `scp`/`ssh` transfers run at once so a large fan-out
/// doesn't saturate the control connection to the provisioning API.
const MAX_CONCURRENT_TRANSFERS: usize = 8;

pub struct CloudQueue {
    options: Mutex<HashMap<String, String>>,
    next_id: AtomicI64,
    handles: Mutex<HashMap<BatchJobId, JoinHandle<()>>>,
    completion_tx: mpsc::UnboundedSender<(BatchJobId, JobInfo)>,
    completion_rx: CompletionRx,
    transfer_semaphore: Arc<Semaphore>,
    /// Instances kept warm for reuse within `idle-timeout-s`, instead of
    /// provisioning and tearing down a fresh VM for every job.
    idle_pool: Arc<Mutex<Vec<Instance>>>,
}

impl CloudQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            options: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            handles: Mutex::new(HashMap::new()),
            completion_tx: tx,
            completion_rx: tokio::sync::Mutex::new(rx),
            transfer_semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_TRANSFERS)),
            idle_pool: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn idle_timeout(&self) -> Duration {
        self.get_option("idle-timeout-s")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_default()
    }

    fn take_warm_instance(&self) -> Option<Instance> {
        let timeout = self.idle_timeout();
        if timeout.is_zero() {
            return None;
        }
        let mut pool = self.idle_pool.lock();
        while let Some(instance) = pool.pop() {
            let stale = instance
                .idle_since
                .is_some_and(|since| since.elapsed() >= timeout);
            if !stale {
                return Some(instance);
            }
        }
        None
    }

    async fn provision(&self) -> Result<Instance, QueueError> {
        let provision_cmd = self
            .get_option("provision-command")
            .ok_or(QueueError::Unsupported("provision-command"))?;
        let output = Command::new("sh")
            .arg("-c")
            .arg(&provision_cmd)
            .output()
            .await
            .map_err(|e| QueueError::SubmitFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(QueueError::SubmitFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        let address = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if address.is_empty() {
            return Err(QueueError::SubmitFailed(
                "provision command produced no address".to_string(),
            ));
        }
        Ok(Instance { address, idle_since: None })
    }

}

impl Default for CloudQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchQueue for CloudQueue {
    async fn submit(&self, spec: &JobSpec) -> Result<BatchJobId, QueueError> {
        let job_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let instance = match self.take_warm_instance() {
            Some(instance) => instance,
            None => self.provision().await?,
        };

        let spec = spec.clone();
        let tx = self.completion_tx.clone();
        let idle_timeout = self.idle_timeout();
        let terminate_cmd = self.get_option("terminate-command");
        let transfer_semaphore = self.transfer_semaphore.clone();
        let idle_pool = self.idle_pool.clone();

        let handle = tokio::spawn(async move {
            let info = run_job(&spec, &instance, &transfer_semaphore).await;
            if idle_timeout.is_zero() {
                if let Some(terminate_cmd) = terminate_cmd {
                    let _ = Command::new("sh")
                        .arg("-c")
                        .arg(terminate_cmd.replace("{address}", &instance.address))
                        .output()
                        .await;
                }
            } else {
                let mut instance = instance;
                instance.idle_since = Some(tokio::time::Instant::now());
                idle_pool.lock().push(instance);
            }
            let _ = tx.send((job_id, info));
        });
        self.handles.lock().insert(job_id, handle);
        Ok(job_id)
    }

    async fn wait(&self, timeout: Duration) -> Result<WaitOutcome, QueueError> {
        let mut rx = self.completion_rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some((job_id, info))) => {
                self.handles.lock().remove(&job_id);
                Ok(WaitOutcome::Completed(job_id, info))
            }
            Ok(None) | Err(_) => Ok(WaitOutcome::None),
        }
    }

    async fn remove(&self, job_id: BatchJobId) -> Result<(), QueueError> {
        if let Some(handle) = self.handles.lock().remove(&job_id) {
            handle.abort();
        }
        Ok(())
    }

    fn set_option(&self, key: &str, value: &str) {
        self.options.lock().insert(key.to_string(), value.to_string());
    }

    fn get_option(&self, key: &str) -> Option<String> {
        self.options.lock().get(key).cloned()
    }
}

async fn run_job(spec: &JobSpec, instance: &Instance, transfer_semaphore: &Semaphore) -> JobInfo {
    {
        let _permit = transfer_semaphore.acquire().await.ok();
        for file in &spec.input_files {
            let remote = file.inner.as_deref().unwrap_or(&file.outer);
            let _ = Command::new("scp")
                .arg(file.outer.as_str())
                .arg(format!("{}:{remote}", instance.address))
                .output()
                .await;
        }
    }

    let status = Command::new("ssh").arg(&instance.address).arg(&spec.command).status().await;

    {
        let _permit = transfer_semaphore.acquire().await.ok();
        for file in &spec.output_files {
            let remote = file.inner.as_deref().unwrap_or(&file.outer);
            let _ = Command::new("scp")
                .arg(format!("{}:{remote}", instance.address))
                .arg(file.outer.as_str())
                .output()
                .await;
        }
    }

    match status {
        Ok(exit) => JobInfo::success(exit.code().unwrap_or(-1)),
        Err(_) => JobInfo::signalled(9),
    }
}

#[cfg(test)]
#[path = "cloud_tests.rs"]
mod tests;
