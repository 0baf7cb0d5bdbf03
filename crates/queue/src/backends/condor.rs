//! Condor-style variant: writes a submit description per task and reads
//! job-state transitions from a shared, incrementally-scanned event log.
//! Grounded on `batch_job_condor.c`.
//!
//! Outputs are deliberately *not* declared via `transfer_output_files`;
//! an unproduced output would otherwise put the job on hold. The engine
//! checks output presence itself on completion (see
//! `flowctl-engine::completion`).

use crate::error::QueueError;
use crate::queue::{BatchQueue, WaitOutcome};
use crate::spec::JobSpec;
use async_trait::async_trait;
use flowctl_core::{BatchJobId, JobInfo};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

const WRAPPER_NAME: &str = "condor.sh";
const SUBMIT_NAME: &str = "condor.submit";

pub struct CondorQueue {
    work_dir: PathBuf,
    log_path: Mutex<PathBuf>,
    options: Mutex<HashMap<String, String>>,
    wrapper_written: Mutex<bool>,
    log_read_pos: Mutex<u64>,
    last_blacklist: Mutex<Option<String>>,
    submitted: Mutex<HashMap<BatchJobId, ()>>,
    /// After a "terminate" (event 5) line, the next line is a
    /// continuation naming the normal/abnormal outcome; this holds the
    /// job id while that second line is awaited.
    pending_terminate: Mutex<Option<BatchJobId>>,
}

impl CondorQueue {
    pub fn new(work_dir: PathBuf) -> Self {
        let log_path = work_dir.join("condor.log");
        Self {
            work_dir,
            log_path: Mutex::new(log_path),
            options: Mutex::new(HashMap::new()),
            wrapper_written: Mutex::new(false),
            log_read_pos: Mutex::new(0),
            last_blacklist: Mutex::new(None),
            submitted: Mutex::new(HashMap::new()),
            pending_terminate: Mutex::new(None),
        }
    }

    fn ensure_wrapper(&self) -> Result<(), QueueError> {
        let mut written = self.wrapper_written.lock();
        if *written {
            return Ok(());
        }
        std::fs::write(
            self.work_dir.join(WRAPPER_NAME),
            "#!/bin/sh\neval \"$@\"\n",
        )?;
        *written = true;
        Ok(())
    }

    /// Compiles the worker/node blocklist into a ClassAd `requirements`
    /// expression, caching the last expression to avoid rewriting
    /// identical submit descriptions back to back.
    fn blacklist_requirements(&self) -> Option<String> {
        let blocked = self.get_option("workers-blocked")?;
        let mut cached = self.last_blacklist.lock();
        if cached.as_deref() == Some(blocked.as_str()) {
            return Some(Self::expression_for(&blocked));
        }
        *cached = Some(blocked.clone());
        Some(Self::expression_for(&blocked))
    }

    fn expression_for(blocked: &str) -> String {
        blocked
            .split_whitespace()
            .map(|host| format!("(machine != \"{host}\")"))
            .collect::<Vec<_>>()
            .join(" && ")
    }

    fn autosize_line(&self, resources: &flowctl_core::ResourceRequest) -> String {
        if self.get_option("autosize").as_deref() == Some("yes") {
            let cores = resources.cores.unwrap_or(1);
            format!(
                "request_cpus = ifThenElse({cores} > TotalSlotCpus, {cores}, TotalSlotCpus)\n"
            )
        } else {
            format!(
                "request_cpus = {}\nrequest_memory = {}\nrequest_disk = {}\n",
                resources.cores.unwrap_or(1),
                resources.memory_mb.unwrap_or(1024),
                resources.disk_mb.unwrap_or(1024) * 1024,
            )
        }
    }

    fn write_submit_description(&self, spec: &JobSpec) -> Result<PathBuf, QueueError> {
        let submit_path = self.work_dir.join(SUBMIT_NAME);
        let mut body = String::new();
        body.push_str(&format!("executable = {WRAPPER_NAME}\n"));
        body.push_str(&format!("arguments = sh -c \"{}\"\n", spec.command.replace('"', "\\\"")));
        body.push_str(&format!("log = {}\n", self.log_path.lock().display()));

        if !spec.input_files.is_empty() {
            let transfer: Vec<String> = spec
                .input_files
                .iter()
                .map(|f| f.inner.as_deref().unwrap_or(&f.outer).to_string())
                .collect();
            body.push_str("should_transfer_files = YES\n");
            body.push_str(&format!("transfer_input_files = {}\n", transfer.join(",")));
        }
        body.push_str(&self.autosize_line(&spec.resources));
        if let Some(req) = self.blacklist_requirements() {
            body.push_str(&format!("requirements = {req}\n"));
        }
        body.push_str("queue\n");

        let mut file = std::fs::File::create(&submit_path)?;
        file.write_all(body.as_bytes())?;
        Ok(submit_path)
    }

    fn scan_log(&self) -> Result<Vec<(BatchJobId, JobInfo)>, QueueError> {
        let log_path = self.log_path.lock().clone();
        let Ok(mut file) = std::fs::File::open(&log_path) else {
            return Ok(Vec::new());
        };
        let mut pos = self.log_read_pos.lock();
        // Clearing EOF before each scan matters for implementations that
        // cache the EOF condition across appends by another process.
        file.seek(SeekFrom::Start(*pos))?;
        let mut new_text = String::new();
        file.read_to_string(&mut new_text)?;
        *pos += new_text.len() as u64;
        drop(pos);

        let mut completions = Vec::new();
        let mut pending = self.pending_terminate.lock();
        for line in new_text.lines() {
            if let Some(job_id) = pending.take() {
                if let Some(code) = parse_normal_termination(line) {
                    completions.push((job_id, JobInfo::success(code)));
                } else if let Some(signal) = parse_abnormal_termination(line) {
                    completions.push((job_id, JobInfo::signalled(signal)));
                }
                continue;
            }
            if let Some((event, job_id)) = parse_event_header(line) {
                match event {
                    9 => completions.push((job_id, JobInfo::signalled(9))), // evicted/removed
                    5 => *pending = Some(job_id),                           // terminate follows
                    _ => {}
                }
            }
        }
        Ok(completions)
    }
}

fn parse_event_header(line: &str) -> Option<(u32, BatchJobId)> {
    // "000 (123.000.000) Job submitted from host..." style header lines.
    let mut fields = line.split_whitespace();
    let event: u32 = fields.next()?.parse().ok()?;
    let cluster_field = fields.next()?;
    let id_str = cluster_field.trim_start_matches('(').split('.').next()?;
    let job_id: BatchJobId = id_str.parse().ok()?;
    Some((event, job_id))
}

fn parse_normal_termination(line: &str) -> Option<i32> {
    let marker = "Normal termination (return value ";
    let start = line.find(marker)? + marker.len();
    line[start..].split(')').next()?.trim().parse().ok()
}

fn parse_abnormal_termination(line: &str) -> Option<i32> {
    let marker = "Abnormal termination (signal ";
    let start = line.find(marker)? + marker.len();
    line[start..].split(')').next()?.trim().parse().ok()
}

#[async_trait]
impl BatchQueue for CondorQueue {
    async fn submit(&self, spec: &JobSpec) -> Result<BatchJobId, QueueError> {
        self.ensure_wrapper()?;
        let submit_path = self.write_submit_description(spec)?;

        let output = Command::new("condor_submit")
            .arg(&submit_path)
            .output()
            .await
            .map_err(|e| QueueError::SubmitFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(QueueError::SubmitFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let job_id = stdout
            .lines()
            .find_map(|line| {
                line.rsplit("cluster ")
                    .next()
                    .and_then(|s| s.trim_end_matches('.').parse().ok())
            })
            .ok_or_else(|| QueueError::SubmitFailed(format!("could not parse cluster id from {stdout:?}")))?;

        self.submitted.lock().insert(job_id, ());
        Ok(job_id)
    }

    async fn wait(&self, timeout: Duration) -> Result<WaitOutcome, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.submitted.lock().is_empty() {
                return Ok(WaitOutcome::None);
            }
            let completions = self.scan_log()?;
            for (job_id, info) in completions {
                if self.submitted.lock().remove(&job_id).is_some() {
                    return Ok(WaitOutcome::Completed(job_id, info));
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(WaitOutcome::None);
            }
            tokio::time::sleep(Duration::from_millis(200).min(timeout)).await;
        }
    }

    async fn remove(&self, job_id: BatchJobId) -> Result<(), QueueError> {
        self.submitted.lock().remove(&job_id);
        let _ = Command::new("condor_rm").arg(job_id.to_string()).output().await;
        Ok(())
    }

    fn set_option(&self, key: &str, value: &str) {
        self.options.lock().insert(key.to_string(), value.to_string());
    }

    fn get_option(&self, key: &str) -> Option<String> {
        self.options.lock().get(key).cloned()
    }

    fn set_logfile(&self, path: &std::path::Path) -> Result<(), QueueError> {
        *self.log_path.lock() = path.to_path_buf();
        Ok(())
    }

    /// The Condor family's event log survives an engine restart, so
    /// in-flight jobs can be re-adopted rather than reset to `Waiting`
    /// (journal recovery step 3).
    fn supports_feature(&self, name: &str) -> Option<String> {
        match name {
            "survives-engine-restart" => Some("yes".to_string()),
            "needs-sandbox-names" => Some("yes".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "condor_tests.rs"]
mod tests;
