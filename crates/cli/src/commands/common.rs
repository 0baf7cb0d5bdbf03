//! Shared plumbing for the `run`/`check`/`clean`/`recover` subcommands:
//! parsing the common workflow arguments into a `Config`, instantiating
//! the local/remote queues, and building the `DagEngine` (which performs
//! startup recovery as a side effect of construction, per
//! `DagEngine::new`).

use crate::error::CliError;
use crate::workflow::{self, JsonWorkflowLoader};
use clap::Args;
use flowctl_core::SystemClock;
use flowctl_engine::{default_journal_path, AbortFlag, Config, DagEngine, RecoveryOutcome};
use flowctl_queue::BatchQueue;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct WorkflowArgs {
    /// Path to the workflow file, as emitted by the workflow-DSL parser
    pub workflow: PathBuf,

    /// Path to the journal file (default: `<workflow>.flowctl.journal`)
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Concurrency cap for LOCAL-tagged nodes (default: number of CPUs)
    #[arg(long)]
    pub local_jobs: Option<u32>,

    /// Concurrency cap for everything else (default depends on backend)
    #[arg(long)]
    pub remote_jobs: Option<u32>,

    /// Batch backend: local, sge, pbs, torque, lsf, slurm, moab, cluster,
    /// condor, cloud, wq, dryrun, noop
    #[arg(long, default_value = "local")]
    pub batch_type: String,

    /// Extra flags appended to every backend submission (overrides
    /// `BATCH_OPTIONS`)
    #[arg(long)]
    pub batch_options: Option<String>,

    /// Disable retry-on-failure entirely
    #[arg(long)]
    pub no_retry: bool,

    /// Maximum retries per node before it is marked permanently Failed
    #[arg(long, default_value_t = 0)]
    pub retry_max: u32,

    /// Per-submission backoff budget before a node is marked Failed
    #[arg(long)]
    pub submit_timeout_s: Option<u64>,

    /// Leave sandbox symlinks in place on exit instead of cleaning them up
    #[arg(long)]
    pub preserve_symlinks: bool,
}

impl WorkflowArgs {
    fn journal_path(&self) -> PathBuf {
        self.journal.clone().unwrap_or_else(|| default_journal_path(&self.workflow))
    }

    fn build_config(&self, batch_kind: flowctl_queue::BatchQueueKind) -> Config {
        let mut config = Config::new(
            self.local_jobs.unwrap_or_else(Config::default_local_jobs_max),
            self.remote_jobs.unwrap_or_else(|| Config::default_remote_jobs_max(batch_kind)),
        )
        .with_env_overrides();
        config.retry_enabled = !self.no_retry;
        config.retry_max = self.retry_max;
        config.preserve_symlinks = self.preserve_symlinks;
        if let Some(timeout) = self.submit_timeout_s {
            config.submit_timeout = std::time::Duration::from_secs(timeout);
        }
        // A CLI-supplied value wins over the environment variable
        // `with_env_overrides` already folded in.
        if self.batch_options.is_some() {
            config.batch_options = self.batch_options.clone();
        }
        config
    }
}

/// Builds a ready-to-run engine, including startup recovery. The local
/// queue is always the in-process forking executor (spec §4.1: "an
/// in-process forking executor"); `--batch-type` only selects the remote
/// queue, matching `LOCAL`-tagged nodes always running beside the engine
/// regardless of which remote backend a workflow otherwise targets.
pub fn build_engine(args: &WorkflowArgs) -> Result<(DagEngine<SystemClock>, RecoveryOutcome), CliError> {
    let dag = workflow::load_dag(&args.workflow)?;
    let batch_kind = flowctl_queue::BatchQueueKind::from_str(&args.batch_type)
        .map_err(flowctl_engine::EngineError::Queue)?;
    let work_dir = std::env::current_dir()?;
    let local_queue: Arc<dyn BatchQueue> =
        Arc::from(flowctl_queue::create(flowctl_queue::BatchQueueKind::Local, &work_dir).map_err(flowctl_engine::EngineError::Queue)?);
    let remote_queue: Arc<dyn BatchQueue> = if batch_kind == flowctl_queue::BatchQueueKind::Local {
        Arc::clone(&local_queue)
    } else {
        Arc::from(flowctl_queue::create(batch_kind, &work_dir).map_err(flowctl_engine::EngineError::Queue)?)
    };

    let config = args.build_config(batch_kind);
    if let Some(extra) = &config.batch_options {
        local_queue.set_option("batch-options", extra);
        remote_queue.set_option("batch-options", extra);
    }

    let abort = AbortFlag::new();
    flowctl_engine::install_signal_handlers(abort.clone())?;

    let (engine, outcome) = DagEngine::new(
        dag,
        config,
        SystemClock,
        local_queue,
        remote_queue,
        work_dir,
        args.journal_path(),
        abort,
    )?;
    Ok((engine.with_workflow_loader(Arc::new(JsonWorkflowLoader)), outcome))
}
