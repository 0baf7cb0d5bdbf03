//! `flowctl run` - drive the workflow's DAG to completion.

use super::WorkflowArgs;
use crate::error::CliError;

pub async fn run(args: WorkflowArgs) -> Result<(), CliError> {
    let (mut engine, outcome) = super::common::build_engine(&args)?;
    if outcome.is_rerun {
        tracing::info!(
            readopted_remote = outcome.readopted_remote.len(),
            forced_rerun = outcome.forced_rerun.len(),
            "resuming from journal"
        );
    }
    engine.run().await?;
    Ok(())
}
