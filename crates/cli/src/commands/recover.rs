//! `flowctl recover` - report what startup recovery would do, without
//! entering the main loop (spec §4.2 "Operations exposed to a thin CLI
//! collaborator": `recover(dag, journal_path)` as a standalone step).

use super::WorkflowArgs;
use crate::error::CliError;

pub async fn recover(args: WorkflowArgs) -> Result<(), CliError> {
    let (_engine, report) = super::common::build_engine(&args)?;
    if !report.is_rerun {
        println!("no journal found; this would be a fresh run");
        return Ok(());
    }
    println!("re-adopted into the remote job table: {}", report.readopted_remote.len());
    println!("forced to re-run by stale outputs: {}", report.forced_rerun.len());
    println!("nodes with a journal header already written: {}", report.headers_written.len());
    Ok(())
}
