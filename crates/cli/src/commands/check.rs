//! `flowctl check` - verify every source file is already present or will
//! be produced by some node, without submitting anything.

use super::WorkflowArgs;
use crate::error::CliError;

pub async fn check(args: WorkflowArgs) -> Result<(), CliError> {
    let (engine, _outcome) = super::common::build_engine(&args)?;
    engine.check()?;
    println!("ok: every source file is present or producible");
    Ok(())
}
