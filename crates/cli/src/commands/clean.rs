//! `flowctl clean` - remove target files and sandbox symlinks.

use super::WorkflowArgs;
use crate::error::CliError;
use clap::Args;
use flowctl_engine::CleanMode;

#[derive(Args, Debug)]
pub struct CleanArgs {
    #[command(flatten)]
    pub workflow: WorkflowArgs,

    /// Remove every declared output, not only intermediate ones
    #[arg(long)]
    pub all_outputs: bool,
}

pub async fn clean(args: CleanArgs) -> Result<(), CliError> {
    let (engine, _outcome) = super::common::build_engine(&args.workflow)?;
    let mode = if args.all_outputs { CleanMode::AllOutputs } else { CleanMode::IntermediateOnly };
    engine.clean(mode);
    Ok(())
}
