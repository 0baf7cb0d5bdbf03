//! `flowctl`: the thin CLI collaborator over `flowctl-engine` (spec §4.2
//! "Operations exposed to a thin CLI collaborator").

mod commands;
mod error;
mod workflow;

use clap::{Parser, Subcommand};
use commands::{check, clean, recover, run, WorkflowArgs};
use error::CliError;

#[derive(Parser)]
#[command(name = "flowctl", version, about = "Run, check, clean, or recover a workflow DAG")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive the workflow to completion
    Run(WorkflowArgs),
    /// Verify every source file is present or producible, without submitting anything
    Check(WorkflowArgs),
    /// Remove target files and sandbox symlinks
    Clean(clean::CleanArgs),
    /// Report what startup recovery would do, without running
    Recover(WorkflowArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run::run(args).await,
        Command::Check(args) => check::check(args).await,
        Command::Clean(args) => clean::clean(args).await,
        Command::Recover(args) => recover::recover(args).await,
    };

    if let Err(err) = result {
        eprintln!("flowctl: {err}");
        std::process::exit(exit_code(&err));
    }
    Ok(())
}

/// Spec §6 "Signal exit codes": 0 success, 1 workflow failed or aborted,
/// any positive value from the parser/checker propagates.
fn exit_code(err: &CliError) -> i32 {
    err.exit_code()
}
