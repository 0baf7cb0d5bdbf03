//! The DAG execution engine: workflow model mutation, scheduling, startup
//! recovery, and the batch-queue dispatch loop (spec §4-§5).

mod completion;
mod config;
mod engine;
mod error;
mod nested;
mod recovery;
mod sandbox;
mod scheduler;
mod signals;

pub use completion::CompletionOutcome;
pub use config::{CleanMode, Config};
pub use engine::{default_journal_path, DagEngine};
pub use error::EngineError;
pub use nested::{NoWorkflowLoader, WorkflowLoader};
pub use recovery::RecoveryOutcome;
pub use signals::{install as install_signal_handlers, AbortFlag};
