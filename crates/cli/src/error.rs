//! Error kinds produced while loading a workflow file or driving a
//! command, and the exit-code mapping `main` uses to translate them
//! (spec §6 "Signal exit codes": 0 success, 1 workflow failed or
//! aborted, any positive value from the parser/checker propagates).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] flowctl_core::CoreError),

    #[error(transparent)]
    Engine(#[from] flowctl_engine::EngineError),

    #[error(transparent)]
    Queue(#[from] flowctl_queue::QueueError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("workflow file references unknown default category {0:?}")]
    UnknownDefaultCategory(String),
}

impl CliError {
    /// A parse/load failure (malformed JSON, an unknown category, a
    /// duplicate target) is reported as exit code 2, distinct from the
    /// "ran but a node failed" code 1 — both are "positive values from
    /// the parser/checker" in the sense of §6, but keeping them apart
    /// lets a caller tell "your workflow file is broken" from "your
    /// workflow ran and something in it failed".
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(flowctl_engine::EngineError::WorkflowFailed) => 1,
            CliError::Core(_) | CliError::Json(_) | CliError::UnknownDefaultCategory(_) => 2,
            _ => 1,
        }
    }
}
