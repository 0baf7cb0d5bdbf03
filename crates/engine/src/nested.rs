//! Nested-workflow node dispatch (spec §4.2 "Nested-workflow nodes"): a
//! node of kind `Workflow(path)` recursively runs the engine over the
//! named sub-workflow file and reports one success/failure back to its
//! own node.

use crate::engine::DagEngine;
use crate::error::EngineError;
use flowctl_core::{Clock, Dag};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// Loads a sub-workflow's DAG from its path. The engine has no workflow
/// parser of its own — that lives in the CLI collaborator that also
/// builds the top-level DAG — so nested dispatch is parameterized over
/// this trait instead of a concrete file format.
pub trait WorkflowLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Dag, EngineError>;
}

/// A loader that always fails, for configurations that never nest
/// workflows and would rather get a clear error than a silent no-op.
#[derive(Debug, Default)]
pub struct NoWorkflowLoader;

impl WorkflowLoader for NoWorkflowLoader {
    fn load(&self, path: &Path) -> Result<Dag, EngineError> {
        Err(EngineError::Io(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("no workflow loader configured for nested workflow {}", path.display()),
        )))
    }
}

/// Runs one nested-workflow node to completion, using the parent's
/// queues, clock, config, and workflow loader. Returns `Ok(())` on
/// sub-workflow success and `Err(EngineError::WorkflowFailed)` (or a
/// propagated construction error) otherwise.
///
/// Boxed and pinned: this function and `DagEngine::run` call each other
/// through `NodeKind::Workflow` dispatch, and a directly recursive
/// `async fn` cycle has no finite future size unless one leg of the loop
/// is heap-allocated.
pub fn run_nested<'a, C>(engine: &'a DagEngine<C>, path: &'a Path) -> Pin<Box<dyn Future<Output = Result<(), EngineError>> + Send + 'a>>
where
    C: Clock + 'a,
{
    Box::pin(async move {
        let sub_dag = engine.workflow_loader().load(path)?;
        let journal_path = journal_path_for(path);
        let mut sub_engine = engine.nested_engine(sub_dag, journal_path)?;
        sub_engine.run().await
    })
}

fn journal_path_for(workflow_path: &Path) -> PathBuf {
    let mut name = workflow_path.as_os_str().to_os_string();
    name.push(".flowctl.journal");
    PathBuf::from(name)
}

#[cfg(test)]
#[path = "nested_tests.rs"]
mod tests;
