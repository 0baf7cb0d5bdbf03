use super::*;
use crate::config::Config;
use crate::engine::DagEngine;
use crate::signals::AbortFlag;
use flowctl_core::test_support::linear_three_node_dag;
use flowctl_core::{Clock, FakeClock, JobInfo, Node, NodeId, Placement};
use flowctl_queue::test_support::FakeQueue;
use std::sync::Arc;
use tempfile::tempdir;

struct FakeLoader {
    dag: Dag,
}

impl WorkflowLoader for FakeLoader {
    fn load(&self, _path: &Path) -> Result<Dag, EngineError> {
        Ok(self.dag.clone())
    }
}

fn one_node_dag(placement: Placement) -> Dag {
    let mut dag = linear_three_node_dag();
    // Collapse to a single node with no sources/targets so completion
    // never depends on any file being present on disk.
    dag.nodes.truncate(1);
    dag.files.clear();
    dag.nodes[0] = Node::new(NodeId(0), "true");
    dag.nodes[0].placement = placement;
    dag
}

fn build_engine(queue: Arc<FakeQueue>, loader: Dag, config: Config, dir: &std::path::Path) -> DagEngine<FakeClock> {
    let (engine, _) = DagEngine::new(
        one_node_dag(Placement::Local),
        config,
        FakeClock::new(),
        queue.clone(),
        queue,
        dir.to_path_buf(),
        dir.join("parent.flowctl.journal"),
        AbortFlag::new(),
    )
    .unwrap();
    engine.with_workflow_loader(Arc::new(FakeLoader { dag: loader }))
}

#[tokio::test]
async fn a_successful_sub_workflow_completes() {
    let dir = tempdir().unwrap();
    let queue = Arc::new(FakeQueue::new());
    queue.push_completion(1, JobInfo::success(0));

    let config = Config::new(1, 1);
    let engine = build_engine(queue, one_node_dag(Placement::Local), config, dir.path());

    let result = nested::run_nested(&engine, &dir.path().join("sub.flow")).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn a_failing_sub_workflow_propagates_failure() {
    let dir = tempdir().unwrap();
    let queue = Arc::new(FakeQueue::new());
    queue.push_completion(1, JobInfo::success(1));

    let mut config = Config::new(1, 1);
    config.retry_max = 0;
    let engine = build_engine(queue, one_node_dag(Placement::Local), config, dir.path());

    let result = nested::run_nested(&engine, &dir.path().join("sub.flow")).await;
    assert!(matches!(result, Err(EngineError::WorkflowFailed)));
}

#[tokio::test]
async fn no_workflow_loader_is_a_clear_error() {
    let dir = tempdir().unwrap();
    let queue = Arc::new(FakeQueue::new());
    let config = Config::new(1, 1);
    let (engine, _) = DagEngine::new(
        one_node_dag(Placement::Local),
        config,
        FakeClock::new(),
        queue.clone(),
        queue,
        dir.path().to_path_buf(),
        dir.path().join("parent.flowctl.journal"),
        AbortFlag::new(),
    )
    .unwrap();

    let result = nested::run_nested(&engine, &dir.path().join("sub.flow")).await;
    assert!(result.is_err());
}
