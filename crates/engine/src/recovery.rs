//! Startup recovery (spec §4.2 "Recovery algorithm on start-up"). Runs
//! once, before `DagEngine`'s main loop takes over the journal writer.

use crate::error::EngineError;
use flowctl_core::{Dag, Node, NodeId, NodeState};
use flowctl_journal::{Journal, Record};
use flowctl_queue::BatchQueue;
use std::collections::HashSet;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// What the recovery pass found, handed back so `DagEngine::new` can seed
/// its job tables instead of re-deriving this from journal state on its
/// own.
#[derive(Debug, Default)]
pub struct RecoveryOutcome {
    /// Was this a fresh run (no prior journal)?
    pub is_rerun: bool,
    /// Nodes left Running and re-adopted into the remote job table
    /// (step 3): the backend survives engine restarts, so the job is
    /// still out there.
    pub readopted_remote: Vec<NodeId>,
    /// Every node forced back to Waiting by the stale-output scan
    /// (step 5), including nodes whose own sources/targets triggered it
    /// and the descendants pulled in transitively.
    pub forced_rerun: HashSet<NodeId>,
    /// Nodes that already had a `#` header line in the journal — the
    /// engine must not write a second one for these on their next
    /// transition.
    pub headers_written: HashSet<NodeId>,
}

/// Replays `journal_path` onto `dag` and applies the three reset passes
/// that follow a replay (steps 3-5). A no-op, freshly-initialized
/// `RecoveryOutcome` is returned when there is no prior journal.
pub fn recover(
    dag: &mut Dag,
    journal_path: &Path,
    work_dir: &Path,
    queue: &dyn BatchQueue,
) -> Result<RecoveryOutcome, EngineError> {
    let mut outcome = RecoveryOutcome::default();
    if !Journal::is_rerun(journal_path)? {
        return Ok(outcome);
    }
    outcome.is_rerun = true;

    apply_journal(dag, journal_path, &mut outcome)?;
    readopt_or_reset(dag, work_dir, queue, &mut outcome);
    force_rerun_stale(dag, work_dir, &mut outcome);
    Ok(outcome)
}

/// Step 1: parse every record and apply it to the in-memory node. Step 2
/// (close-and-reopen-for-append) is the caller's concern — `Journal`
/// exposes replay and append as two independent entry points, so there is
/// no read handle here to close.
fn apply_journal(dag: &mut Dag, journal_path: &Path, outcome: &mut RecoveryOutcome) -> Result<(), EngineError> {
    for record in Journal::replay(journal_path)? {
        match record {
            Record::Header(header) => {
                outcome.headers_written.insert(header.node_id);
                dag.node_mut(header.node_id).parents = header.parents;
            }
            Record::Transition(t) => {
                let node = dag.node_mut(t.node_id);
                node.state = t.state;
                node.job_id = if t.job_id == 0 { None } else { Some(t.job_id) };
                node.previous_completion_epoch_ms = Some(t.timestamp_ms);
            }
        }
    }
    Ok(())
}

/// Steps 3-4: a node still Running on a restart-surviving remote backend
/// is re-adopted as-is; everything else left in a non-terminal-for-a-
/// fresh-start state (Running on a backend that doesn't survive, Failed,
/// Aborted) goes back to Waiting and has its declared targets removed so
/// it re-runs cleanly.
fn readopt_or_reset(dag: &mut Dag, work_dir: &Path, queue: &dyn BatchQueue, outcome: &mut RecoveryOutcome) {
    let survives_restart = queue.supports_feature("survives-engine-restart").is_some();
    let mut to_clean: Vec<NodeId> = Vec::new();

    for node in dag.nodes.iter_mut() {
        match node.state {
            NodeState::Running if !node.is_local() && survives_restart => {
                outcome.readopted_remote.push(node.id);
            }
            NodeState::Running | NodeState::Failed | NodeState::Aborted => {
                node.state = NodeState::Waiting;
                node.job_id = None;
                to_clean.push(node.id);
            }
            _ => {}
        }
    }

    for node_id in to_clean {
        clean_targets(dag.node(node_id), work_dir);
    }
}

fn clean_targets(node: &Node, work_dir: &Path) {
    for target in &node.targets {
        let path = work_dir.join(target.outer.as_str());
        let _ = std::fs::remove_file(path);
    }
}

/// Step 5: a node is stale if any source is newer than its own
/// `previous_completion`, or any target is missing or newer than that
/// timestamp. Staleness propagates transitively through target-file
/// consumers; a visited set keyed by node id stops the walk on cycles or
/// diamonds re-entering the same node.
fn force_rerun_stale(dag: &mut Dag, work_dir: &Path, outcome: &mut RecoveryOutcome) {
    let mut stack: Vec<NodeId> = dag
        .nodes
        .iter()
        .filter(|node| is_stale(node, work_dir))
        .map(|node| node.id)
        .collect();

    let mut visited = HashSet::new();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let targets: Vec<String> = {
            let node = dag.node_mut(id);
            node.state = NodeState::Waiting;
            node.job_id = None;
            node.targets.iter().map(|t| t.outer.to_string()).collect()
        };
        for target in &targets {
            for consumer in dag.consumers_of(target) {
                if !visited.contains(&consumer) {
                    stack.push(consumer);
                }
            }
        }
    }
    outcome.forced_rerun = visited;
}

fn is_stale(node: &Node, work_dir: &Path) -> bool {
    let prev = node.previous_completion_epoch_ms;
    let source_newer = node
        .sources
        .iter()
        .any(|s| mtime_ms(work_dir, s.outer.as_str()).is_some_and(|t| Some(t) > prev));
    let target_stale = node.targets.iter().any(|t| match mtime_ms(work_dir, t.outer.as_str()) {
        None => true,
        Some(t_ms) => Some(t_ms) > prev,
    });
    source_newer || target_stale
}

fn mtime_ms(work_dir: &Path, name: &str) -> Option<u64> {
    let meta = std::fs::metadata(work_dir.join(name)).ok()?;
    let modified = meta.modified().ok()?;
    modified.duration_since(UNIX_EPOCH).ok().map(|d| d.as_millis() as u64)
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
