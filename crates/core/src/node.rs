//! A node: one rule, its state machine, and its per-submission job info.

use crate::category::VarScope;
use crate::file::FileRef;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::path::PathBuf;

/// Stable, dense, parse-order-stable integer id. Nodes live in a `Vec`
/// indexed by this id; there are no pointers between nodes in the model,
/// only filename lookups through the DAG's file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The backend-assigned job id for a node's current submission. Backends
/// return `>= 1` on success and `-1` on submission failure; `0` means "no
/// job" in the `wait` return channel, never a real id.
pub type BatchJobId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    Waiting,
    Running,
    Complete,
    Failed,
    Aborted,
}

crate::simple_display! {
    NodeState {
        Waiting => "waiting",
        Running => "running",
        Complete => "complete",
        Failed => "failed",
        Aborted => "aborted",
    }
}

impl NodeState {
    pub const ALL: [NodeState; 5] = [
        NodeState::Waiting,
        NodeState::Running,
        NodeState::Complete,
        NodeState::Failed,
        NodeState::Aborted,
    ];

    /// Numeric code used in the journal's data-line format
    /// (`... new_state ...`, a `0..4` integer).
    pub fn code(self) -> u8 {
        match self {
            NodeState::Waiting => 0,
            NodeState::Running => 1,
            NodeState::Complete => 2,
            NodeState::Failed => 3,
            NodeState::Aborted => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => NodeState::Waiting,
            1 => NodeState::Running,
            2 => NodeState::Complete,
            3 => NodeState::Failed,
            4 => NodeState::Aborted,
            _ => return None,
        })
    }
}

/// Which concurrency cap and which `BatchQueue` governs a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Local,
    Remote,
}

/// Whether a node runs a shell command or recursively invokes the engine
/// on a sub-workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Command,
    Workflow(PathBuf),
}

/// Opaque per-submission record produced by a backend. Merged into the
/// node at completion, then discarded.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JobInfo {
    pub submitted_epoch_ms: Option<u64>,
    pub started_epoch_ms: Option<u64>,
    pub finished_epoch_ms: Option<u64>,
    pub exited_normally: bool,
    pub exit_code: Option<i32>,
    pub exit_signal: Option<i32>,
}

impl JobInfo {
    /// The original recovery path conflates a synthetic heartbeat-loss
    /// failure with a real `signal 1`; this reimplementation keeps them
    /// distinct (see `QueueError::HeartbeatLost` in `flowctl-queue`) so
    /// `JobInfo` never needs to fake a signal number for that case.
    pub fn success(exit_code: i32) -> Self {
        Self {
            exited_normally: true,
            exit_code: Some(exit_code),
            ..Default::default()
        }
    }

    pub fn signalled(signal: i32) -> Self {
        Self {
            exited_normally: false,
            exit_signal: Some(signal),
            ..Default::default()
        }
    }

    /// The reserved "please retry" exit code (`§4.1`/`§7`): a job that
    /// exits 101 is retried even when ordinary retry policy is exhausted.
    pub const TRANSIENT_RETRY_EXIT_CODE: i32 = 101;

    pub fn is_transient_retry(&self) -> bool {
        self.exited_normally && self.exit_code == Some(Self::TRANSIENT_RETRY_EXIT_CODE)
    }
}

/// One rule: a command with input and output file sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub line: Option<u32>,
    pub sources: Vec<FileRef>,
    pub targets: Vec<FileRef>,
    pub command: String,
    pub state: NodeState,
    pub failure_count: u32,
    pub job_id: Option<BatchJobId>,
    pub placement: Placement,
    pub kind: NodeKind,
    pub category: SmolStr,
    pub scope: VarScope,
    pub previous_completion_epoch_ms: Option<u64>,
    /// Parent node ids, recorded once in the journal's comment line at
    /// first run. Derived from source-file producers at parse time.
    pub parents: Vec<NodeId>,
}

impl Node {
    pub fn new(id: NodeId, command: impl Into<String>) -> Self {
        Self {
            id,
            line: None,
            sources: Vec::new(),
            targets: Vec::new(),
            command: command.into(),
            state: NodeState::Waiting,
            failure_count: 0,
            job_id: None,
            placement: Placement::Remote,
            kind: NodeKind::Command,
            category: SmolStr::new(crate::category::DEFAULT_CATEGORY),
            scope: VarScope::new(),
            previous_completion_epoch_ms: None,
            parents: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, NodeState::Complete | NodeState::Failed | NodeState::Aborted)
    }

    pub fn is_local(&self) -> bool {
        matches!(self.placement, Placement::Local)
    }

    /// SHA-256 of the command plus sorted source/target outer names; a
    /// cache-key hint only, never used to decide correctness (`§9` names
    /// the content-hash cache as the one piece of engine-owned global
    /// state besides the signal flag).
    pub fn content_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut sources: Vec<&str> = self.sources.iter().map(|f| f.outer.as_str()).collect();
        let mut targets: Vec<&str> = self.targets.iter().map(|f| f.outer.as_str()).collect();
        sources.sort_unstable();
        targets.sort_unstable();
        let mut hasher = Sha256::new();
        hasher.update(self.command.as_bytes());
        for s in sources {
            hasher.update(b"\0s:");
            hasher.update(s.as_bytes());
        }
        for t in targets {
            hasher.update(b"\0t:");
            hasher.update(t.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct NodeBuilder => Node {
        set { id: NodeId = NodeId(0) }
        into { command: String = "true" }
        computed {
            line: Option<u32> = None,
            sources: Vec<FileRef> = Vec::new(),
            targets: Vec<FileRef> = Vec::new(),
            state: NodeState = NodeState::Waiting,
            failure_count: u32 = 0,
            job_id: Option<BatchJobId> = None,
            placement: Placement = Placement::Remote,
            kind: NodeKind = NodeKind::Command,
            category: SmolStr = SmolStr::new(crate::category::DEFAULT_CATEGORY),
            scope: VarScope = VarScope::new(),
            previous_completion_epoch_ms: Option<u64> = None,
            parents: Vec<NodeId> = Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
