//! Journal line format: one record per line, two shapes.
//!
//! A comment line is written once per node, at its first run:
//! `# <node_id>\t<command>\t<parent_id> <parent_id> ...`
//!
//! A data line is written on every state transition:
//! `<timestamp_ms> <node_id> <state_code> <job_id> <waiting> <running> <complete> <failed> <aborted> <total>`

use crate::error::JournalError;
use flowctl_core::{BatchJobId, NodeId, NodeState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHeader {
    pub node_id: NodeId,
    pub command: String,
    pub parents: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateCounts {
    pub waiting: u32,
    pub running: u32,
    pub complete: u32,
    pub failed: u32,
    pub aborted: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub timestamp_ms: u64,
    pub node_id: NodeId,
    pub state: NodeState,
    /// `0` means "no job id" (the node never got as far as submission,
    /// e.g. a transition straight to `Aborted`).
    pub job_id: BatchJobId,
    pub counts: StateCounts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Header(NodeHeader),
    Transition(Transition),
}

impl NodeHeader {
    pub fn to_line(&self) -> String {
        let parents = self
            .parents
            .iter()
            .map(|p| p.0.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        format!("# {}\t{}\t{}", self.node_id.0, self.command, parents)
    }
}

impl Transition {
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} {} {} {}",
            self.timestamp_ms,
            self.node_id.0,
            self.state.code(),
            self.job_id,
            self.counts.waiting,
            self.counts.running,
            self.counts.complete,
            self.counts.failed,
            self.counts.aborted,
            self.counts.total,
        )
    }
}

/// Parses one journal line. `line_no` is 1-based, used only for error
/// messages.
pub fn parse_line(line_no: usize, line: &str) -> Result<Record, JournalError> {
    let corrupt = |reason: &str| JournalError::Corruption {
        line_no,
        line: line.to_string(),
        reason: reason.to_string(),
    };

    if let Some(rest) = line.strip_prefix('#') {
        let rest = rest.trim_start();
        let mut fields = rest.splitn(3, '\t');
        let node_id: u32 = fields
            .next()
            .ok_or_else(|| corrupt("missing node id"))?
            .trim()
            .parse()
            .map_err(|_| corrupt("node id is not an integer"))?;
        let command = fields.next().ok_or_else(|| corrupt("missing command"))?.to_string();
        let parents_field = fields.next().unwrap_or("");
        let parents = parents_field
            .split_whitespace()
            .map(|tok| tok.parse().map(NodeId).map_err(|_| corrupt("parent id is not an integer")))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Record::Header(NodeHeader { node_id: NodeId(node_id), command, parents }));
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 10 {
        return Err(corrupt(&format!("expected 10 fields, found {}", fields.len())));
    }
    let parse_u64 = |s: &str, what: &str| s.parse::<u64>().map_err(|_| corrupt(what));
    let parse_u32 = |s: &str, what: &str| s.parse::<u32>().map_err(|_| corrupt(what));

    let timestamp_ms = parse_u64(fields[0], "timestamp is not an integer")?;
    let node_id = NodeId(parse_u32(fields[1], "node id is not an integer")?);
    let state_code: u8 = fields[2].parse().map_err(|_| corrupt("state code is not an integer"))?;
    let state = NodeState::from_code(state_code).ok_or_else(|| corrupt("state code out of range"))?;
    let job_id: BatchJobId = fields[3].parse().map_err(|_| corrupt("job id is not an integer"))?;
    let counts = StateCounts {
        waiting: parse_u32(fields[4], "waiting count is not an integer")?,
        running: parse_u32(fields[5], "running count is not an integer")?,
        complete: parse_u32(fields[6], "complete count is not an integer")?,
        failed: parse_u32(fields[7], "failed count is not an integer")?,
        aborted: parse_u32(fields[8], "aborted count is not an integer")?,
        total: parse_u32(fields[9], "total count is not an integer")?,
    };

    Ok(Record::Transition(Transition { timestamp_ms, node_id, state, job_id, counts }))
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
