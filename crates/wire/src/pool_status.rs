//! The pool controller's own status object, published back to the
//! directory service once per cycle.

use crate::manager::ManagerSummary;
use serde::{Deserialize, Serialize};

/// Matches the directory service's generic "what kind of thing is this"
/// tag convention; a factory always publishes `"wq_factory"` regardless
/// of which batch backend it drives underneath.
pub const POOL_IDENTITY_TAG: &str = "wq_factory";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolStatus {
    #[serde(rename = "type")]
    pub kind: String,
    pub project_regex: Option<String>,
    pub submission_regex: Option<String>,
    pub managers: Vec<ManagerSummary>,
    pub workers_submitted: u64,
    pub workers_needed: u64,
    pub workers_requested_this_cycle: u64,
    pub workers_waiting_to_connect: u64,
}

impl PoolStatus {
    pub fn new(project_regex: Option<String>, submission_regex: Option<String>) -> Self {
        Self {
            kind: POOL_IDENTITY_TAG.to_string(),
            project_regex,
            submission_regex,
            ..Default::default()
        }
    }
}

#[cfg(test)]
#[path = "pool_status_tests.rs"]
mod tests;
