//! Core error kinds shared by the DAG data model.

use crate::node::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("node {0} references unknown file {1:?}")]
    UnknownFile(NodeId, String),

    #[error("file {file:?} is already the target of node {existing}; node {attempted} cannot also claim it")]
    DuplicateTarget {
        file: String,
        existing: NodeId,
        attempted: NodeId,
    },

    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    #[error("node {0} is not a workflow node")]
    NotAWorkflowNode(NodeId),
}
