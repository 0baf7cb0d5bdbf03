//! Filesystem artifacts referenced by one or more nodes.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A file reference as declared on a node: an outer (workflow-visible) name
/// and an optional inner (sandbox) rename, written `outer=inner` in the
/// workflow source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub outer: SmolStr,
    pub inner: Option<SmolStr>,
}

impl FileRef {
    pub fn same_name(outer: impl Into<SmolStr>) -> Self {
        Self { outer: outer.into(), inner: None }
    }

    pub fn renamed(outer: impl Into<SmolStr>, inner: impl Into<SmolStr>) -> Self {
        Self { outer: outer.into(), inner: Some(inner.into()) }
    }
}

/// A filesystem artifact tracked in the DAG's file table, keyed by its
/// logical (outer) name. Created on first mention by any node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: SmolStr,
    /// Sandbox inner name, assigned lazily by the engine's translation map.
    pub sandbox_name: Option<SmolStr>,
    pub content_hash: Option<String>,
    pub creator: Option<NodeId>,
    pub consumers: Vec<NodeId>,
    pub estimated_size: Option<u64>,
}

impl FileRecord {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            sandbox_name: None,
            content_hash: None,
            creator: None,
            consumers: Vec::new(),
            estimated_size: None,
        }
    }

    pub fn is_external(&self) -> bool {
        self.creator.is_none()
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
