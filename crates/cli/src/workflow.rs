//! Loads a [`Dag`] from its JSON on-disk representation.
//!
//! The workflow-DSL lexer/parser is an external collaborator (spec §1);
//! this module is the other end of that contract, consuming whatever the
//! parser is expected to emit rather than lexing workflow source itself.
//! `Dag`'s constituent types already derive `Deserialize`, so the shape
//! below is a thin, validated DTO fed node-by-node through
//! [`DagBuilder::add_node`] — preserving the builder's own target-
//! uniqueness and contiguous-id checks instead of deserializing a `Dag`
//! directly and bypassing them.

use crate::error::CliError;
use flowctl_core::{AllocationMode, Category, CoreError, Dag, DagBuilder, FileRef, Node, NodeId, NodeKind, Placement, ResourceRequest, VarScope};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct WorkflowFile {
    #[serde(default)]
    categories: Vec<CategoryDef>,
    #[serde(default)]
    default_category: Option<String>,
    #[serde(default)]
    exported_env: Vec<String>,
    nodes: Vec<NodeDef>,
}

#[derive(Debug, Deserialize)]
struct CategoryDef {
    name: String,
    #[serde(default)]
    resources: ResourceRequest,
    #[serde(default = "default_allocation_mode")]
    allocation_mode: AllocationMode,
    #[serde(default)]
    scope: VarScope,
}

fn default_allocation_mode() -> AllocationMode {
    AllocationMode::MaxThroughput
}

#[derive(Debug, Deserialize)]
struct NodeDef {
    command: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    local: bool,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    scope: VarScope,
    /// Present only on a nested-workflow node; names the sub-workflow
    /// file `NodeKind::Workflow` dispatches to (spec §4.2 "Nested-workflow
    /// nodes").
    #[serde(default)]
    workflow: Option<PathBuf>,
}

/// Parses one `outer` or `outer=inner` entry from a node's source/target
/// list (spec §6: "optional `outer=inner` rename").
fn parse_file_ref(entry: &str) -> FileRef {
    match entry.split_once('=') {
        Some((outer, inner)) => FileRef::renamed(outer, inner),
        None => FileRef::same_name(entry),
    }
}

pub fn load_dag(path: &Path) -> Result<Dag, CliError> {
    let text = std::fs::read_to_string(path)?;
    let file: WorkflowFile = serde_json::from_str(&text)?;

    let mut builder = DagBuilder::new();
    for category in file.categories {
        builder = builder.category(Category {
            name: category.name.into(),
            resources: category.resources,
            allocation_mode: category.allocation_mode,
            scope: category.scope,
        });
    }
    for name in file.exported_env {
        builder = builder.export_env(name);
    }

    for (index, node_def) in file.nodes.into_iter().enumerate() {
        let mut node = Node::new(NodeId(index as u32), node_def.command);
        node.line = node_def.line;
        node.sources = node_def.sources.iter().map(|s| parse_file_ref(s)).collect();
        node.targets = node_def.targets.iter().map(|s| parse_file_ref(s)).collect();
        node.placement = if node_def.local { Placement::Local } else { Placement::Remote };
        node.scope = node_def.scope;
        if let Some(category) = node_def.category {
            node.category = category.into();
        }
        if let Some(workflow_path) = node_def.workflow {
            node.kind = NodeKind::Workflow(workflow_path);
        }
        builder.add_node(node)?;
    }

    let mut dag = builder.build();
    if let Some(default_category) = file.default_category {
        if !dag.categories.contains_key(default_category.as_str()) {
            return Err(CliError::UnknownDefaultCategory(default_category));
        }
        dag.default_category = default_category.into();
    }
    for node in &dag.nodes {
        if !dag.categories.contains_key(node.category.as_str()) {
            return Err(CoreError::UnknownCategory(node.category.to_string()).into());
        }
    }
    Ok(dag)
}

/// Drives nested-workflow dispatch (spec §4.2) by re-running [`load_dag`]
/// against the sub-workflow's own file, exactly as the top-level command
/// loaded the parent.
pub struct JsonWorkflowLoader;

impl flowctl_engine::WorkflowLoader for JsonWorkflowLoader {
    fn load(&self, path: &Path) -> Result<Dag, flowctl_engine::EngineError> {
        load_dag(path).map_err(|e| match e {
            CliError::Engine(inner) => inner,
            CliError::Io(inner) => flowctl_engine::EngineError::Io(inner),
            other => flowctl_engine::EngineError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string())),
        })
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
