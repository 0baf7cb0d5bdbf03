//! The in-memory DAG: nodes, files, categories, and the builder a parser
//! (an external collaborator) drives to construct one.

use crate::category::{Category, DEFAULT_CATEGORY};
use crate::error::CoreError;
use crate::file::{FileRecord, FileRef};
use crate::node::{Node, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Owns every Node, File, and Category for one workflow run. Produced by
/// `DagBuilder::build` (the engine's "pure constructor" consumed from the
/// parser collaborator, per the external-interfaces contract) and from
/// then on mutated only by the engine's own loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dag {
    pub nodes: Vec<Node>,
    pub files: IndexMap<SmolStr, FileRecord>,
    pub categories: IndexMap<SmolStr, Category>,
    pub default_category: SmolStr,
    pub exported_env: Vec<String>,
}

impl Dag {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Σ state counts, for the state-count conservation invariant.
    pub fn state_counts(&self) -> [u32; 5] {
        let mut counts = [0u32; 5];
        for node in &self.nodes {
            counts[node.state.code() as usize] += 1;
        }
        counts
    }

    /// All nodes that declare `file` among their sources.
    pub fn consumers_of<'a>(&'a self, file: &str) -> impl Iterator<Item = NodeId> + 'a {
        self.files
            .get(file)
            .into_iter()
            .flat_map(|rec| rec.consumers.iter().copied())
    }
}

/// Incrementally constructs a [`Dag`], enforcing target-file uniqueness
/// (`§3` invariant: the target-file relation is injective) as nodes are
/// added, rather than validating after the fact.
#[derive(Debug, Default)]
pub struct DagBuilder {
    dag: Dag,
}

impl DagBuilder {
    pub fn new() -> Self {
        let mut dag = Dag::default();
        dag.default_category = SmolStr::new(DEFAULT_CATEGORY);
        dag.categories
            .insert(dag.default_category.clone(), Category::new(DEFAULT_CATEGORY));
        Self { dag }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.dag.categories.insert(category.name.clone(), category);
        self
    }

    pub fn export_env(mut self, name: impl Into<String>) -> Self {
        self.dag.exported_env.push(name.into());
        self
    }

    /// Append a node, registering its sources/targets in the file table.
    /// Node ids must be assigned by the caller in parse order starting at
    /// 0 and inserted in that same order; `add_node` asserts this so a
    /// bug in the parser surfaces immediately rather than corrupting the
    /// dense `nodes` vector indexing.
    pub fn add_node(&mut self, node: Node) -> Result<(), CoreError> {
        assert_eq!(
            node.id.0 as usize,
            self.dag.nodes.len(),
            "nodes must be added in parse order with contiguous ids"
        );

        for source in &node.sources {
            self.dag
                .files
                .entry(source.outer.clone())
                .or_insert_with(|| FileRecord::new(source.outer.clone()))
                .consumers
                .push(node.id);
        }

        for target in &node.targets {
            let entry = self
                .dag
                .files
                .entry(target.outer.clone())
                .or_insert_with(|| FileRecord::new(target.outer.clone()));
            if let Some(existing) = entry.creator {
                return Err(CoreError::DuplicateTarget {
                    file: target.outer.to_string(),
                    existing,
                    attempted: node.id,
                });
            }
            entry.creator = Some(node.id);
        }

        self.dag.nodes.push(node);
        Ok(())
    }

    pub fn build(self) -> Dag {
        self.dag
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
