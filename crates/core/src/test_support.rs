//! Shared test helpers exported to downstream crates behind `test-support`.

use crate::dag::DagBuilder;
use crate::file::FileRef;
use crate::node::{Node, NodeId};

/// Build the linear three-node DAG from the scenario catalog: A (no
/// sources) -> B (reads A's output) -> C (reads B's output).
pub fn linear_three_node_dag() -> crate::dag::Dag {
    let mut builder = DagBuilder::new();
    let mut a = Node::new(NodeId(0), "produce a");
    a.targets = vec![FileRef::same_name("a.out")];
    builder.add_node(a).expect("node 0");

    let mut b = Node::new(NodeId(1), "produce b from a");
    b.sources = vec![FileRef::same_name("a.out")];
    b.targets = vec![FileRef::same_name("b.out")];
    builder.add_node(b).expect("node 1");

    let mut c = Node::new(NodeId(2), "produce c from b");
    c.sources = vec![FileRef::same_name("b.out")];
    c.targets = vec![FileRef::same_name("c.out")];
    builder.add_node(c).expect("node 2");

    builder.build()
}

/// Build the diamond DAG: A -> {B, C} -> D.
pub fn diamond_dag() -> crate::dag::Dag {
    let mut builder = DagBuilder::new();
    let mut a = Node::new(NodeId(0), "produce a");
    a.targets = vec![FileRef::same_name("a.out")];
    builder.add_node(a).expect("node 0");

    let mut b = Node::new(NodeId(1), "produce b from a");
    b.sources = vec![FileRef::same_name("a.out")];
    b.targets = vec![FileRef::same_name("b.out")];
    builder.add_node(b).expect("node 1");

    let mut c = Node::new(NodeId(2), "produce c from a");
    c.sources = vec![FileRef::same_name("a.out")];
    c.targets = vec![FileRef::same_name("c.out")];
    builder.add_node(c).expect("node 2");

    let mut d = Node::new(NodeId(3), "produce d from b and c");
    d.sources = vec![FileRef::same_name("b.out"), FileRef::same_name("c.out")];
    d.targets = vec![FileRef::same_name("d.out")];
    builder.add_node(d).expect("node 3");

    builder.build()
}
