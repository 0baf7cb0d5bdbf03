use super::*;

#[test]
fn new_node_starts_waiting_and_remote() {
    let n = Node::new(NodeId(3), "echo hi");
    assert_eq!(n.state, NodeState::Waiting);
    assert!(!n.is_local());
    assert!(!n.is_terminal());
}

#[test]
fn state_code_roundtrips() {
    for state in NodeState::ALL {
        assert_eq!(NodeState::from_code(state.code()), Some(state));
    }
}

#[test]
fn from_code_rejects_out_of_range() {
    assert_eq!(NodeState::from_code(9), None);
}

#[test]
fn terminal_states() {
    let mut n = Node::new(NodeId(1), "true");
    for state in [NodeState::Complete, NodeState::Failed, NodeState::Aborted] {
        n.state = state;
        assert!(n.is_terminal());
    }
    for state in [NodeState::Waiting, NodeState::Running] {
        n.state = state;
        assert!(!n.is_terminal());
    }
}

#[test]
fn job_info_transient_retry_exit_code() {
    let info = JobInfo::success(101);
    assert!(info.is_transient_retry());
    let ordinary_failure = JobInfo::success(1);
    assert!(!ordinary_failure.is_transient_retry());
}

#[test]
fn content_hash_is_stable_under_source_reordering() {
    let mut a = NodeBuilder::default().command("cat x y > z").build();
    a.sources = vec![FileRef::same_name("x"), FileRef::same_name("y")];
    a.targets = vec![FileRef::same_name("z")];

    let mut b = a.clone();
    b.sources.reverse();

    assert_eq!(a.content_hash(), b.content_hash());
}

#[test]
fn content_hash_differs_when_command_changes() {
    let a = NodeBuilder::default().command("cat x").build();
    let b = NodeBuilder::default().command("cat y").build();
    assert_ne!(a.content_hash(), b.content_hash());
}

#[test]
fn node_builder_defaults() {
    let n = NodeBuilder::default().id(NodeId(7)).build();
    assert_eq!(n.id, NodeId(7));
    assert_eq!(n.category, crate::category::DEFAULT_CATEGORY);
}
