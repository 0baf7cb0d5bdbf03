use super::*;
use flowctl_core::test_support::{diamond_dag, linear_three_node_dag};
use flowctl_core::NodeId;

#[test]
fn first_node_of_a_linear_dag_is_ready_immediately() {
    let dag = linear_three_node_dag();
    assert!(is_ready(&dag, NodeId(0)));
    assert!(!is_ready(&dag, NodeId(1)));
}

#[test]
fn diamond_join_node_waits_for_both_parents() {
    let mut dag = diamond_dag();
    // node 3 is the join; until both of its parents complete it isn't ready.
    assert!(!is_ready(&dag, NodeId(3)));
    dag.node_mut(NodeId(1)).state = NodeState::Complete;
    assert!(!is_ready(&dag, NodeId(3)));
    dag.node_mut(NodeId(2)).state = NodeState::Complete;
    assert!(is_ready(&dag, NodeId(3)));
}

#[test]
fn a_non_waiting_node_is_never_ready() {
    let mut dag = linear_three_node_dag();
    dag.node_mut(NodeId(0)).state = NodeState::Running;
    assert!(!is_ready(&dag, NodeId(0)));
}

#[test]
fn scheduler_tracks_capacity_per_placement() {
    let mut sched = Scheduler::new();
    assert!(sched.has_capacity(Placement::Local, 1, 1));
    sched.record_dispatch(1, NodeId(0), Placement::Local);
    assert!(!sched.has_capacity(Placement::Local, 1, 1));
    assert!(sched.has_capacity(Placement::Remote, 1, 1));

    let node = sched.record_completion(1, Placement::Local);
    assert_eq!(node, Some(NodeId(0)));
    assert!(sched.has_capacity(Placement::Local, 1, 1));
    assert!(sched.is_empty());
}

#[test]
fn record_completion_for_unknown_job_returns_none() {
    let mut sched = Scheduler::new();
    assert_eq!(sched.record_completion(42, Placement::Local), None);
}
