use super::*;
use flowctl_core::test_support::linear_three_node_dag;
use flowctl_core::NodeId;
use tempfile::tempdir;

#[test]
fn missing_output_finds_the_first_absent_target() {
    let dag = linear_three_node_dag();
    let dir = tempdir().unwrap();
    let node = dag.node(NodeId(0));
    assert_eq!(missing_output(node, dir.path()).as_deref(), Some("a.out"));

    std::fs::write(dir.path().join("a.out"), b"x").unwrap();
    assert_eq!(missing_output(node, dir.path()), None);
}

#[test]
fn clean_exit_with_all_outputs_present_is_success() {
    let info = JobInfo::success(0);
    assert_eq!(decide(&info, None, 0, true, 3), CompletionOutcome::Success);
}

#[test]
fn clean_exit_with_a_missing_output_is_demoted() {
    let info = JobInfo::success(0);
    let outcome = decide(&info, Some("a.out"), 0, true, 3);
    assert_ne!(outcome, CompletionOutcome::Success);
}

#[test]
fn transient_retry_code_retries_even_with_retries_exhausted() {
    let info = JobInfo::success(101);
    assert_eq!(decide(&info, None, 99, false, 0), CompletionOutcome::Retry);
}

#[test]
fn failure_under_the_retry_cap_retries() {
    let info = JobInfo::success(1);
    assert_eq!(decide(&info, None, 1, true, 3), CompletionOutcome::Retry);
}

#[test]
fn failure_at_the_retry_cap_fails_for_good() {
    let info = JobInfo::success(1);
    assert_eq!(decide(&info, None, 3, true, 3), CompletionOutcome::Fail);
}

#[test]
fn failure_with_retries_disabled_fails_immediately() {
    let info = JobInfo::success(1);
    assert_eq!(decide(&info, None, 0, false, 3), CompletionOutcome::Fail);
}

#[test]
fn signalled_job_fails_when_retries_are_exhausted() {
    let info = JobInfo::signalled(9);
    assert_eq!(decide(&info, None, 3, true, 3), CompletionOutcome::Fail);
}
