//! Spec §8 scenarios 1 and 2: linear and diamond DAGs run to completion
//! against the real `local` backend.

use crate::harness::Workspace;

#[test]
fn linear_three_node_dag_executes_in_order() {
    let ws = Workspace::new();
    ws.write(
        "workflow.json",
        r#"{
            "nodes": [
                {"command": "touch a.out", "targets": ["a.out"], "local": true},
                {"command": "touch b.out", "sources": ["a.out"], "targets": ["b.out"], "local": true},
                {"command": "touch c.out", "sources": ["b.out"], "targets": ["c.out"], "local": true}
            ]
        }"#,
    );

    ws.flowctl().args(["run", "workflow.json", "--batch-type", "local", "--local-jobs", "1"]).assert().success();

    assert!(ws.exists("a.out"));
    assert!(ws.exists("b.out"));
    assert!(ws.exists("c.out"));
    assert!(ws.exists("workflow.json.flowctl.journal"));
}

#[test]
fn diamond_dag_runs_both_middle_branches_before_the_join() {
    let ws = Workspace::new();
    ws.write(
        "workflow.json",
        r#"{
            "nodes": [
                {"command": "touch a.out", "targets": ["a.out"], "local": true},
                {"command": "touch b.out", "sources": ["a.out"], "targets": ["b.out"], "local": true},
                {"command": "touch c.out", "sources": ["a.out"], "targets": ["c.out"], "local": true},
                {"command": "touch d.out", "sources": ["b.out", "c.out"], "targets": ["d.out"], "local": true}
            ]
        }"#,
    );

    ws.flowctl().args(["run", "workflow.json", "--batch-type", "local", "--local-jobs", "2"]).assert().success();

    for name in ["a.out", "b.out", "c.out", "d.out"] {
        assert!(ws.exists(name), "{name} should have been produced");
    }
}

#[test]
fn a_non_zero_exit_surfaces_as_a_non_zero_process_exit_code() {
    let ws = Workspace::new();
    ws.write(
        "workflow.json",
        r#"{"nodes": [{"command": "exit 7", "local": true}]}"#,
    );

    ws.flowctl().args(["run", "workflow.json", "--batch-type", "local", "--retry-max", "0"]).assert().failure();
}
