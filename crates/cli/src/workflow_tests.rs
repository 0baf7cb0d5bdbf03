use super::*;
use flowctl_core::NodeKind;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_workflow(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn a_minimal_single_node_workflow_loads() {
    let file = write_workflow(r#"{"nodes": [{"command": "touch out.txt", "targets": ["out.txt"]}]}"#);
    let dag = load_dag(file.path()).unwrap();
    assert_eq!(dag.nodes.len(), 1);
    assert_eq!(dag.nodes[0].command, "touch out.txt");
    assert_eq!(dag.nodes[0].targets[0].outer, "out.txt");
}

#[test]
fn an_outer_equals_inner_rename_is_split_on_the_first_equals() {
    let file = write_workflow(r#"{"nodes": [{"command": "cp a b", "sources": ["a.txt=in.txt"], "targets": ["b.txt"]}]}"#);
    let dag = load_dag(file.path()).unwrap();
    let source = &dag.nodes[0].sources[0];
    assert_eq!(source.outer, "a.txt");
    assert_eq!(source.inner.as_deref(), Some("in.txt"));
}

#[test]
fn two_nodes_claiming_the_same_target_is_rejected() {
    let file = write_workflow(
        r#"{"nodes": [
            {"command": "a", "targets": ["shared.txt"]},
            {"command": "b", "targets": ["shared.txt"]}
        ]}"#,
    );
    let err = load_dag(file.path()).unwrap_err();
    assert!(matches!(err, CliError::Core(flowctl_core::CoreError::DuplicateTarget { .. })));
}

#[test]
fn a_node_naming_an_undeclared_category_is_rejected() {
    let file = write_workflow(r#"{"nodes": [{"command": "a", "category": "gpu-heavy"}]}"#);
    let err = load_dag(file.path()).unwrap_err();
    assert!(matches!(err, CliError::Core(flowctl_core::CoreError::UnknownCategory(_))));
}

#[test]
fn a_node_may_reference_a_declared_category() {
    let file = write_workflow(
        r#"{
            "categories": [{"name": "gpu-heavy", "resources": {"gpus": 2}}],
            "nodes": [{"command": "a", "category": "gpu-heavy"}]
        }"#,
    );
    let dag = load_dag(file.path()).unwrap();
    assert_eq!(dag.nodes[0].category.as_str(), "gpu-heavy");
    assert_eq!(dag.category("gpu-heavy").unwrap().resources.gpus, Some(2));
}

#[test]
fn an_unknown_default_category_is_rejected() {
    let file = write_workflow(r#"{"default_category": "missing", "nodes": [{"command": "a"}]}"#);
    let err = load_dag(file.path()).unwrap_err();
    assert!(matches!(err, CliError::UnknownDefaultCategory(ref name) if name == "missing"));
}

#[test]
fn a_workflow_typed_node_carries_its_sub_workflow_path() {
    let file = write_workflow(r#"{"nodes": [{"command": "true", "workflow": "sub/inner.json"}]}"#);
    let dag = load_dag(file.path()).unwrap();
    match &dag.nodes[0].kind {
        NodeKind::Workflow(path) => assert_eq!(path.to_str().unwrap(), "sub/inner.json"),
        other => panic!("expected a workflow node, got {other:?}"),
    }
}

#[test]
fn exported_env_names_are_carried_onto_the_dag() {
    let file = write_workflow(r#"{"exported_env": ["PATH", "HOME"], "nodes": [{"command": "a"}]}"#);
    let dag = load_dag(file.path()).unwrap();
    assert_eq!(dag.exported_env, vec!["PATH".to_string(), "HOME".to_string()]);
}
