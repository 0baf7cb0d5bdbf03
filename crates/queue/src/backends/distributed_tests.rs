use super::*;
use tempfile::tempdir;

fn queue() -> DistributedQueue {
    DistributedQueue::new(tempdir().unwrap().into_path())
}

#[tokio::test]
async fn submit_writes_a_task_file_with_tagged_inputs() {
    let q = queue();
    let mut spec = JobSpec::new("echo hi")
        .with_inputs(vec![FileRef::same_name("a.txt"), FileRef::renamed("b.txt", "in.txt")]);
    spec.env.insert("cache:a.txt".to_string(), "yes".to_string());
    let id = q.submit(&spec).await.unwrap();

    let path = q.tasks_dir().join(format!("{id}.json"));
    let contents = std::fs::read_to_string(path).unwrap();
    let task: TaskFile = serde_json::from_str(&contents).unwrap();
    assert_eq!(task.inputs.len(), 2);
    assert!(task.inputs.iter().find(|f| f.outer == "a.txt").unwrap().cached);
    assert!(!task.inputs.iter().find(|f| f.outer == "b.txt").unwrap().cached);
    assert_eq!(
        task.inputs.iter().find(|f| f.outer == "b.txt").unwrap().inner.as_deref(),
        Some("in.txt")
    );
}

#[tokio::test]
async fn wait_with_nothing_submitted_returns_none() {
    let q = queue();
    assert!(matches!(
        q.wait(Duration::from_millis(10)).await.unwrap(),
        WaitOutcome::None
    ));
}

#[tokio::test]
async fn wait_picks_up_a_result_file_and_removes_it() {
    let q = queue();
    let id = q.submit(&JobSpec::new("echo hi")).await.unwrap();

    let result = ResultFile { id, exit_code: Some(0), exit_signal: None, stdout: "hi\n".to_string() };
    std::fs::create_dir_all(q.results_dir()).unwrap();
    std::fs::write(
        q.results_dir().join(format!("{id}.json")),
        serde_json::to_string(&result).unwrap(),
    )
    .unwrap();

    let outcome = q.wait(Duration::from_secs(1)).await.unwrap();
    assert!(matches!(outcome, WaitOutcome::Completed(got, info) if got == id && info.exit_code == Some(0)));
    assert!(!q.results_dir().join(format!("{id}.json")).exists());
}

#[tokio::test]
async fn wait_ignores_results_for_jobs_not_pending() {
    let q = queue();
    std::fs::create_dir_all(q.results_dir()).unwrap();
    let result = ResultFile { id: 999, exit_code: Some(0), exit_signal: None, stdout: String::new() };
    std::fs::write(
        q.results_dir().join("999.json"),
        serde_json::to_string(&result).unwrap(),
    )
    .unwrap();

    assert!(matches!(
        q.wait(Duration::from_millis(10)).await.unwrap(),
        WaitOutcome::None
    ));
}

#[tokio::test]
async fn remove_deletes_the_pending_task_file_and_writes_a_cancel_marker() {
    let q = queue();
    let id = q.submit(&JobSpec::new("echo hi")).await.unwrap();
    q.remove(id).await.unwrap();

    assert!(!q.tasks_dir().join(format!("{id}.json")).exists());
    assert!(q.cancel_dir().join(format!("{id}")).exists());
    assert!(matches!(
        q.wait(Duration::from_millis(10)).await.unwrap(),
        WaitOutcome::None
    ));
}

#[test]
fn supports_feature_reports_sandbox_name_requirement() {
    let q = queue();
    assert_eq!(q.supports_feature("needs-sandbox-names"), Some("yes".to_string()));
    assert_eq!(q.supports_feature("survives-engine-restart"), None);
}
