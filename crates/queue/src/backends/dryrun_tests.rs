use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn submit_writes_command_to_script_and_succeeds_immediately() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("plan.sh");
    let queue = DryRunQueue::new();
    queue.set_option("dryrun-script", script.to_str().unwrap());

    let id = queue.submit(&JobSpec::new("echo hi")).await.unwrap();
    let outcome = queue.wait(Duration::from_secs(0)).await.unwrap();
    match outcome {
        WaitOutcome::Completed(completed, info) => {
            assert_eq!(completed, id);
            assert!(info.exited_normally);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let contents = std::fs::read_to_string(&script).unwrap();
    assert!(contents.contains("echo hi"));
}

#[tokio::test]
async fn wait_with_nothing_pending_returns_none() {
    let queue = DryRunQueue::new();
    assert!(matches!(
        queue.wait(Duration::from_secs(0)).await.unwrap(),
        WaitOutcome::None
    ));
}
