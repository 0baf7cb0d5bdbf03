use super::*;

#[tokio::test]
async fn every_submission_succeeds_on_next_wait() {
    let queue = NoOpQueue::new();
    let a = queue.submit(&JobSpec::new("anything")).await.unwrap();
    let b = queue.submit(&JobSpec::new("anything else")).await.unwrap();

    let first = queue.wait(Duration::from_secs(0)).await.unwrap();
    let second = queue.wait(Duration::from_secs(0)).await.unwrap();
    let third = queue.wait(Duration::from_secs(0)).await.unwrap();

    assert!(matches!(first, WaitOutcome::Completed(id, _) if id == a));
    assert!(matches!(second, WaitOutcome::Completed(id, _) if id == b));
    assert!(matches!(third, WaitOutcome::None));
}

#[tokio::test]
async fn removed_job_never_completes() {
    let queue = NoOpQueue::new();
    let id = queue.submit(&JobSpec::new("anything")).await.unwrap();
    queue.remove(id).await.unwrap();
    assert!(matches!(
        queue.wait(Duration::from_secs(0)).await.unwrap(),
        WaitOutcome::None
    ));
}
