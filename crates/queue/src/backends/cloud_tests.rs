use super::*;

#[test]
fn idle_timeout_defaults_to_zero_when_unset() {
    let q = CloudQueue::new();
    assert_eq!(q.idle_timeout(), Duration::ZERO);
}

#[test]
fn idle_timeout_parses_configured_seconds() {
    let q = CloudQueue::new();
    q.set_option("idle-timeout-s", "120");
    assert_eq!(q.idle_timeout(), Duration::from_secs(120));
}

#[test]
fn take_warm_instance_is_none_without_idle_timeout_configured() {
    let q = CloudQueue::new();
    q.idle_pool.lock().push(Instance { address: "host".into(), idle_since: None });
    assert!(q.take_warm_instance().is_none());
}

#[tokio::test(start_paused = true)]
async fn take_warm_instance_skips_entries_past_the_idle_timeout() {
    let q = CloudQueue::new();
    q.set_option("idle-timeout-s", "60");
    q.idle_pool.lock().push(Instance {
        address: "host".into(),
        idle_since: Some(tokio::time::Instant::now()),
    });
    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(q.take_warm_instance().is_none());
}

#[tokio::test(start_paused = true)]
async fn take_warm_instance_returns_fresh_entries() {
    let q = CloudQueue::new();
    q.set_option("idle-timeout-s", "60");
    q.idle_pool.lock().push(Instance {
        address: "host".into(),
        idle_since: Some(tokio::time::Instant::now()),
    });
    tokio::time::advance(Duration::from_secs(10)).await;
    let instance = q.take_warm_instance();
    assert_eq!(instance.unwrap().address, "host");
}

#[tokio::test]
async fn provision_without_command_configured_is_unsupported() {
    let q = CloudQueue::new();
    let err = q.provision().await.unwrap_err();
    assert!(matches!(err, QueueError::Unsupported(_)));
}

#[tokio::test]
async fn submit_without_provision_command_fails_fast() {
    let q = CloudQueue::new();
    let err = q.submit(&JobSpec::new("echo hi")).await.unwrap_err();
    assert!(matches!(err, QueueError::Unsupported(_)));
}
