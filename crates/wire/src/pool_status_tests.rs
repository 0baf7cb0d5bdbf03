use super::*;

#[test]
fn new_sets_the_pool_identity_tag() {
    let status = PoolStatus::new(Some("widgets.*".to_string()), None);
    assert_eq!(status.kind, POOL_IDENTITY_TAG);
}

#[test]
fn serializes_kind_field_as_type() {
    let status = PoolStatus::new(None, None);
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["type"], "wq_factory");
}

#[test]
fn round_trips_with_manager_summaries_through_json() {
    let mut status = PoolStatus::new(Some("p".to_string()), Some("s".to_string()));
    status.managers.push(ManagerSummary { name: "m1".to_string(), ..Default::default() });
    status.workers_submitted = 5;
    status.workers_needed = 10;

    let json = serde_json::to_string(&status).unwrap();
    let back: PoolStatus = serde_json::from_str(&json).unwrap();
    assert_eq!(status, back);
}
