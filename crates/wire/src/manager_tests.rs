use super::*;

#[test]
fn manager_summary_round_trips_through_json() {
    let summary = ManagerSummary {
        name: "prod-manager".to_string(),
        project: Some("widgets".to_string()),
        has_foremen: false,
        tasks_waiting: 50,
        tasks_on_workers: 3,
        tasks_left: 0,
        tasks_running: 3,
        tasks_total_cores: Some(200),
        tasks_total_memory: None,
        tasks_total_disk: None,
        tasks_total_gpus: None,
        capacity: CapacityVector { capacity_cores: Some(16), ..Default::default() },
        workers_blocked: vec!["bad-host".to_string()],
    };
    let json = serde_json::to_string(&summary).unwrap();
    let back: ManagerSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(summary, back);
}

#[test]
fn missing_optional_fields_deserialize_as_none() {
    let json = r#"{"name":"m","has_foremen":false,"tasks_waiting":0,"tasks_on_workers":0,
        "tasks_left":0,"tasks_running":0,"capacity":{},"workers_blocked":[]}"#;
    let summary: ManagerSummary = serde_json::from_str(json).unwrap();
    assert!(summary.project.is_none());
    assert!(summary.capacity.capacity_cores.is_none());
}
