use super::*;
use crate::directory::test_support::FakeDirectory;
use flowctl_core::FakeClock;
use flowctl_queue::test_support::FakeQueue;
use std::time::Duration;

fn manager(name: &str, waiting: u64) -> ManagerSummary {
    ManagerSummary { name: name.to_string(), tasks_waiting: waiting, ..Default::default() }
}

fn base_config() -> PoolConfig {
    PoolConfig {
        manager_pattern: ".*".to_string(),
        foremen_pattern: None,
        min_workers: 2,
        max_workers: 20,
        max_new_workers_per_cycle: 5,
        tasks_per_worker: 5,
        worker_idle_timeout: Duration::from_secs(900),
        cycle_interval: Duration::from_secs(30),
        manager_timeout: Duration::from_secs(900),
        consider_capacity: true,
        worker_command: "worker".to_string(),
        worker_options: None,
        backend: BatchQueueKind::Local,
        backend_requirements: None,
        worker_resources: ResourceRequest::new(),
    }
}

fn new_controller(config: PoolConfig, directory: Arc<FakeDirectory>, queue: Arc<FakeQueue>) -> PoolController<FakeClock> {
    PoolController::new(config, None, directory, queue, FakeClock::new())
}

#[tokio::test]
async fn pool_scaling_matches_the_documented_three_cycle_walkthrough() {
    let directory = Arc::new(FakeDirectory::new());
    directory.set_managers(vec![manager("wq-prod", 50)]);
    let queue = Arc::new(FakeQueue::new());
    let mut controller = new_controller(base_config(), directory, queue);

    let cycle1 = controller.run_once().await.unwrap();
    assert_eq!(cycle1.needed, 10);
    assert_eq!(cycle1.submitted_this_cycle, 5);
    assert_eq!(controller.workers_in_flight(), 5);

    let cycle2 = controller.run_once().await.unwrap();
    assert_eq!(cycle2.needed, 10);
    assert_eq!(cycle2.submitted_this_cycle, 5);
    assert_eq!(controller.workers_in_flight(), 10);

    let cycle3 = controller.run_once().await.unwrap();
    assert_eq!(cycle3.needed, 10);
    assert_eq!(cycle3.submitted_this_cycle, 0);
    assert_eq!(controller.workers_in_flight(), 10);
}

#[tokio::test]
async fn min_workers_floors_demand_from_an_idle_manager() {
    let directory = Arc::new(FakeDirectory::new());
    directory.set_managers(vec![manager("wq-idle", 0)]);
    let queue = Arc::new(FakeQueue::new());
    let mut config = base_config();
    config.min_workers = 3;
    let mut controller = new_controller(config, directory, queue);

    let cycle = controller.run_once().await.unwrap();
    assert_eq!(cycle.needed, 3);
    assert_eq!(cycle.submitted_this_cycle, 3);
}

#[tokio::test]
async fn published_capacity_caps_needed_workers_below_demand() {
    let directory = Arc::new(FakeDirectory::new());
    let mut m = manager("wq-capped", 50);
    m.capacity = CapacityVector { capacity_cores: Some(8), ..Default::default() };
    directory.set_managers(vec![m]);
    let queue = Arc::new(FakeQueue::new());
    let mut config = base_config();
    config.worker_resources.cores = Some(2);
    let mut controller = new_controller(config, directory, queue);

    // Demand alone would be ceil(50/5) = 10, but capacity only fits
    // ceil(8/2) = 4 workers.
    let cycle = controller.run_once().await.unwrap();
    assert_eq!(cycle.needed, 4);
}

#[tokio::test]
async fn published_task_totals_floor_needed_workers_above_demand() {
    let directory = Arc::new(FakeDirectory::new());
    let mut m = manager("wq-heavy", 5);
    m.tasks_total_cores = Some(40);
    directory.set_managers(vec![m]);
    let queue = Arc::new(FakeQueue::new());
    let mut config = base_config();
    config.tasks_per_worker = 5;
    config.worker_resources.cores = Some(2);
    let mut controller = new_controller(config, directory, queue);

    // Demand alone would be ceil(5/5) = 1, but the published core total
    // needs ceil(40/2) = 20 workers' worth of cores.
    let cycle = controller.run_once().await.unwrap();
    assert_eq!(cycle.needed, 20);
}

#[tokio::test]
async fn foremen_fronted_managers_exclude_running_tasks_from_demand() {
    let directory = Arc::new(FakeDirectory::new());
    let mut m = manager("wq-foreman", 5);
    m.has_foremen = true;
    m.tasks_running = 100;
    directory.set_managers(vec![m]);
    let queue = Arc::new(FakeQueue::new());
    let mut controller = new_controller(base_config(), directory, queue);

    // Without foremen, tasks_running would dominate; with foremen present
    // it is excluded per spec §4.3 step 3.
    let cycle = controller.run_once().await.unwrap();
    assert_eq!(cycle.needed, 2); // ceil(5/5) = 1, floored to min_workers = 2
}

#[tokio::test]
async fn reaping_a_completed_worker_frees_capacity_for_the_next_cycle() {
    let directory = Arc::new(FakeDirectory::new());
    directory.set_managers(vec![manager("wq-steady", 25)]);
    let queue = Arc::new(FakeQueue::new());
    let mut controller = new_controller(base_config(), directory, queue.clone());

    let cycle1 = controller.run_once().await.unwrap();
    assert_eq!(cycle1.submitted_this_cycle, 5);
    assert_eq!(controller.workers_in_flight(), 5);

    assert_eq!(queue.submitted().len(), 5);
    queue.push_completion(1, flowctl_core::JobInfo::success(0));

    // Submission happens before reaping within a cycle (spec §4.3 steps
    // 6-7), so a completion scripted for this cycle isn't backfilled
    // until the next one.
    let cycle2 = controller.run_once().await.unwrap();
    assert_eq!(cycle2.submitted_this_cycle, 0);
    assert_eq!(cycle2.reaped, 1);
    assert_eq!(controller.workers_in_flight(), 4);

    let cycle3 = controller.run_once().await.unwrap();
    assert_eq!(cycle3.submitted_this_cycle, 1);
    assert_eq!(controller.workers_in_flight(), 5);
}

#[tokio::test]
async fn blocked_hosts_are_unioned_and_pushed_to_the_queue() {
    let directory = Arc::new(FakeDirectory::new());
    let mut a = manager("wq-a", 0);
    a.workers_blocked = vec!["bad-host-1".to_string()];
    let mut b = manager("wq-b", 0);
    b.workers_blocked = vec!["bad-host-1".to_string(), "bad-host-2".to_string()];
    directory.set_managers(vec![a, b]);
    let queue = Arc::new(FakeQueue::new());
    let mut controller = new_controller(base_config(), directory, queue.clone());

    controller.run_once().await.unwrap();
    assert_eq!(queue.get_option("workers-blocked"), Some("bad-host-1 bad-host-2".to_string()));
}

#[tokio::test]
async fn status_is_published_every_cycle() {
    let directory = Arc::new(FakeDirectory::new());
    directory.set_managers(vec![manager("wq-prod", 10)]);
    let queue = Arc::new(FakeQueue::new());
    let mut controller = new_controller(base_config(), directory.clone(), queue);

    controller.run_once().await.unwrap();
    let published = directory.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].managers.len(), 1);
    assert_eq!(published[0].workers_needed, 2); // ceil(10/5)=2, within [min=2,max=20]
}

#[tokio::test]
async fn no_manager_seen_within_the_timeout_exits_the_cycle_with_an_error() {
    let directory = Arc::new(FakeDirectory::new());
    let queue = Arc::new(FakeQueue::new());
    let mut config = base_config();
    config.manager_timeout = Duration::from_secs(60);
    let clock = FakeClock::new();
    let mut controller = PoolController::new(config, None, directory, queue, clock.clone());

    controller.run_once().await.unwrap(); // no managers yet, but within timeout
    clock.advance(Duration::from_secs(61));
    let result = controller.run_once().await;
    assert!(matches!(result, Err(PoolError::ManagerTimeout(..))));
}

#[tokio::test]
async fn a_directory_query_failure_propagates_and_does_not_submit() {
    let directory = Arc::new(FakeDirectory::new());
    directory.fail_next_queries("catalog unreachable");
    let queue = Arc::new(FakeQueue::new());
    let mut controller = new_controller(base_config(), directory, queue.clone());

    let result = controller.run_once().await;
    assert!(result.is_err());
    assert!(queue.submitted().is_empty());
}
