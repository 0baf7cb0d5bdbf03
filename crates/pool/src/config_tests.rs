use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_apply_to_an_empty_file() {
    let file = write_config("");
    let config = PoolConfig::load(file.path()).unwrap();
    assert_eq!(config.manager_pattern, ".*");
    assert_eq!(config.min_workers, 0);
    assert_eq!(config.max_workers, 100);
    assert_eq!(config.tasks_per_worker, 1);
    assert_eq!(config.cycle_interval, Duration::from_secs(30));
    assert_eq!(config.backend, BatchQueueKind::Local);
}

#[test]
fn a_partial_file_overrides_only_what_it_names() {
    let file = write_config(
        r#"
        manager_pattern = "prod-.*"
        min_workers = 2
        max_workers = 20
        worker_cores = 4
        "#,
    );
    let config = PoolConfig::load(file.path()).unwrap();
    assert_eq!(config.manager_pattern, "prod-.*");
    assert_eq!(config.min_workers, 2);
    assert_eq!(config.max_workers, 20);
    assert_eq!(config.worker_resources.cores, Some(4));
    // Untouched fields keep their defaults.
    assert_eq!(config.max_new_workers_per_cycle, 10);
}

#[test]
fn min_greater_than_max_is_rejected() {
    let file = write_config("min_workers = 10\nmax_workers = 5\n");
    assert!(PoolConfig::load(file.path()).is_err());
}

#[test]
fn an_unparseable_pattern_is_rejected() {
    let file = write_config(r#"manager_pattern = "(unclosed""#);
    assert!(PoolConfig::load(file.path()).is_err());
}

#[test]
fn an_unknown_backend_tag_is_rejected() {
    let file = write_config(r#"backend = "not-a-real-backend""#);
    assert!(PoolConfig::load(file.path()).is_err());
}

#[test]
fn an_unknown_key_is_rejected() {
    let file = write_config("totally_made_up_field = 1\n");
    assert!(PoolConfig::load(file.path()).is_err());
}
