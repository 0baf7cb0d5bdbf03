use super::*;

#[test]
fn new_is_all_unset() {
    let r = ResourceRequest::new();
    assert_eq!(r.cores, None);
    assert_eq!(r.memory_mb, None);
}

#[test]
fn setters_chain() {
    let r = ResourceRequest::new().cores(4).memory_mb(8192).gpus(1);
    assert_eq!(r.cores, Some(4));
    assert_eq!(r.memory_mb, Some(8192));
    assert_eq!(r.gpus, Some(1));
    assert_eq!(r.disk_mb, None);
}

#[test]
fn min_capacity_ratio_takes_tightest_resource() {
    let request = ResourceRequest::new().cores(2).memory_mb(1024);
    let capacity = ResourceRequest::new().cores(20).memory_mb(4096);
    // cores: ceil(20/2) = 10, memory: ceil(4096/1024) = 4 -> min is 4
    assert_eq!(request.min_capacity_ratio(&capacity), Some(4));
}

#[test]
fn min_capacity_ratio_ignores_resources_absent_on_either_side() {
    let request = ResourceRequest::new().cores(2);
    let capacity = ResourceRequest::new().memory_mb(4096);
    assert_eq!(request.min_capacity_ratio(&capacity), None);
}

#[test]
fn min_capacity_ratio_none_when_nothing_published() {
    let request = ResourceRequest::new();
    let capacity = ResourceRequest::new();
    assert_eq!(request.min_capacity_ratio(&capacity), None);
}
