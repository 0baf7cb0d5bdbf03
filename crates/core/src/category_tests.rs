use super::*;

#[test]
fn new_category_defaults_to_max_throughput() {
    let cat = Category::new("big-jobs");
    assert_eq!(cat.allocation_mode, AllocationMode::MaxThroughput);
    assert!(cat.scope.is_empty());
}

#[test]
fn allocation_mode_display() {
    assert_eq!(AllocationMode::MinWaste.to_string(), "min-waste");
    assert_eq!(AllocationMode::Fixed.to_string(), "fixed");
}
