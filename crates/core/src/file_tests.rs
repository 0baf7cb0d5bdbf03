use super::*;

#[test]
fn same_name_has_no_inner() {
    let f = FileRef::same_name("a.txt");
    assert_eq!(f.outer, "a.txt");
    assert_eq!(f.inner, None);
}

#[test]
fn renamed_carries_inner() {
    let f = FileRef::renamed("a.txt", "a_txt");
    assert_eq!(f.inner.as_deref(), Some("a_txt"));
}

#[test]
fn new_record_is_external_until_a_creator_is_set() {
    let mut rec = FileRecord::new("out.txt");
    assert!(rec.is_external());
    rec.creator = Some(NodeId(0));
    assert!(!rec.is_external());
}
