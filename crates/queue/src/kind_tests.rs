use super::*;

#[test]
fn roundtrips_through_display_and_from_str() {
    for kind in BatchQueueKind::all() {
        let s = kind.to_string();
        let parsed: BatchQueueKind = s.parse().unwrap();
        assert_eq!(parsed, *kind);
    }
}

#[test]
fn unknown_tag_is_rejected() {
    assert!("made-up-backend".parse::<BatchQueueKind>().is_err());
}

#[test]
fn generic_cluster_tag_is_plain_cluster() {
    assert_eq!(BatchQueueKind::Cluster(ClusterSystem::Generic).tag(), "cluster");
}

#[test]
fn cluster_system_display() {
    assert_eq!(ClusterSystem::Slurm.to_string(), "slurm");
}
