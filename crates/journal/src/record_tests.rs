use super::*;

#[test]
fn header_round_trips_through_to_line_and_parse() {
    let header = NodeHeader {
        node_id: NodeId(3),
        command: "cat a.txt b.txt > c.txt".to_string(),
        parents: vec![NodeId(0), NodeId(1)],
    };
    let line = header.to_line();
    let parsed = parse_line(1, &line).unwrap();
    assert_eq!(parsed, Record::Header(header));
}

#[test]
fn header_with_no_parents_round_trips() {
    let header = NodeHeader { node_id: NodeId(0), command: "true".to_string(), parents: vec![] };
    let parsed = parse_line(1, &header.to_line()).unwrap();
    assert_eq!(parsed, Record::Header(header));
}

#[test]
fn transition_round_trips_through_to_line_and_parse() {
    let transition = Transition {
        timestamp_ms: 1_700_000_000_000,
        node_id: NodeId(2),
        state: NodeState::Complete,
        job_id: 17,
        counts: StateCounts { waiting: 0, running: 1, complete: 2, failed: 0, aborted: 0, total: 3 },
    };
    let line = transition.to_line();
    let parsed = parse_line(1, &line).unwrap();
    assert_eq!(parsed, Record::Transition(transition));
}

#[test]
fn transition_with_negative_job_id_round_trips() {
    let transition = Transition {
        timestamp_ms: 5,
        node_id: NodeId(1),
        state: NodeState::Failed,
        job_id: -1,
        counts: StateCounts { waiting: 0, running: 0, complete: 0, failed: 1, aborted: 0, total: 1 },
    };
    let parsed = parse_line(1, &transition.to_line()).unwrap();
    assert_eq!(parsed, Record::Transition(transition));
}

#[test]
fn malformed_data_line_is_corruption_not_silently_skipped() {
    let err = parse_line(4, "not a valid journal line").unwrap_err();
    assert!(matches!(err, JournalError::Corruption { line_no: 4, .. }));
}

#[test]
fn data_line_with_wrong_field_count_is_corruption() {
    let err = parse_line(1, "1 2 3").unwrap_err();
    assert!(matches!(err, JournalError::Corruption { .. }));
}

#[test]
fn data_line_with_out_of_range_state_code_is_corruption() {
    let err = parse_line(1, "1 0 9 0 0 0 0 0 0 1").unwrap_err();
    assert!(matches!(err, JournalError::Corruption { .. }));
}

#[test]
fn header_missing_command_field_is_corruption() {
    let err = parse_line(1, "# 3").unwrap_err();
    assert!(matches!(err, JournalError::Corruption { .. }));
}
