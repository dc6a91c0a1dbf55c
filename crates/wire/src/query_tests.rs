// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_to_200_limit() {
    let q = parse_events_query(None, None, None).expect("parses");
    assert_eq!(q.limit, 200);
    assert_eq!(q.tail, None);
}

#[test]
fn limit_is_capped_at_1000() {
    let q = parse_events_query(None, None, Some("5000")).expect("parses");
    assert_eq!(q.limit, 1000);
}

#[test]
fn after_and_tail_are_mutually_exclusive() {
    let err = parse_events_query(Some("evt-1"), Some("10"), None).unwrap_err();
    assert!(matches!(err, QueryError::MutuallyExclusive("after", "tail")));
}

#[test]
fn negative_looking_int_is_rejected() {
    let err = parse_events_query(None, Some("-5"), None).unwrap_err();
    assert!(matches!(err, QueryError::InvalidInt("tail")));
}
