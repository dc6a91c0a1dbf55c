// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::sandbox::Vmid;
use crate::workspace::WorkspaceId;
use crate::{JobId, OwnerId, SessionId};

#[test]
fn job_owner_serializes_as_string() {
    let owner = OwnerId::Job(JobId::from_string("job-abc123"));
    assert_eq!(serde_json::to_string(&owner).unwrap(), r#""job:job-abc123""#);
}

#[test]
fn session_owner_round_trips() {
    let original = OwnerId::Session(SessionId::new("sess-xyz"));
    let json = serde_json::to_string(&original).unwrap();
    assert_eq!(json, r#""session:sess-xyz""#);
    let decoded: OwnerId = serde_json::from_str(&json).unwrap();
    assert_eq!(original, decoded);
}

#[test]
fn sandbox_owner_round_trips() {
    let original = OwnerId::Sandbox(Vmid(1042));
    let json = serde_json::to_string(&original).unwrap();
    assert_eq!(json, r#""sandbox:1042""#);
    let decoded: OwnerId = serde_json::from_str(&json).unwrap();
    assert_eq!(original, decoded);
}

#[test]
fn internal_operation_owners_round_trip() {
    let ws = WorkspaceId::from_string("wks-abc");
    for original in [
        OwnerId::snapshot(ws.clone(), 1_700_000_000_000_000_000),
        OwnerId::fork(ws.clone(), 1_700_000_000_000_000_001),
        OwnerId::fsck(ws.clone(), 1_700_000_000_000_000_002),
    ] {
        let json = serde_json::to_string(&original).unwrap();
        let decoded: OwnerId = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }
}

#[test]
fn parse_rejects_unknown_shapes() {
    assert!(OwnerId::parse("bogus:thing").is_none());
    assert!(OwnerId::parse("sandbox:not-a-number").is_none());
    assert!(OwnerId::parse("snapshot:missing-nanos").is_none());
}

#[test]
fn for_job_or_session_prefers_session() {
    let job_id = JobId::from_string("job-1");
    let session_id = SessionId::new("sess-1");
    let owner = OwnerId::for_job_or_session(&job_id, Some(&session_id));
    assert_eq!(owner, OwnerId::Session(session_id));

    let owner = OwnerId::for_job_or_session(&job_id, None);
    assert_eq!(owner, OwnerId::Job(job_id));
}
