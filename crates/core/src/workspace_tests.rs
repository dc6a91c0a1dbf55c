// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_workspace_has_no_lease_and_is_detached() {
    let ws = Workspace::new(WorkspaceId::new(), "dev-box", "local-lvm", "vol-1", 20, 1_000);
    assert!(!ws.is_attached());
    assert!(!ws.lease_held(1_000));
    assert_eq!(ws.created_at, 1_000);
}

#[test]
fn lease_held_respects_expiry() {
    let mut ws = Workspace::new(WorkspaceId::new(), "dev-box", "local-lvm", "vol-1", 20, 0);
    ws.lease_owner = Some("job:job-1".to_string());
    ws.lease_nonce = Some("deadbeef".to_string());
    ws.lease_expires = 1_000;

    assert!(ws.lease_held(999));
    assert!(!ws.lease_held(1_000));
}

#[test]
fn lease_matches_requires_both_owner_and_nonce() {
    let mut ws = Workspace::new(WorkspaceId::new(), "dev-box", "local-lvm", "vol-1", 20, 0);
    ws.lease_owner = Some("job:job-1".to_string());
    ws.lease_nonce = Some("deadbeef".to_string());

    assert!(ws.lease_matches("job:job-1", "deadbeef"));
    assert!(!ws.lease_matches("job:job-1", "other-nonce"));
    assert!(!ws.lease_matches("job:job-2", "deadbeef"));
}

#[test]
fn lease_matches_is_false_with_no_lease() {
    let ws = Workspace::new(WorkspaceId::new(), "dev-box", "local-lvm", "vol-1", 20, 0);
    assert!(!ws.lease_matches("job:job-1", "deadbeef"));
}

#[test]
fn workspace_id_round_trips_through_json() {
    let id = WorkspaceId::new();
    let json = serde_json::to_string(&id).unwrap();
    let decoded: WorkspaceId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, decoded);
}

#[test]
fn builder_produces_attached_workspace() {
    let ws = Workspace::builder().attached_vm(Vmid(1000)).size_gb(40).build();
    assert_eq!(ws.attached_vm, Some(Vmid(1000)));
    assert_eq!(ws.size_gb, 40);
}
