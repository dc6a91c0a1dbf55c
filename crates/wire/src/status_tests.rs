// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fleetd_core::sandbox::{SandboxState, Vmid};

#[test]
fn not_found_maps_to_404() {
    let err: ApiError = SandboxError::NotFound(Vmid(1000)).into();
    assert_eq!(err.status, 404);
}

#[test]
fn invalid_transition_maps_to_409() {
    let err: ApiError =
        SandboxError::InvalidTransition { vmid: Vmid(1000), from: SandboxState::Requested, to: SandboxState::Running }
            .into();
    assert_eq!(err.status, 409);
}

#[test]
fn backend_error_never_echoes_raw_message() {
    let err: ApiError = SandboxError::Backend("leaked internal detail".into()).into();
    assert_eq!(err.status, 500);
    assert!(!err.message.contains("leaked"));
}

#[test]
fn lease_held_carries_conflict_details() {
    let conflict = fleetd_core::LeaseConflict {
        workspace_id: fleetd_core::WorkspaceId::new(),
        workspace_name: "dev-box".into(),
        attached_vmid: Some(Vmid(1000)),
        lease_owner: Some("job:abc".into()),
        lease_expires_at: Some(60_000),
        workspace_wait_seconds: None,
    };
    let err: ApiError = LeaseError::Held(conflict).into();
    assert_eq!(err.status, 409);
    assert!(err.conflict.is_some());
}

#[test]
fn storage_unsupported_maps_to_400() {
    let err: ApiError = WorkspaceError::StorageUnsupported("clone-from-snapshot".into()).into();
    assert_eq!(err.status, 400);
}

#[test]
fn not_provisioned_maps_to_409() {
    let err: ApiError = JobError::NotProvisioned(fleetd_core::JobId::new()).into();
    assert_eq!(err.status, 409);
}
