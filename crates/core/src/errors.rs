// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed error taxonomy for the fleet control plane.
//!
//! Managers return these directly; the control API boundary (see
//! `fleetd-daemon::api::error`) is the only place that maps a kind to an
//! HTTP status. Nothing downstream of a manager should match on a string.

use crate::job::JobId;
use crate::sandbox::{SandboxState, Vmid};
use crate::workspace::WorkspaceId;
use thiserror::Error;

/// Errors from the Sandbox Manager (spec.md §4.1).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("sandbox {0} not found")]
    NotFound(Vmid),

    #[error("invalid transition for sandbox {vmid}: {from:?} -> {to:?}")]
    InvalidTransition { vmid: Vmid, from: SandboxState, to: SandboxState },

    #[error("sandbox {vmid} has running job {job_id}")]
    SandboxInUse { vmid: Vmid, job_id: JobId },

    #[error("sandbox {vmid} is not in a state that can be destroyed: {state:?}")]
    DestroyGated { vmid: Vmid, state: SandboxState },

    #[error("snapshot {name:?} not found for sandbox {vmid}")]
    SnapshotMissing { vmid: Vmid, name: String },

    #[error("sandbox {vmid} snapshot refused: active session (stop it first or pass force)")]
    SnapshotActive { vmid: Vmid },

    #[error("sandbox {vmid} snapshot refused: workspace attached")]
    SnapshotWorkspaceAttached { vmid: Vmid },

    #[error("lease not renewable for sandbox {vmid} in state {state:?}")]
    LeaseNotRenewable { vmid: Vmid, state: SandboxState },

    #[error("could not allocate a unique vmid after {attempts} attempts")]
    VmidAllocationExhausted { attempts: u32 },

    #[error("unknown profile {0:?}")]
    UnknownProfile(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("store error: {0}")]
    Store(String),
}

/// Errors from the Workspace Manager & lease protocol (spec.md §4.2).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("workspace {0} not found")]
    NotFound(WorkspaceId),

    #[error("workspace name {0:?} already exists")]
    AlreadyExists(String),

    #[error("workspace {0} is already attached")]
    Attached(WorkspaceId),

    #[error("workspace {0} is not attached")]
    NotAttached(WorkspaceId),

    #[error("vm {vmid} already holds workspace {other}")]
    VmInUse { vmid: Vmid, other: WorkspaceId },

    #[error("sandbox {0} not found")]
    SandboxNotFound(Vmid),

    #[error("workspace {0} must be detached for this operation")]
    MustBeDetached(WorkspaceId),

    #[error("storage backend does not support this operation: {0}")]
    StorageUnsupported(String),

    #[error(transparent)]
    Lease(#[from] LeaseError),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("store error: {0}")]
    Store(String),
}

/// Conflict details surfaced to clients when attach/lease fails
/// (spec.md §4.2 "Conflict details").
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeaseConflict {
    pub workspace_id: WorkspaceId,
    pub workspace_name: String,
    pub attached_vmid: Option<Vmid>,
    pub lease_owner: Option<String>,
    pub lease_expires_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_wait_seconds: Option<u64>,
}

/// Errors from the workspace lease protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeaseError {
    #[error("workspace lease held: {0:?}")]
    Held(LeaseConflict),

    #[error("timed out waiting for workspace lease")]
    WaitTimeout,

    #[error("lease wait cancelled")]
    Cancelled,

    #[error("wait_seconds <= 0, lease is held")]
    NoWait,
}

/// Errors from the Job Orchestrator (spec.md §4.3).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("job {job_id} is not bound to sandbox {vmid}")]
    SandboxMismatch { job_id: JobId, vmid: Vmid },

    #[error("job {0} has not been provisioned with a sandbox")]
    NotProvisioned(JobId),

    #[error("unknown profile {0:?}")]
    UnknownProfile(String),

    #[error("host mounts are not permitted")]
    HostMountsDisallowed,

    #[error("provisioning timed out after {0:?}")]
    ProvisionTimeout(std::time::Duration),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("store error: {0}")]
    Store(String),
}

/// Errors from the event catalog / recorder (spec.md §4.4).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("unknown event kind {0:?}")]
    UnknownKind(String),

    #[error("missing required field {field:?} for event kind {kind:?}")]
    MissingField { kind: String, field: &'static str },

    #[error("required field {field:?} is empty for event kind {kind:?}")]
    EmptyField { kind: String, field: &'static str },

    #[error("store error: {0}")]
    Store(String),
}
