// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy → HTTP status mapping (spec.md §7). This is the only
//! place in the repository that turns a manager's typed error into a
//! status code; managers themselves never know about HTTP.

use fleetd_core::{EventError, JobError, LeaseError, SandboxError, WorkspaceError};

/// A manager error plus the HTTP status and redacted message the Control
/// API surface should respond with. Never carries raw backend/store error
/// text in the 5xx case (spec.md §7: "Server-side (5xx) responses never
/// echo raw error details to clients").
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub conflict: Option<fleetd_core::LeaseConflict>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), conflict: None }
    }

    pub fn with_conflict(status: u16, message: impl Into<String>, conflict: fleetd_core::LeaseConflict) -> Self {
        Self { status, message: message.into(), conflict: Some(conflict) }
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

pub fn unauthorized(message: impl Into<String>) -> ApiError {
    ApiError::new(401, message)
}

pub fn forbidden(message: impl Into<String>) -> ApiError {
    ApiError::new(403, message)
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::new(400, message)
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    ApiError::new(404, message)
}

pub fn unavailable(message: impl Into<String>) -> ApiError {
    ApiError::new(503, message)
}

impl From<SandboxError> for ApiError {
    fn from(err: SandboxError) -> Self {
        match &err {
            SandboxError::NotFound(_) => ApiError::new(404, err.to_string()),
            SandboxError::UnknownProfile(_) => ApiError::new(400, err.to_string()),
            SandboxError::InvalidTransition { .. }
            | SandboxError::DestroyGated { .. }
            | SandboxError::SnapshotMissing { .. }
            | SandboxError::SnapshotActive { .. }
            | SandboxError::SnapshotWorkspaceAttached { .. }
            | SandboxError::LeaseNotRenewable { .. } => ApiError::new(409, err.to_string()),
            SandboxError::SandboxInUse { .. } => ApiError::new(409, err.to_string()),
            SandboxError::VmidAllocationExhausted { .. } => ApiError::new(503, err.to_string()),
            SandboxError::Backend(_) | SandboxError::Store(_) => ApiError::new(500, "internal error"),
        }
    }
}

impl From<WorkspaceError> for ApiError {
    fn from(err: WorkspaceError) -> Self {
        match &err {
            WorkspaceError::NotFound(_) | WorkspaceError::SandboxNotFound(_) => ApiError::new(404, err.to_string()),
            WorkspaceError::AlreadyExists(_) => ApiError::new(409, err.to_string()),
            WorkspaceError::Attached(_) | WorkspaceError::NotAttached(_) | WorkspaceError::VmInUse { .. } => {
                ApiError::new(409, err.to_string())
            }
            WorkspaceError::MustBeDetached(_) => ApiError::new(409, err.to_string()),
            WorkspaceError::StorageUnsupported(_) => ApiError::new(400, err.to_string()),
            WorkspaceError::Lease(lease_err) => lease_err.clone().into(),
            WorkspaceError::Backend(_) | WorkspaceError::Store(_) => ApiError::new(500, "internal error"),
        }
    }
}

impl From<LeaseError> for ApiError {
    fn from(err: LeaseError) -> Self {
        match err {
            LeaseError::Held(conflict) => ApiError::with_conflict(409, "workspace lease held", conflict),
            LeaseError::WaitTimeout => ApiError::new(409, "timed out waiting for workspace lease"),
            LeaseError::Cancelled => ApiError::new(409, "lease wait cancelled"),
            LeaseError::NoWait => ApiError::new(409, "workspace lease held, no wait requested"),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match &err {
            JobError::NotFound(_) => ApiError::new(404, err.to_string()),
            JobError::NotProvisioned(_) => ApiError::new(409, err.to_string()),
            JobError::UnknownProfile(_) => ApiError::new(400, err.to_string()),
            JobError::HostMountsDisallowed => ApiError::new(400, err.to_string()),
            JobError::SandboxMismatch { .. } => ApiError::new(409, err.to_string()),
            JobError::ProvisionTimeout(_) => ApiError::new(503, err.to_string()),
            JobError::Workspace(inner) => inner.clone().into(),
            JobError::Sandbox(inner) => inner.clone().into(),
            JobError::Backend(_) | JobError::Store(_) => ApiError::new(500, "internal error"),
        }
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        match &err {
            EventError::UnknownKind(_) | EventError::MissingField { .. } | EventError::EmptyField { .. } => {
                ApiError::new(400, err.to_string())
            }
            EventError::Store(_) => ApiError::new(500, "internal error"),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
