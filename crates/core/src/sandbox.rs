// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox identifier and lifecycle state machine (spec.md §3, §4.1).
//!
//! A sandbox is a VM cloned from a template on the hypervisor backend.
//! `Vmid` allocation and the `SandboxState` transition table are the
//! invariants the Sandbox Manager enforces; this module only carries the
//! pure data + table, not the I/O that drives it.

use crate::job::JobId;
use crate::workspace::WorkspaceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest VMID ever allocated. Spec.md §3: "VMIDs are allocated ≥ 1000."
pub const VMID_MIN: u32 = 1000;

/// Maximum number of uniqueness-collision retries during allocation.
pub const VMID_ALLOC_RETRIES: u32 = 5;

/// Numeric identifier for a sandbox VM. Unique, monotonically allocated,
/// never reused once a row has been written (destroyed rows are retained
/// for audit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vmid(pub u32);

impl Vmid {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Vmid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Vmid {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Canonical sandbox lifecycle states (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxState {
    Requested,
    Provisioning,
    Booting,
    Ready,
    Running,
    Suspended,
    Completed,
    Failed,
    Timeout,
    Stopped,
    Destroyed,
}

crate::simple_display! {
    SandboxState {
        Requested => "requested",
        Provisioning => "provisioning",
        Booting => "booting",
        Ready => "ready",
        Running => "running",
        Suspended => "suspended",
        Completed => "completed",
        Failed => "failed",
        Timeout => "timeout",
        Stopped => "stopped",
        Destroyed => "destroyed",
    }
}

impl SandboxState {
    /// Is this a state from which `Destroy` (without force) is allowed?
    /// spec.md §4.1: "requires terminal-compatible states (STOPPED,
    /// COMPLETED, FAILED, TIMEOUT, DESTROYED)."
    pub fn destroy_compatible(self) -> bool {
        matches!(
            self,
            SandboxState::Stopped
                | SandboxState::Completed
                | SandboxState::Failed
                | SandboxState::Timeout
                | SandboxState::Destroyed
        )
    }

    /// States from which snapshot operations are refused outright
    /// regardless of `force` (still mid-provisioning).
    pub fn snapshot_forbidden(self) -> bool {
        matches!(self, SandboxState::Requested | SandboxState::Provisioning | SandboxState::Booting)
    }

    /// Is this sandbox considered "healthy" by the event projection
    /// (spec.md §4.4)?
    pub fn healthy(self) -> bool {
        matches!(
            self,
            SandboxState::Running
                | SandboxState::Ready
                | SandboxState::Suspended
                | SandboxState::Stopped
                | SandboxState::Completed
        )
    }

    /// Validate `self -> to` against the transition table in spec.md §4.1.
    /// Returns `true` if the transition is allowed.
    pub fn can_transition_to(self, to: SandboxState) -> bool {
        use SandboxState::*;
        match (self, to) {
            (Requested, Provisioning | Failed | Destroyed) => true,
            (Provisioning, Booting | Failed | Destroyed) => true,
            (Booting, Ready | Failed | Timeout | Destroyed) => true,
            (Ready, Running | Stopped | Failed | Destroyed) => true,
            (Running, Completed | Failed | Timeout | Stopped | Destroyed) => true,
            (Stopped, Running | Destroyed) => true,
            (Completed | Failed | Timeout, Destroyed) => true,
            (Destroyed, _) => false,
            _ => false,
        }
    }
}

/// A sandbox VM row (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sandbox {
    pub vmid: Vmid,
    pub name: String,
    pub profile: String,
    pub state: SandboxState,
    /// Guest IP, empty until discovered.
    #[serde(default)]
    pub ip: String,
    pub workspace_id: Option<WorkspaceId>,
    /// A job may be bound to the sandbox for the duration of its run.
    pub job_id: Option<JobId>,
    pub keepalive: bool,
    /// Zero means "no lease".
    #[serde(default)]
    pub lease_expires: u64,
    pub last_used_at: u64,
    pub created_at: u64,
    pub last_updated_at: u64,
}

impl Sandbox {
    pub fn new(vmid: Vmid, name: impl Into<String>, profile: impl Into<String>, now_ms: u64) -> Self {
        Self {
            vmid,
            name: name.into(),
            profile: profile.into(),
            state: SandboxState::Requested,
            ip: String::new(),
            workspace_id: None,
            job_id: None,
            keepalive: false,
            lease_expires: 0,
            last_used_at: now_ms,
            created_at: now_ms,
            last_updated_at: now_ms,
        }
    }

    /// Has the lease expired as of `now_ms`? A zero `lease_expires` means
    /// "no lease", which is never considered expired.
    pub fn lease_expired(&self, now_ms: u64) -> bool {
        self.lease_expires != 0 && self.lease_expires < now_ms
    }
}

crate::builder! {
    pub struct SandboxBuilder => Sandbox {
        set {
            vmid: Vmid = Vmid(1000),
            state: SandboxState = SandboxState::Requested,
            keepalive: bool = false,
            lease_expires: u64 = 0,
            last_used_at: u64 = 0,
            created_at: u64 = 0,
            last_updated_at: u64 = 0,
        }
        into {
            name: String = "test-sandbox",
            profile: String = "default",
            ip: String = "",
        }
        option {
            workspace_id: WorkspaceId = None,
            job_id: JobId = None,
        }
    }
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
