// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace identifier and row (spec.md §3, §4.2).
//!
//! A workspace is a persistent block volume attachable to at most one
//! sandbox at a time. `attached_vm` and the lease fields are the two
//! pieces of mutable state the Workspace Manager and lease protocol
//! arbitrate; everything else (the volume and its snapshots) lives in the
//! hypervisor backend.

use crate::sandbox::Vmid;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a workspace (persistent block volume).
    pub struct WorkspaceId("wks-");
}

/// A workspace row (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub storage: String,
    pub volume_id: String,
    pub size_gb: u32,
    pub attached_vm: Option<Vmid>,
    #[serde(default)]
    pub lease_owner: Option<String>,
    #[serde(default)]
    pub lease_nonce: Option<String>,
    /// Zero means "no lease".
    #[serde(default)]
    pub lease_expires: u64,
    pub created_at: u64,
    pub last_updated_at: u64,
}

impl Workspace {
    pub fn new(
        id: WorkspaceId,
        name: impl Into<String>,
        storage: impl Into<String>,
        volume_id: impl Into<String>,
        size_gb: u32,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            storage: storage.into(),
            volume_id: volume_id.into(),
            size_gb,
            attached_vm: None,
            lease_owner: None,
            lease_nonce: None,
            lease_expires: 0,
            created_at: now_ms,
            last_updated_at: now_ms,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached_vm.is_some()
    }

    /// Is there a live lease (owner+nonce set and not expired) as of `now_ms`?
    pub fn lease_held(&self, now_ms: u64) -> bool {
        self.lease_owner.is_some() && self.lease_expires > now_ms
    }

    /// Does `(owner, nonce)` match the current lease holder, regardless of
    /// expiry? Used by `Renew`/`Release`, which are owner+nonce scoped.
    pub fn lease_matches(&self, owner: &str, nonce: &str) -> bool {
        self.lease_owner.as_deref() == Some(owner) && self.lease_nonce.as_deref() == Some(nonce)
    }
}

crate::builder! {
    pub struct WorkspaceBuilder => Workspace {
        into {
            name: String = "test-workspace",
            storage: String = "local-lvm",
            volume_id: String = "vol-test",
        }
        set {
            size_gb: u32 = 20,
            lease_expires: u64 = 0,
            created_at: u64 = 0,
            last_updated_at: u64 = 0,
        }
        option {
            attached_vm: Vmid = None,
            lease_owner: String = None,
            lease_nonce: String = None,
        }
        computed {
            id: WorkspaceId = WorkspaceId::new(),
        }
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
