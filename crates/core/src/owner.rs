// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace lease owner namespacing (spec.md §4.2).
//!
//! Every lease holder identifies itself with one of a small, fixed set of
//! owner-string shapes. These must be reproduced verbatim — clients and
//! the projection parse them back out of event payloads and conflict
//! details, so the `Display` impl below is the single source of truth.

use crate::job::JobId;
use crate::sandbox::Vmid;
use crate::session::SessionId;
use crate::workspace::WorkspaceId;
use std::fmt;

/// Identifies who holds (or is waiting for) a workspace lease.
///
/// Serializes via `Display`/[`OwnerId::parse`] as the exact owner strings
/// named in spec.md §4.2:
/// - `job:<job_id>` — a job running without a session
/// - `session:<session_id>` — a session-scoped hold
/// - `sandbox:<vmid>` — a rebind-managed hold
/// - `snapshot:<workspace_id>:<unix_nanos>` — an internal snapshot operation
/// - `fork:<workspace_id>:<unix_nanos>` — an internal fork operation
/// - `fsck:<workspace_id>:<unix_nanos>` — an internal fsck operation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerId {
    Job(JobId),
    Session(SessionId),
    Sandbox(Vmid),
    Snapshot { workspace_id: WorkspaceId, nanos: u128 },
    Fork { workspace_id: WorkspaceId, nanos: u128 },
    Fsck { workspace_id: WorkspaceId, nanos: u128 },
}

impl serde::Serialize for OwnerId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for OwnerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OwnerId::parse(&s).ok_or_else(|| serde::de::Error::custom(InvalidOwnerId(s)))
    }
}

impl OwnerId {
    pub fn job(id: JobId) -> Self {
        OwnerId::Job(id)
    }

    pub fn session(id: SessionId) -> Self {
        OwnerId::Session(id)
    }

    pub fn sandbox(vmid: Vmid) -> Self {
        OwnerId::Sandbox(vmid)
    }

    pub fn snapshot(workspace_id: WorkspaceId, nanos: u128) -> Self {
        OwnerId::Snapshot { workspace_id, nanos }
    }

    pub fn fork(workspace_id: WorkspaceId, nanos: u128) -> Self {
        OwnerId::Fork { workspace_id, nanos }
    }

    pub fn fsck(workspace_id: WorkspaceId, nanos: u128) -> Self {
        OwnerId::Fsck { workspace_id, nanos }
    }

    /// Owner for a job acquiring a workspace lease: scoped by session if
    /// one is bound, else scoped by job id directly (spec.md §4.3 step 2).
    pub fn for_job_or_session(job_id: &JobId, session_id: Option<&SessionId>) -> Self {
        match session_id {
            Some(sid) => OwnerId::Session(sid.clone()),
            None => OwnerId::Job(job_id.clone()),
        }
    }

    pub fn as_job(&self) -> Option<&JobId> {
        match self {
            OwnerId::Job(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_sandbox(&self) -> Option<Vmid> {
        match self {
            OwnerId::Sandbox(vmid) => Some(*vmid),
            _ => None,
        }
    }

    pub fn try_job(&self) -> Result<&JobId, OwnerMismatch> {
        match self {
            OwnerId::Job(id) => Ok(id),
            _ => Err(OwnerMismatch("job")),
        }
    }

    /// Parse from the `Display` format. Internal-operation owners
    /// (`snapshot:`/`fork:`/`fsck:`) require the `<workspace_id>:<nanos>`
    /// suffix; malformed strings return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(rest) = s.strip_prefix("job:") {
            return Some(OwnerId::Job(JobId::from_string(rest)));
        }
        if let Some(rest) = s.strip_prefix("session:") {
            return Some(OwnerId::Session(SessionId::new(rest)));
        }
        if let Some(rest) = s.strip_prefix("sandbox:") {
            return rest.parse::<u32>().ok().map(|v| OwnerId::Sandbox(Vmid(v)));
        }
        for (prefix, ctor) in [
            ("snapshot:", OwnerId::Snapshot as fn(WorkspaceId, u128) -> OwnerId),
            ("fork:", OwnerId::Fork as fn(WorkspaceId, u128) -> OwnerId),
            ("fsck:", OwnerId::Fsck as fn(WorkspaceId, u128) -> OwnerId),
        ] {
            if let Some(rest) = s.strip_prefix(prefix) {
                let (ws, nanos) = rest.rsplit_once(':')?;
                let nanos: u128 = nanos.parse().ok()?;
                return Some(ctor(WorkspaceId::from_string(ws), nanos));
            }
        }
        None
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerId::Job(id) => write!(f, "job:{id}"),
            OwnerId::Session(id) => write!(f, "session:{id}"),
            OwnerId::Sandbox(vmid) => write!(f, "sandbox:{vmid}"),
            OwnerId::Snapshot { workspace_id, nanos } => write!(f, "snapshot:{workspace_id}:{nanos}"),
            OwnerId::Fork { workspace_id, nanos } => write!(f, "fork:{workspace_id}:{nanos}"),
            OwnerId::Fsck { workspace_id, nanos } => write!(f, "fsck:{workspace_id}:{nanos}"),
        }
    }
}

/// Raised when an owner string does not match any known shape.
#[derive(Debug, Clone)]
pub struct InvalidOwnerId(pub String);

impl fmt::Display for InvalidOwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid lease owner id: {}", self.0)
    }
}

impl std::error::Error for InvalidOwnerId {}

/// Raised when an [`OwnerId`] is asked to behave as a variant it is not.
#[derive(Debug, Clone)]
pub struct OwnerMismatch(pub &'static str);

impl fmt::Display for OwnerMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} owner", self.0)
    }
}

impl std::error::Error for OwnerMismatch {}

#[cfg(test)]
#[path = "owner_test.rs"]
mod tests;
