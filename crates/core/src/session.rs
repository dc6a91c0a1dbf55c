// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier and row (spec.md §3).
//!
//! A session is a named binding of a workspace to its currently active
//! sandbox. `current_vmid` tracks whichever sandbox is presently bound;
//! rebinding a workspace (spec.md §4.3 `RebindWorkspace`) updates it.

use crate::sandbox::Vmid;
use crate::workspace::WorkspaceId;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Create a new SessionId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value of this SessionId.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for SessionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SessionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A session row (spec.md §3): a named binding of a workspace to its
/// currently active sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub workspace_id: WorkspaceId,
    pub current_vmid: Option<Vmid>,
    pub profile: String,
    pub branch: String,
    pub created_at: u64,
    pub last_updated_at: u64,
}

impl Session {
    pub fn new(
        name: impl Into<String>,
        workspace_id: WorkspaceId,
        profile: impl Into<String>,
        branch: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: SessionId::new(nanoid::nanoid!(12)),
            name: name.into(),
            workspace_id,
            current_vmid: None,
            profile: profile.into(),
            branch: branch.into(),
            created_at: now_ms,
            last_updated_at: now_ms,
        }
    }
}

crate::builder! {
    pub struct SessionBuilder => Session {
        into {
            name: String = "test-session",
            profile: String = "default",
            branch: String = "main",
        }
        set {
            created_at: u64 = 0,
            last_updated_at: u64 = 0,
        }
        option {
            current_vmid: Vmid = None,
        }
        computed {
            id: SessionId = SessionId::new(nanoid::nanoid!(12)),
            workspace_id: WorkspaceId = WorkspaceId::new(),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
