// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and status (spec.md §3, §4.3).

use crate::sandbox::Vmid;
use crate::session::SessionId;
use crate::workspace::WorkspaceId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a job run.
    ///
    /// Spec.md §3: "random 64-bit hex, unique" — generated via
    /// [`JobId::new`], which still fits the common `{prefix}{nanoid}`
    /// shape used by every other ID type in this crate.
    pub struct JobId("job-");
}

/// Execution mode for the task inside the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    /// Runs with full host/network access inside the sandbox.
    Dangerous,
    /// Runs under the sandbox's restrictive default firewall policy.
    Safe,
}

impl Default for JobMode {
    fn default() -> Self {
        JobMode::Dangerous
    }
}

crate::simple_display! {
    JobMode {
        Dangerous => "dangerous",
        Safe => "safe",
    }
}

/// Job status. Monotonic: `Queued -> Running -> {Completed|Failed|Timeout}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Timeout,
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Timeout => "timeout",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Timeout)
    }

    /// Validate `self -> to` against the monotonic job status ordering.
    pub fn can_transition_to(self, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, to),
            (Queued, Running)
                | (Queued, Completed | Failed | Timeout)
                | (Running, Completed | Failed | Timeout)
        )
    }
}

/// A job run (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub repo_url: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub profile: String,
    pub task: String,
    pub mode: JobMode,
    pub ttl_minutes: u32,
    pub keepalive: bool,
    pub workspace_id: Option<WorkspaceId>,
    pub session_id: Option<SessionId>,
    pub sandbox_vmid: Option<Vmid>,
    pub status: JobStatus,
    #[serde(default)]
    pub result_json: Option<serde_json::Value>,
    pub created_at: u64,
    pub last_updated_at: u64,
}

impl Job {
    pub fn new(
        repo_url: impl Into<String>,
        profile: impl Into<String>,
        task: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: JobId::new(),
            repo_url: repo_url.into(),
            git_ref: "main".to_string(),
            profile: profile.into(),
            task: task.into(),
            mode: JobMode::default(),
            ttl_minutes: 0,
            keepalive: false,
            workspace_id: None,
            session_id: None,
            sandbox_vmid: None,
            status: JobStatus::Queued,
            result_json: None,
            created_at: now_ms,
            last_updated_at: now_ms,
        }
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            repo_url: String = "https://example.invalid/repo.git",
            git_ref: String = "main",
            profile: String = "default",
            task: String = "echo hi",
        }
        set {
            mode: JobMode = JobMode::Dangerous,
            ttl_minutes: u32 = 30,
            keepalive: bool = false,
            status: JobStatus = JobStatus::Queued,
            created_at: u64 = 0,
            last_updated_at: u64 = 0,
        }
        option {
            workspace_id: WorkspaceId = None,
            session_id: SessionId = None,
            sandbox_vmid: Vmid = None,
            result_json: serde_json::Value = None,
        }
        computed {
            id: JobId = JobId::new(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
