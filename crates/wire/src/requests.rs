// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request bodies for every route in spec.md §6.

use serde::{Deserialize, Serialize};

fn default_mode() -> Option<String> {
    None
}

/// `POST /v1/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJobRequest {
    pub repo_url: String,
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    pub profile: String,
    pub task: String,
    #[serde(default = "default_mode")]
    pub mode: Option<String>,
    #[serde(default)]
    pub ttl_minutes: Option<u32>,
    #[serde(default)]
    pub keepalive: Option<bool>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub workspace_create: Option<WorkspaceCreateSpec>,
    #[serde(default)]
    pub workspace_wait_seconds: Option<u64>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceCreateSpec {
    pub name: String,
    pub storage: String,
    pub size_gb: u32,
}

/// `POST /v1/sandboxes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSandboxRequest {
    pub name: String,
    pub profile: String,
    #[serde(default)]
    pub keepalive: Option<bool>,
    #[serde(default)]
    pub provision: Option<bool>,
}

/// `POST /v1/sandboxes/{vmid}/destroy`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestroySandboxRequest {
    #[serde(default)]
    pub force: bool,
}

/// `POST /v1/sandboxes/{vmid}/revert`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevertSandboxRequest {
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub restart: bool,
}

/// `POST /v1/sandboxes/{vmid}/lease/renew`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenewSandboxLeaseRequest {
    pub ttl_seconds: u64,
}

/// `POST /v1/workspaces`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub storage: String,
    pub size_gb: u32,
}

/// `POST /v1/workspaces/{id}/attach`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachWorkspaceRequest {
    pub vmid: u32,
}

/// `POST /v1/workspaces/{id}/fork`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForkWorkspaceRequest {
    pub name: String,
    #[serde(default)]
    pub from_snapshot: Option<String>,
}

/// `POST /v1/workspaces/{id}/rebind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RebindWorkspaceRequest {
    pub profile: String,
    #[serde(default)]
    pub ttl_minutes: Option<u32>,
    #[serde(default)]
    pub keep_old: bool,
}

/// `POST /v1/workspaces/{id}/snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateWorkspaceSnapshotRequest {
    pub name: String,
}

/// `POST /v1/workspaces/{id}/check`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckWorkspaceRequest {
    #[serde(default)]
    pub repair: bool,
}

/// `POST /v1/exposures`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateExposureRequest {
    pub name: String,
    pub vmid: u32,
    pub port: u16,
}

/// `POST /v1/sessions/{id}/resume`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResumeSessionRequest {
    #[serde(default)]
    pub profile: Option<String>,
}

/// `POST /v1/sessions/{id}/fork`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForkSessionRequest {
    pub name: String,
}

/// The guest runner callback body (spec.md §4.3 `HandleReport`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobReportRequest {
    pub status: String,
    #[serde(default)]
    pub artifacts: Option<Vec<String>>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[path = "requests_tests.rs"]
mod tests;
