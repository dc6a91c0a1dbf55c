// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response bodies. Most routes just echo the domain entity
//! (`fleetd_core::Sandbox`/`Workspace`/... are already `Serialize`); this
//! module only carries the shapes that are not a bare entity: conflict
//! details, composite rebind/revert results, and event pages.

use fleetd_core::{Event, LeaseConflict, Sandbox, Workspace};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsPage {
    pub events: Vec<Event>,
}

/// `POST /v1/sandboxes/{vmid}/revert` result (spec.md §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevertResult {
    pub sandbox: Sandbox,
    pub snapshot: String,
    pub was_running: bool,
    pub restarted: bool,
}

/// `POST /v1/workspaces/{id}/rebind` result (spec.md §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebindResult {
    pub workspace: Workspace,
    pub sandbox: Sandbox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_vmid: Option<u32>,
}

/// Error body returned for every non-2xx response (spec.md §7: "client-side
/// (4xx) responses may include a redacted `details` field").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<LeaseConflict>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None, conflict: None }
    }

    pub fn with_conflict(error: impl Into<String>, conflict: LeaseConflict) -> Self {
        Self { error: error.into(), details: None, conflict: Some(conflict) }
    }

    pub fn with_details(error: impl Into<String>, details: serde_json::Value) -> Self {
        Self { error: error.into(), details: Some(details), conflict: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub metrics: fleetd_core::MetricsSnapshot,
    pub tasks: std::collections::HashMap<String, fleetd_core::TaskHealth>,
    pub recent_failures: Vec<fleetd_core::FailureRingEntry>,
}
