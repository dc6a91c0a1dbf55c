// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Control API surface (spec.md §6): one axum [`Router`] serving
//! every route, regardless of which transport (Unix socket or loopback
//! TCP) ends up carrying it — `main.rs` decides that, this module only
//! assembles the routing table.

pub mod error;
pub mod exposures;
pub mod jobs;
pub mod sandboxes;
pub mod sessions;
pub mod status;
pub mod workspaces;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(status::healthz))
        .route("/v1/status", get(status::status))
        .route("/v1/jobs", post(jobs::create_job))
        .route("/v1/jobs/{id}", get(jobs::get_job))
        .route("/v1/jobs/{id}/report", post(jobs::report_job))
        .route("/v1/sandboxes", post(sandboxes::create_sandbox))
        .route("/v1/sandboxes/{vmid}/start", post(sandboxes::start))
        .route("/v1/sandboxes/{vmid}/stop", post(sandboxes::stop))
        .route("/v1/sandboxes/{vmid}/destroy", post(sandboxes::destroy))
        .route("/v1/sandboxes/{vmid}/revert", post(sandboxes::revert))
        .route("/v1/sandboxes/{vmid}/touch", post(sandboxes::touch))
        .route("/v1/sandboxes/{vmid}/lease/renew", post(sandboxes::renew_lease))
        .route("/v1/sandboxes/{vmid}/events", get(sandboxes::events))
        .route("/v1/workspaces", post(workspaces::create))
        .route("/v1/workspaces/{id}", get(workspaces::get))
        .route("/v1/workspaces/{id}/attach", post(workspaces::attach))
        .route("/v1/workspaces/{id}/detach", post(workspaces::detach))
        .route("/v1/workspaces/{id}/rebind", post(workspaces::rebind))
        .route("/v1/workspaces/{id}/fork", post(workspaces::fork))
        .route("/v1/workspaces/{id}/check", post(workspaces::check))
        .route("/v1/workspaces/{id}/snapshots", post(workspaces::create_snapshot))
        .route("/v1/workspaces/{id}/snapshots/{name}/restore", post(workspaces::restore_snapshot))
        .route("/v1/sessions/{id}/resume", post(sessions::resume))
        .route("/v1/sessions/{id}/stop", post(sessions::stop))
        .route("/v1/sessions/{id}/fork", post(sessions::fork))
        .route("/v1/sessions/{id}/doctor", post(sessions::doctor))
        .route("/v1/exposures", post(exposures::create))
        .route("/v1/exposures/{name}", delete(exposures::destroy))
        .with_state(state)
}
