// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /v1/sessions/{id}/{resume|stop|fork|doctor}` (spec.md §6).
//!
//! No manager owns sessions — a session is just "a named binding of a
//! workspace to its currently active sandbox" (spec.md §3) — so these
//! handlers compose `WorkspaceManager`/`SandboxManager`/`JobOrchestrator`
//! directly, the same collaborators `fleetd-engine` already exposes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use fleetd_core::{Clock, Redactor, Sandbox, Session, SessionId, SystemClock};
use fleetd_wire::requests::{ForkSessionRequest, ResumeSessionRequest};
use serde::Serialize;

use crate::api::error::{not_found, store_error, AppError};
use crate::state::AppState;

fn load_session(state: &AppState, id: &str) -> Result<Session, AppError> {
    state.store.get_session(&SessionId::new(id)).map_err(|_| not_found(format!("session {id} not found")))
}

#[derive(Debug, Serialize)]
pub struct SessionWithSandbox {
    #[serde(flatten)]
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<Sandbox>,
}

fn current_sandbox(state: &AppState, session: &Session) -> Option<Sandbox> {
    session.current_vmid.and_then(|vmid| state.store.get_sandbox(vmid).ok())
}

/// Resumes a session: reuses the bound sandbox if it is already
/// healthy, otherwise rebinds the session's workspace onto a freshly
/// provisioned one (mirrors `POST /v1/workspaces/{id}/rebind`).
pub async fn resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ResumeSessionRequest>,
) -> Result<Json<SessionWithSandbox>, AppError> {
    let session = load_session(&state, &id)?;

    if let Some(sandbox) = current_sandbox(&state, &session) {
        if sandbox.state.healthy() {
            return Ok(Json(SessionWithSandbox { session, sandbox: Some(sandbox) }));
        }
    }

    let profile = request.profile.unwrap_or_else(|| session.profile.clone());
    let outcome = state.jobs.rebind_workspace(&session.workspace_id, &profile, None, false).await?;

    let now = SystemClock.epoch_ms();
    let updated = state
        .store
        .update_session(&session.id, now, &mut |s| s.current_vmid = Some(outcome.sandbox.vmid))
        .map_err(store_error)?;

    Ok(Json(SessionWithSandbox { session: updated, sandbox: Some(outcome.sandbox) }))
}

/// Stops the session's current sandbox without releasing the binding —
/// `resume` reattaches to the same VMID if it is still startable.
pub async fn stop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionWithSandbox>, AppError> {
    let session = load_session(&state, &id)?;
    let sandbox = match session.current_vmid {
        Some(vmid) => Some(state.sandboxes.stop(vmid).await?),
        None => None,
    };
    Ok(Json(SessionWithSandbox { session, sandbox }))
}

/// Forks a session onto a forked workspace: a new session, same
/// profile/branch, bound to no sandbox until it is resumed.
pub async fn fork(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ForkSessionRequest>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let session = load_session(&state, &id)?;
    let forked_workspace = state.workspaces.fork(&session.workspace_id, &request.name, None).await?;

    let now = SystemClock.epoch_ms();
    let forked = Session::new(request.name.clone(), forked_workspace.id, &session.profile, &session.branch, now);
    state.store.put_session(forked.clone()).map_err(store_error)?;

    Ok((StatusCode::CREATED, Json(forked)))
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub sections: Vec<fleetd_core::DoctorSection>,
}

/// Assembles a redacted diagnostic bundle: workspace backend check plus,
/// if a sandbox is bound, its health projection and recent failures.
pub async fn doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DoctorReport>, AppError> {
    let session = load_session(&state, &id)?;
    let redactor = Redactor::new();
    let mut sections = Vec::new();

    match state.workspaces.check(&session.workspace_id).await {
        Ok(workspace) => sections.push(fleetd_core::DoctorSection::ok(
            "workspace",
            format!("workspace {} volume {} reachable", workspace.name, workspace.volume_id),
        )),
        Err(err) => sections.push(fleetd_core::DoctorSection::failed("workspace", err.to_string())),
    }

    if let Some(vmid) = session.current_vmid {
        match state.store.sandbox_health(vmid) {
            Some(health) => {
                let state_desc = health.state.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string());
                let body = format!(
                    "state={state_desc} healthy={} failures={} last_failure={:?}",
                    health.healthy, health.failure_count, health.last_failure_message
                );
                if health.healthy {
                    sections.push(fleetd_core::DoctorSection::ok("sandbox", body));
                } else {
                    sections.push(fleetd_core::DoctorSection::failed("sandbox", body));
                }
            }
            None => sections.push(fleetd_core::DoctorSection::failed(
                "sandbox",
                format!("no health projection recorded for vmid {vmid}"),
            )),
        }
    } else {
        sections.push(fleetd_core::DoctorSection::ok("sandbox", "session has no sandbox currently bound"));
    }

    let failures = state.store.recent_failures();
    if !failures.is_empty() {
        let body = failures
            .iter()
            .filter(|f| match session.current_vmid {
                Some(vmid) => f.sandbox_vmid == Some(vmid),
                None => true,
            })
            .map(|f| format!("[{}] {}: {}", f.timestamp, f.kind, f.message))
            .collect::<Vec<_>>()
            .join("\n");
        if !body.is_empty() {
            sections.push(fleetd_core::DoctorSection::ok("recent_failures", body));
        }
    }

    let sections = sections.iter().map(|s| redactor.redact_section(s)).collect();
    Ok(Json(DoctorReport { sections }))
}

