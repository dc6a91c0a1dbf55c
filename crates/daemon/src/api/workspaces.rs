// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/v1/workspaces` routes (spec.md §6) — thin wrappers over
//! [`fleetd_engine::WorkspaceManager`]; `rebind` goes through
//! [`fleetd_engine::JobOrchestrator::rebind_workspace`] since it drives a
//! full provisioning pipeline, not just a Store mutation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use fleetd_core::{Vmid, Workspace};
use fleetd_wire::requests::{
    AttachWorkspaceRequest, CheckWorkspaceRequest, CreateWorkspaceRequest, CreateWorkspaceSnapshotRequest,
    ForkWorkspaceRequest, RebindWorkspaceRequest,
};
use fleetd_wire::responses::RebindResult;

use crate::api::error::AppError;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<Workspace>), AppError> {
    let workspace = state.workspaces.create(&request.name, &request.storage, request.size_gb).await?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Workspace>, AppError> {
    Ok(Json(state.workspaces.resolve(&id)?))
}

pub async fn attach(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AttachWorkspaceRequest>,
) -> Result<Json<Workspace>, AppError> {
    let workspace = state.workspaces.resolve(&id)?;
    Ok(Json(state.workspaces.attach(&workspace.id, Vmid::new(request.vmid)).await?))
}

pub async fn detach(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Workspace>, AppError> {
    let workspace = state.workspaces.resolve(&id)?;
    Ok(Json(state.workspaces.detach(&workspace.id).await?))
}

pub async fn check(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CheckWorkspaceRequest>,
) -> Result<Json<fleetd_adapters::FsckOutcome>, AppError> {
    let workspace = state.workspaces.resolve(&id)?;
    Ok(Json(state.workspaces.fsck(&workspace.id, request.repair).await?))
}

pub async fn fork(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ForkWorkspaceRequest>,
) -> Result<(StatusCode, Json<Workspace>), AppError> {
    let workspace = state.workspaces.resolve(&id)?;
    let forked = state.workspaces.fork(&workspace.id, &request.name, request.from_snapshot.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(forked)))
}

pub async fn rebind(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RebindWorkspaceRequest>,
) -> Result<Json<RebindResult>, AppError> {
    let workspace = state.workspaces.resolve(&id)?;
    let outcome =
        state.jobs.rebind_workspace(&workspace.id, &request.profile, request.ttl_minutes, request.keep_old).await?;
    Ok(Json(RebindResult {
        workspace: outcome.workspace,
        sandbox: outcome.sandbox,
        old_vmid: outcome.old_vmid.map(Vmid::get),
    }))
}

pub async fn create_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateWorkspaceSnapshotRequest>,
) -> Result<StatusCode, AppError> {
    let workspace = state.workspaces.resolve(&id)?;
    state.workspaces.snapshot_create(&workspace.id, &request.name).await?;
    Ok(StatusCode::CREATED)
}

pub async fn restore_snapshot(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let workspace = state.workspaces.resolve(&id)?;
    state.workspaces.snapshot_restore(&workspace.id, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
