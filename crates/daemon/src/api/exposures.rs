// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /v1/exposures`, `DELETE /v1/exposures/{name}` (spec.md §6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use fleetd_adapters::PublishError;
use fleetd_core::{Clock, Exposure, SystemClock, Vmid};
use fleetd_wire::requests::CreateExposureRequest;
use fleetd_wire::ApiError;

use crate::api::error::{not_found, store_error, AppError};
use crate::state::AppState;

fn publish_err(err: PublishError) -> AppError {
    match err {
        PublishError::NotFound(handle) => not_found(format!("exposure handle {handle:?} not found")),
        PublishError::PortInUse(port, vmid) => {
            AppError(ApiError::new(409, format!("port {port} already published for vmid {vmid}")))
        }
        PublishError::Rpc(_) => AppError(ApiError::new(502, "exposure publisher unavailable")),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateExposureRequest>,
) -> Result<(StatusCode, Json<Exposure>), AppError> {
    let vmid = Vmid::new(request.vmid);
    state.store.get_sandbox(vmid).map_err(|_| not_found(format!("sandbox {vmid} not found")))?;

    let url = state.exposures.publish(vmid, request.port, &request.name).await.map_err(publish_err)?;
    let now = SystemClock.epoch_ms();
    let target_ip = state.store.get_sandbox(vmid).map(|s| s.ip).unwrap_or_default();

    let mut exposure = Exposure::new(&request.name, vmid, request.port, target_ip, url.clone(), now);
    exposure.state = fleetd_core::ExposureState::Published;
    if let Err(err) = state.store.put_exposure(exposure.clone()) {
        if let Err(rollback_err) = state.exposures.unpublish(&url).await {
            tracing::warn!(%rollback_err, "failed to roll back orphaned exposure publish");
        }
        return Err(store_error(err));
    }

    Ok((StatusCode::CREATED, Json(exposure)))
}

pub async fn destroy(State(state): State<AppState>, Path(name): Path<String>) -> Result<StatusCode, AppError> {
    let exposure = state
        .store
        .list_exposures()
        .into_iter()
        .find(|e| e.name == name)
        .ok_or_else(|| not_found(format!("exposure {name:?} not found")))?;

    state.exposures.unpublish(&exposure.url).await.map_err(publish_err)?;
    state.store.delete_exposure(&exposure.id).map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
