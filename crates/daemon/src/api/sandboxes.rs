// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /v1/sandboxes` and its `{vmid}` sub-routes (spec.md §6).
//!
//! `create_sandbox`'s optional provisioning pipeline mirrors
//! `fleetd_engine::job_orchestrator::JobOrchestrator`'s private `provision`
//! step-for-step (allocate, clone, configure, boot, poll guest IP, clean
//! snapshot) but without a job or workspace binding — there is no
//! compensating-transaction job to attach to, so a provisioning failure
//! here just force-destroys the half-built sandbox and returns the error.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fleetd_adapters::{BackendError, VmConfig};
use fleetd_core::{Clock, Sandbox, SandboxError, SandboxState, SystemClock, Vmid};
use fleetd_storage::StoreError;
use fleetd_wire::requests::{
    CreateSandboxRequest, DestroySandboxRequest, RenewSandboxLeaseRequest, RevertSandboxRequest,
};
use fleetd_wire::responses::{EventsPage, RevertResult};
use fleetd_wire::{parse_events_query, ApiError};

use crate::api::error::{bad_request, not_found, AppError};
use crate::state::AppState;

const GUEST_IP_POLL_ATTEMPTS: u32 = 5;
const GUEST_IP_POLL_INTERVAL: Duration = Duration::from_secs(2);

fn parse_vmid(raw: &str) -> Result<Vmid, AppError> {
    raw.parse::<u32>().map(Vmid::new).map_err(|_| bad_request(format!("invalid vmid {raw:?}")))
}

fn backend_err(err: BackendError) -> SandboxError {
    SandboxError::Backend(err.to_string())
}

pub async fn create_sandbox(
    State(state): State<AppState>,
    Json(request): Json<CreateSandboxRequest>,
) -> Result<(StatusCode, Json<Sandbox>), AppError> {
    let profile = state
        .resolve_profile(&request.profile)
        .ok_or_else(|| AppError::from(SandboxError::UnknownProfile(request.profile.clone())))?;

    state.backend.validate_template(&profile.template).await.map_err(backend_err)?;

    let mut allocated = None;
    for _ in 0..fleetd_core::sandbox::VMID_ALLOC_RETRIES {
        let candidate = state.store.allocate_vmid();
        let now = SystemClock.epoch_ms();
        let mut sandbox = Sandbox::new(candidate, &request.name, &profile.name, now);
        sandbox.keepalive = request.keepalive.unwrap_or(false);
        match state.store.put_sandbox(sandbox) {
            Ok(()) => {
                allocated = Some(candidate);
                break;
            }
            Err(StoreError::AlreadyExists { .. }) => continue,
            Err(e) => return Err(AppError::from(SandboxError::Store(e.to_string()))),
        }
    }
    let vmid = allocated.ok_or_else(|| {
        AppError::from(SandboxError::VmidAllocationExhausted { attempts: fleetd_core::sandbox::VMID_ALLOC_RETRIES })
    })?;

    if !request.provision.unwrap_or(false) {
        let sandbox = state.store.get_sandbox(vmid).map_err(|e| AppError::from(SandboxError::Store(e.to_string())))?;
        return Ok((StatusCode::CREATED, Json(sandbox)));
    }

    match provision_standalone(&state, vmid, &request.name, &profile).await {
        Ok(sandbox) => Ok((StatusCode::CREATED, Json(sandbox))),
        Err(err) => {
            let _ = state.sandboxes.force_destroy(vmid).await;
            Err(err)
        }
    }
}

async fn provision_standalone(
    state: &AppState,
    vmid: Vmid,
    name: &str,
    profile: &fleetd_core::Profile,
) -> Result<Sandbox, AppError> {
    state.sandboxes.transition(vmid, SandboxState::Provisioning)?;
    state.backend.clone_vm(&profile.template, vmid, name).await.map_err(backend_err)?;

    let config = VmConfig {
        cores: profile.cores,
        memory_mb: profile.memory_mb,
        cpu_pin: profile.cpu_pin.clone(),
        bridge: profile.bridge.clone(),
        firewall_group: profile.network_mode.to_string(),
        cloud_init_path: String::new(),
    };
    state.backend.configure(vmid, &config).await.map_err(backend_err)?;

    state.sandboxes.transition(vmid, SandboxState::Booting)?;
    state.backend.start(vmid).await.map_err(backend_err)?;

    let mut guest_ip = None;
    for attempt in 0..GUEST_IP_POLL_ATTEMPTS {
        match state.backend.guest_ip(vmid).await {
            Ok(addr) => {
                guest_ip = Some(addr);
                break;
            }
            Err(BackendError::GuestIpNotFound(_)) => {
                if attempt + 1 < GUEST_IP_POLL_ATTEMPTS {
                    tokio::time::sleep(GUEST_IP_POLL_INTERVAL).await;
                }
            }
            Err(err) => return Err(AppError::from(backend_err(err))),
        }
    }
    let guest_ip = guest_ip
        .ok_or_else(|| AppError::from(SandboxError::Backend(format!("guest ip not available for vmid {vmid}"))))?;

    let now = SystemClock.epoch_ms();
    state
        .store
        .update_sandbox(vmid, now, &mut |s| s.ip = guest_ip.clone())
        .map_err(|e| AppError::from(SandboxError::Store(e.to_string())))?;

    state.sandboxes.transition(vmid, SandboxState::Ready)?;
    let sandbox = state.sandboxes.transition(vmid, SandboxState::Running)?;

    if let Err(err) = state.backend.snapshot_create(vmid, "clean").await {
        tracing::warn!(vmid = vmid.get(), %err, "failed to create clean snapshot after provisioning");
    }

    Ok(sandbox)
}

pub async fn start(State(state): State<AppState>, Path(vmid): Path<String>) -> Result<Json<Sandbox>, AppError> {
    let vmid = parse_vmid(&vmid)?;
    Ok(Json(state.sandboxes.start(vmid).await?))
}

pub async fn stop(State(state): State<AppState>, Path(vmid): Path<String>) -> Result<Json<Sandbox>, AppError> {
    let vmid = parse_vmid(&vmid)?;
    Ok(Json(state.sandboxes.stop(vmid).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(vmid): Path<String>,
    Json(request): Json<DestroySandboxRequest>,
) -> Result<Json<Sandbox>, AppError> {
    let vmid = parse_vmid(&vmid)?;
    Ok(Json(state.sandboxes.destroy(vmid, request.force).await?))
}

pub async fn revert(
    State(state): State<AppState>,
    Path(vmid): Path<String>,
    Json(request): Json<RevertSandboxRequest>,
) -> Result<Json<RevertResult>, AppError> {
    let vmid = parse_vmid(&vmid)?;
    let outcome = state.sandboxes.revert(vmid, request.force, request.restart).await?;
    Ok(Json(RevertResult {
        sandbox: outcome.sandbox,
        snapshot: outcome.snapshot,
        was_running: outcome.was_running,
        restarted: outcome.restarted,
    }))
}

pub async fn touch(State(state): State<AppState>, Path(vmid): Path<String>) -> Result<Json<Sandbox>, AppError> {
    let vmid = parse_vmid(&vmid)?;
    let now = SystemClock.epoch_ms();
    let sandbox = state
        .store
        .update_sandbox(vmid, now, &mut |s| s.last_used_at = now)
        .map_err(|e| not_found(format!("sandbox {vmid}: {e}")))?;
    Ok(Json(sandbox))
}

pub async fn renew_lease(
    State(state): State<AppState>,
    Path(vmid): Path<String>,
    Json(request): Json<RenewSandboxLeaseRequest>,
) -> Result<Json<Sandbox>, AppError> {
    let vmid = parse_vmid(&vmid)?;
    Ok(Json(state.sandboxes.renew_lease(vmid, request.ttl_seconds * 1000)?))
}

pub async fn events(
    State(state): State<AppState>,
    Path(vmid): Path<String>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<Json<EventsPage>, AppError> {
    let vmid = parse_vmid(&vmid)?;
    let query = parse_events_query(
        params.get("after").map(String::as_str),
        params.get("tail").map(String::as_str),
        params.get("limit").map(String::as_str),
    )
    .map_err(|e| AppError(ApiError::new(400, e.to_string())))?;

    let mut events: Vec<_> = state.store.list_events().into_iter().filter(|e| e.sandbox_vmid == Some(vmid)).collect();
    events.sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string()));

    let limit = query.limit as usize;
    let events = if let Some(after) = &query.after {
        events.into_iter().filter(|e| e.id.to_string().as_str() > after.as_str()).take(limit).collect()
    } else if let Some(tail) = query.tail {
        let tail = (tail as usize).min(limit);
        let len = events.len();
        events.split_off(len.saturating_sub(tail))
    } else {
        let len = events.len();
        events.split_off(len.saturating_sub(limit))
    };

    Ok(Json(EventsPage { events }))
}
