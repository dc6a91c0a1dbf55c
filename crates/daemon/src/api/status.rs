// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /healthz`, `GET /v1/status`.
//!
//! Not bulleted in spec.md §6's route list but required by §9's
//! observability note ("metrics collectors" and background-task health
//! are a named collaborator concern) — a liveness probe and a status
//! snapshot are the minimal surface a control-plane daemon exposes for
//! the ambient metrics/task-health state every other route already
//! updates.

use axum::extract::State;
use axum::Json;
use fleetd_wire::responses::StatusResponse;

use crate::state::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        metrics: state.metrics.snapshot(),
        tasks: state.tasks.snapshot(),
        recent_failures: state.store.recent_failures(),
    })
}
