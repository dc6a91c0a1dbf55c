// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token auth middleware for the loopback TCP listener (spec.md
//! §6: "optionally a loopback TCP port with bearer-token auth. Token
//! comparison is constant-time; exempt path `/healthz`").
//!
//! The Unix-domain socket is not wrapped with this middleware: its own
//! filesystem permissions (`srw-rw----`) are the access control, per
//! spec.md §6's transport description. Only the TCP listener — reachable
//! by anything that can open a loopback connection — needs a bearer
//! check on top of that.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::state::AppState;
use fleetd_wire::responses::ErrorResponse;

const EXEMPT_PATHS: &[&str] = &["/healthz"];

pub async fn require_bearer(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if EXEMPT_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(req).await;
    };

    let presented = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if constant_time_eq(token, expected) => next.run(req).await,
        Some(_) => unauthorized("invalid bearer token"),
        None => unauthorized("missing bearer token"),
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, axum::Json(ErrorResponse::new(message))).into_response()
}
