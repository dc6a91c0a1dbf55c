// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetd-daemon::api::error` — the Control API boundary `fleetd-wire`'s
//! doc comments point at: the only place a manager error (or a
//! store/backend failure that never reached a manager) becomes an HTTP
//! response. Every route handler returns `Result<T, AppError>`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use fleetd_storage::StoreError;
use fleetd_wire::responses::ErrorResponse;
use fleetd_wire::ApiError;

pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match self.0.conflict {
            Some(conflict) => ErrorResponse::with_conflict(self.0.message, conflict),
            None => ErrorResponse::new(self.0.message),
        };
        (status, Json(body)).into_response()
    }
}

impl<E: Into<ApiError>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

/// A `StoreError` that reaches a route handler directly (not already
/// folded into a manager's typed error) is always a 500: the Store
/// itself never carries a meaning a client should see (spec.md §7:
/// "Server-side (5xx) responses never echo raw error details").
pub fn store_error(_err: StoreError) -> AppError {
    AppError(ApiError::new(500, "internal error"))
}

pub fn bad_request(message: impl Into<String>) -> AppError {
    AppError(ApiError::new(400, message))
}

pub fn not_found(message: impl Into<String>) -> AppError {
    AppError(ApiError::new(404, message))
}
