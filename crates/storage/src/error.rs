// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store-level error taxonomy.
//!
//! These are distinct from `fleetd_core::errors` — a Manager translates a
//! `StoreError` into its own domain error (e.g. `StoreError::LeaseHeld`
//! becomes `WorkspaceError::Lease(LeaseError::Held(..))`); the Store itself
//! has no opinion on HTTP status or manager-level semantics.

use fleetd_core::LeaseConflict;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} {name:?} already exists")]
    AlreadyExists { entity: &'static str, name: String },

    #[error("invalid transition for {entity} {id}")]
    InvalidTransition { entity: &'static str, id: String },

    #[error("lease held: {0:?}")]
    LeaseHeld(LeaseConflict),

    #[error("lease owner/nonce does not match current holder")]
    LeaseMismatch,

    #[error("wal io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}
