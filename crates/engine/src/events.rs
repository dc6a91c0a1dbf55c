// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin wrapper around `fleetd_core::event::record_event` +
//! `Store::append_event` shared by every manager (spec.md §4.4).
//!
//! Event recording is supplementary to the entity row it describes — the
//! row is always written first — so a failure here is logged and
//! swallowed rather than propagated as an operation failure.

use fleetd_core::{JobId, Vmid};
use fleetd_storage::Store;
use serde_json::Value;

pub(crate) fn emit(
    store: &dyn Store,
    kind: &str,
    payload: Value,
    sandbox_vmid: Option<Vmid>,
    job_id: Option<JobId>,
    message: impl Into<String>,
    now_ms: u64,
) {
    match fleetd_core::event::record_event(kind, payload) {
        Ok(envelope) => {
            if let Err(err) = store.append_event(envelope, sandbox_vmid, job_id, message.into(), now_ms) {
                tracing::warn!(kind, %err, "failed to append event");
            }
        }
        Err(err) => {
            tracing::warn!(kind, %err, "failed to record event payload");
        }
    }
}
