// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event recording, envelope, and projection (spec.md §4.4).
//!
//! The catalog ([`catalog`]) is the closed vocabulary of event kinds; this
//! module is the recorder that validates a caller's payload against it
//! and wraps it in an [`Envelope`], plus the pure [`Projection`] reducer
//! that turns an ordered event stream into the three read models the
//! Control API serves from (sandbox health, job timeline, recent
//! failures). Persisting the stream itself is the Store's job.

pub mod catalog;
mod projection;

pub use projection::{FailureRingEntry, JobTimeline, Projection, SandboxHealth};

use crate::errors::EventError;
use crate::job::JobId;
use crate::sandbox::Vmid;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a recorded event.
    pub struct EventId("evt-");
}

/// An event kind: a dotted catalog key, e.g. `"sandbox.state"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKind(pub String);

impl EventKind {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches_recent_failure(&self) -> bool {
        self.0.contains("failed") || self.0.contains("timeout")
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The wire shape of a recorded event: `{kind, schema_version, stage,
/// payload}` (spec.md §4.4). `schema_version` is always `>0` for events
/// produced by [`record_event`]; events read back from storage that
/// predate the catalog may arrive as bare JSON instead — see
/// [`Envelope::parse_legacy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: EventKind,
    pub schema_version: u32,
    pub stage: String,
    pub payload: serde_json::Value,
}

impl Envelope {
    /// Parse a stored event body, accepting both the current enveloped
    /// shape (`schema_version > 0`) and legacy bare-JSON payloads
    /// (spec.md §4.4 "Legacy parse"). A bare payload is wrapped with
    /// `schema_version: 0` and `stage: "unknown"` so callers can still
    /// branch on it, but it is never validated against the catalog.
    pub fn parse_legacy(kind: EventKind, raw: &serde_json::Value) -> Self {
        if let Some(obj) = raw.as_object() {
            let looks_enveloped = obj.contains_key("schema_version")
                && obj.contains_key("payload")
                && obj.get("schema_version").and_then(|v| v.as_u64()).unwrap_or(0) > 0;
            if looks_enveloped {
                if let Ok(envelope) = serde_json::from_value::<Envelope>(raw.clone()) {
                    return envelope;
                }
            }
        }
        Envelope { kind, schema_version: 0, stage: "unknown".to_string(), payload: raw.clone() }
    }
}

/// A recorded event (spec.md §3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: u64,
    pub kind: EventKind,
    #[serde(default)]
    pub sandbox_vmid: Option<Vmid>,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub message: String,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn schema_version(&self) -> u32 {
        self.payload
            .as_object()
            .and_then(|o| o.get("schema_version"))
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(1)
    }
}

/// The payload recorder (spec.md §4.4):
/// 1. Look up the schema; refuse unknown kinds.
/// 2. Validate every required field is present and, for strings,
///    non-empty after trimming.
/// 3. Wrap the payload in an [`Envelope`].
pub fn record_event(kind: &str, payload: serde_json::Value) -> Result<Envelope, EventError> {
    let schema = catalog::schema_for(kind).ok_or_else(|| EventError::UnknownKind(kind.to_string()))?;

    let obj = payload.as_object();
    for field in schema.required_fields {
        let value = obj.and_then(|o| o.get(*field));
        match value {
            None => return Err(EventError::MissingField { kind: kind.to_string(), field }),
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
                return Err(EventError::EmptyField { kind: kind.to_string(), field });
            }
            Some(serde_json::Value::Null) => {
                return Err(EventError::MissingField { kind: kind.to_string(), field });
            }
            Some(_) => {}
        }
    }

    Ok(Envelope {
        kind: EventKind::new(kind),
        schema_version: schema.schema_version,
        stage: schema.stage.to_string(),
        payload,
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
