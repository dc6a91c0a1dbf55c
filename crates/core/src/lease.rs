// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace lease protocol constants and data types (spec.md §4.2).
//!
//! A lease is a time-boxed, owner+nonce scoped hold on a workspace's
//! attach/mutate rights. The Workspace Manager stores the lease fields
//! directly on the [`crate::workspace::Workspace`] row; this module carries
//! the shared constants and the `Lease` view used by `AcquireWithWait`,
//! renewal, and conflict reporting.

use crate::owner::OwnerId;
use rand::RngCore;
use std::time::Duration;

/// Default lease TTL when a caller doesn't specify one (spec.md §4.2).
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(30 * 60);

/// Floor for the auto-renew interval, regardless of TTL.
pub const MIN_RENEW_INTERVAL: Duration = Duration::from_secs(30);

/// Ceiling for the auto-renew interval, regardless of TTL.
pub const MAX_RENEW_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Starting backoff delay for `AcquireWithWait`'s retry loop.
pub const ACQUIRE_WAIT_INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Backoff ceiling for `AcquireWithWait`'s retry loop.
pub const ACQUIRE_WAIT_MAX_BACKOFF: Duration = Duration::from_secs(2);

/// An auto-renewing holder should renew at `ttl / 2`, clamped to
/// `[MIN_RENEW_INTERVAL, MAX_RENEW_INTERVAL]`.
pub fn renew_interval(ttl: Duration) -> Duration {
    (ttl / 2).clamp(MIN_RENEW_INTERVAL, MAX_RENEW_INTERVAL)
}

/// The backoff delay for the `attempt`'th retry (0-indexed) of
/// `AcquireWithWait`: doubles from [`ACQUIRE_WAIT_INITIAL_BACKOFF`], capped
/// at [`ACQUIRE_WAIT_MAX_BACKOFF`].
pub fn acquire_wait_backoff(attempt: u32) -> Duration {
    let millis = ACQUIRE_WAIT_INITIAL_BACKOFF.as_millis().saturating_shl(attempt.min(16));
    Duration::from_millis(millis as u64).min(ACQUIRE_WAIT_MAX_BACKOFF)
}

/// A lease nonce: 16 random bytes, hex-encoded. Distinguishes successive
/// holds by the same owner so a stale `Renew`/`Release` from a prior hold
/// can't be mistaken for the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    /// Generate a fresh random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex_encode(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

/// A materialized view of a workspace's lease, used by the lease protocol
/// and by conflict reporting. Not the storage representation — see
/// [`crate::workspace::Workspace`]'s `lease_*` fields for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub owner: OwnerId,
    pub nonce: Nonce,
    pub expires_at_ms: u64,
}

impl Lease {
    pub fn new(owner: OwnerId, ttl: Duration, now_ms: u64) -> Self {
        Self {
            owner,
            nonce: Nonce::generate(),
            expires_at_ms: now_ms + ttl.as_millis() as u64,
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms <= now_ms
    }
}
