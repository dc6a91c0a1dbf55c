// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap tokens: one-shot secrets minted per sandbox and injected
//! into the cloud-init snippet so the guest agent can call back and
//! authenticate itself (spec.md §4.3 step 6, §6 "guest callback").
//!
//! Tokens are CSPRNG bytes, hex-encoded for the plaintext handed to the
//! guest. Only the SHA-256 hash is ever persisted, following the same
//! hash-at-rest pattern as other token stores in this stack: the
//! plaintext is returned once, at mint time, and never stored.

use fleetd_core::Vmid;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a minted token, hex-encoded to 32 chars.
const TOKEN_BYTES: usize = 16;

#[derive(Debug, Clone)]
pub struct BootstrapToken {
    pub vmid: Vmid,
    /// Plaintext token, populated only on mint; absent once round-tripped
    /// through storage.
    pub plaintext: Option<String>,
    pub token_hash: String,
    pub expires_at: u64,
}

impl BootstrapToken {
    pub fn mint(vmid: Vmid, now_ms: u64, ttl_ms: u64) -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let plaintext = hex::encode(bytes);
        let token_hash = hash(&plaintext);
        Self {
            vmid,
            plaintext: Some(plaintext),
            token_hash,
            expires_at: now_ms + ttl_ms,
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    /// Constant-time check of a presented plaintext token against this
    /// entry's stored hash.
    pub fn matches(&self, presented: &str) -> bool {
        use subtle::ConstantTimeEq;
        let presented_hash = hash(presented);
        presented_hash.as_bytes().ct_eq(self.token_hash.as_bytes()).into()
    }
}

fn hash(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
