// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Doctor-bundle and redaction contracts (spec.md §1, §7).
//!
//! Assembling an actual doctor bundle (serial console tail, guest-agent
//! logs, network probe) is a collaborator's job — this crate only owns
//! the `DoctorSection` shape every collaborator reports through, and the
//! central [`Redactor`] that every outbound payload passes through first.

use serde::{Deserialize, Serialize};

/// One named section of a `POST /v1/sessions/{id}/doctor` bundle.
///
/// Collaborators (guest-agent probes, hypervisor backends, the exposure
/// publisher) each contribute zero or more sections; the daemon
/// concatenates them in the order received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSection {
    pub title: String,
    pub body: String,
    /// Did this section's own probe succeed? `false` means `body` holds an
    /// error description rather than diagnostic output.
    pub ok: bool,
}

impl DoctorSection {
    pub fn ok(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into(), ok: true }
    }

    pub fn failed(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into(), ok: false }
    }
}

/// Redacts secret-shaped substrings before a payload is allowed to leave
/// the process: error `details` fields and doctor bundles (spec.md §7).
///
/// Matches are pattern-based, not a full secret scanner — the patterns
/// cover the shapes this crate itself produces (bearer tokens, lease
/// nonces) plus the common `key=value`/URL-userinfo shapes collaborators
/// tend to leak in raw command output.
pub struct Redactor {
    patterns: Vec<(&'static str, regex::Regex)>,
}

const REDACTED: &str = "[REDACTED]";

impl Redactor {
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let specs: &[(&str, &str)] = &[
            ("bearer", r"(?i)bearer\s+[A-Za-z0-9._\-]+"),
            ("authorization_header", r"(?i)authorization:\s*\S+"),
            ("lease_nonce", r"(?i)nonce[=:]\s*[0-9a-f]{32}"),
            ("url_userinfo", r"://[^/\s:@]+:[^/\s@]+@"),
            ("kv_secret", r"(?i)\b(secret|token|password|api[_-]?key)\s*[=:]\s*\S+"),
        ];
        let patterns = specs
            .iter()
            .map(|(name, pat)| (*name, regex::Regex::new(pat).expect("static redaction pattern is valid")))
            .collect();
        Self { patterns }
    }

    /// Replace every match of every known pattern with `[REDACTED]`.
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (_, re) in &self.patterns {
            out = re.replace_all(&out, REDACTED).into_owned();
        }
        out
    }

    pub fn redact_section(&self, section: &DoctorSection) -> DoctorSection {
        DoctorSection { title: section.title.clone(), body: self.redact(&section.body), ok: section.ok }
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_bearer_tokens() {
        let redactor = Redactor::new();
        let out = redactor.redact("Authorization: Bearer abc123.def456");
        assert!(!out.contains("abc123"));
    }

    #[test]
    fn redacts_lease_nonces() {
        let redactor = Redactor::new();
        let out = redactor.redact("nonce=0123456789abcdef0123456789abcdef");
        assert_eq!(out, "[REDACTED]");
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let redactor = Redactor::new();
        let out = redactor.redact("provisioning sandbox 1042 on bridge vmbr0");
        assert_eq!(out, "provisioning sandbox 1042 on bridge vmbr0");
    }
}
