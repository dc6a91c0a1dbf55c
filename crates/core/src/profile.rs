// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox profiles (spec.md §3, §4.1).
//!
//! A profile is a named template: CPU/memory shape, pinning, bridge, the
//! hypervisor template to clone, and the defaults a job/session inherits
//! unless it overrides them. Profiles are configuration, not runtime
//! state — they're loaded once at startup and looked up by name.

use serde::{Deserialize, Serialize};

/// Firewall posture applied to a sandbox's network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    /// No restrictions; used by [`crate::job::JobMode::Dangerous`] runs.
    Open,
    /// Restrictive default: outbound to an allow-list only.
    Restricted,
    /// No network access at all.
    Isolated,
}

impl Default for NetworkMode {
    fn default() -> Self {
        NetworkMode::Restricted
    }
}

crate::simple_display! {
    NetworkMode {
        Open => "open",
        Restricted => "restricted",
        Isolated => "isolated",
    }
}

/// A named sandbox template (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    /// Hypervisor template to clone sandboxes from.
    pub template: String,
    pub cores: u32,
    pub memory_mb: u32,
    #[serde(default)]
    pub cpu_pin: Option<String>,
    pub bridge: String,
    #[serde(default)]
    pub network_mode: NetworkMode,
    /// Default minutes of inactivity before the idle-stop scanner stops a
    /// sandbox on this profile. Zero disables idle-stop.
    #[serde(default)]
    pub idle_stop_minutes: u32,
    /// Default job TTL in minutes when a job doesn't specify one.
    pub default_ttl_minutes: u32,
    #[serde(default)]
    pub default_keepalive: bool,
    /// Whether jobs/sessions on this profile may request host bind-mounts.
    #[serde(default)]
    pub allow_host_mounts: bool,
    /// Public key installed into the guest's cloud-init snippet, if any.
    #[serde(default)]
    pub ssh_pub_key: Option<String>,
}

impl Profile {
    pub fn new(name: impl Into<String>, template: impl Into<String>, bridge: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            cores: 2,
            memory_mb: 2048,
            cpu_pin: None,
            bridge: bridge.into(),
            network_mode: NetworkMode::default(),
            idle_stop_minutes: 0,
            default_ttl_minutes: 30,
            default_keepalive: false,
            allow_host_mounts: false,
            ssh_pub_key: None,
        }
    }
}

crate::builder! {
    pub struct ProfileBuilder => Profile {
        into {
            name: String = "default",
            template: String = "base-ubuntu",
            bridge: String = "vmbr0",
        }
        set {
            cores: u32 = 2,
            memory_mb: u32 = 2048,
            network_mode: NetworkMode = NetworkMode::Restricted,
            idle_stop_minutes: u32 = 0,
            default_ttl_minutes: u32 = 30,
            default_keepalive: bool = false,
            allow_host_mounts: bool = false,
        }
        option {
            cpu_pin: String = None,
            ssh_pub_key: String = None,
        }
    }
}

/// Error parsing a profile document.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("invalid profile toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parse a single profile from its TOML document body. The `name` field
/// is not part of the document itself — collaborators that load profiles
/// from named files (e.g. `default.toml`) derive it from the filename and
/// set it after parsing.
pub fn parse_profile_toml(body: &str) -> Result<Profile, ProfileError> {
    Ok(toml::from_str(body)?)
}

/// Looks up a named sandbox template (spec.md §1 collaborator table: "profile
/// YAML/TOML parsing"). This crate only defines the contract; loading
/// profiles from a directory of documents is a daemon-level concern.
pub trait ProfileStore: Send + Sync {
    fn get(&self, name: &str) -> Option<Profile>;
    fn list(&self) -> Vec<Profile>;
}
