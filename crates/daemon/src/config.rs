// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-wide settings, resolved from the environment (spec.md §2.3,
//! SPEC_FULL.md §2.3). State dir resolution follows the same precedence
//! style as every other `FLEETD_*`/`XDG_*`/`HOME` fallback chain in this
//! stack: explicit env var, then XDG, then a hardcoded fallback.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve the state directory: `FLEETD_STATE_DIR` > `XDG_STATE_HOME/fleetd`
/// > `~/.local/state/fleetd`.
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("FLEETD_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("fleetd"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/fleetd"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not resolve a state directory: neither FLEETD_STATE_DIR, XDG_STATE_HOME nor HOME is set")]
    NoStateDir,
}

/// TCP port the daemon additionally listens on, if set. `None` means the
/// Unix socket is the only transport.
pub fn tcp_port() -> Option<u16> {
    std::env::var("FLEETD_TCP_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// Bearer token required on every TCP request (and every Unix-socket
/// request too, if set — spec.md §6 doesn't exempt the Unix socket from
/// auth, only `/healthz`). Empty values are treated as unset.
pub fn auth_token() -> Option<String> {
    std::env::var("FLEETD_AUTH_TOKEN").ok().filter(|s| !s.is_empty())
}

/// Optional CIDR allow-list for TCP connections, comma-separated.
pub fn allowed_cidrs() -> Vec<String> {
    std::env::var("FLEETD_ALLOWED_CIDRS")
        .ok()
        .map(|s| s.split(',').map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect())
        .unwrap_or_default()
}

/// How long a job provision pipeline may run before `JobError::ProvisionTimeout`.
pub fn provision_timeout() -> Duration {
    std::env::var("FLEETD_PROVISION_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(600))
}

/// Interval between lease-GC / idle-stop / orphan-pruning scanner sweeps.
pub fn scan_interval() -> Duration {
    std::env::var("FLEETD_SCAN_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Directory `*.toml` profiles are loaded from: `FLEETD_PROFILES_DIR` or
/// `<state_dir>/profiles`.
pub fn profiles_dir(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("FLEETD_PROFILES_DIR").map(PathBuf::from).unwrap_or_else(|_| state_dir.join("profiles"))
}

/// Base URL the guest bootstrap script should call back into (reachable
/// from inside a sandbox, not necessarily the same address the CLI uses).
pub fn controller_url() -> String {
    std::env::var("FLEETD_CONTROLLER_URL").unwrap_or_else(|_| "http://10.30.0.1:7890".to_string())
}

/// `RUST_LOG`-style filter directive; defaults to `info`.
pub fn log_filter() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}

/// Fully resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub profiles_dir: PathBuf,
    pub tcp_port: Option<u16>,
    pub auth_token: Option<String>,
    pub allowed_cidrs: Vec<String>,
    pub provision_timeout: Duration,
    pub scan_interval: Duration,
    pub controller_url: String,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let state_dir = state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("fleetd.sock"),
            lock_path: state_dir.join("fleetd.pid"),
            profiles_dir: profiles_dir(&state_dir),
            tcp_port: tcp_port(),
            auth_token: auth_token(),
            allowed_cidrs: allowed_cidrs(),
            provision_timeout: provision_timeout(),
            scan_interval: scan_interval(),
            controller_url: controller_url(),
            state_dir,
        })
    }
}
