// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hypervisor capability interface (spec.md §1 collaborator table,
//! §9 "dynamic dispatch on backend"): clone/configure/start/stop/destroy,
//! status/guest-IP probes, snapshots, and volumes. This crate defines the
//! trait only; a real backend (driving an external hypervisor's API)
//! lives outside this repo's scope, same as the Store's relational
//! backend.

use async_trait::async_trait;
use fleetd_core::Vmid;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("vmid {0} not found on backend")]
    NotFound(Vmid),

    #[error("template {0:?} not found")]
    TemplateNotFound(String),

    #[error("snapshot {name:?} not found for vmid {vmid}")]
    SnapshotNotFound { vmid: Vmid, name: String },

    #[error("guest ip not yet available for vmid {0}")]
    GuestIpNotFound(Vmid),

    #[error("storage {0:?} does not support this operation")]
    StorageUnsupported(String),

    #[error("volume {0:?} not found")]
    VolumeNotFound(String),

    #[error("backend rpc failed: {0}")]
    Rpc(String),
}

/// Per-VM configuration built by the Job Orchestrator from a
/// [`fleetd_core::Profile`] (spec.md §4.3 step 7: "build `VMConfig` from
/// profile (cores, memory, cpu pinning, bridge, model, firewall group
/// derived from `network.mode`), inject cloud-init path").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmConfig {
    pub cores: u32,
    pub memory_mb: u32,
    pub cpu_pin: Option<String>,
    pub bridge: String,
    pub firewall_group: String,
    pub cloud_init_path: String,
}

/// Coarse-grained power state as reported by [`HypervisorBackend::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestStatus {
    Running,
    Stopped,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub name: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub volume_id: String,
    pub storage: String,
    pub size_gb: u32,
}

/// The hypervisor capability interface. Every method is async: all of
/// them are remote calls in a real backend, and spec.md §5 requires every
/// one to honor cancellation and be wrapped in the provisioning timeout
/// by the caller.
#[async_trait]
pub trait HypervisorBackend: Send + Sync {
    async fn validate_template(&self, template: &str) -> Result<(), BackendError>;

    async fn clone_vm(&self, template: &str, vmid: Vmid, name: &str) -> Result<(), BackendError>;

    async fn configure(&self, vmid: Vmid, config: &VmConfig) -> Result<(), BackendError>;

    async fn start(&self, vmid: Vmid) -> Result<(), BackendError>;

    async fn stop(&self, vmid: Vmid) -> Result<(), BackendError>;

    /// Idempotent: a not-found VMID is not an error (spec.md §7
    /// "Recovery: idempotent operations... tolerate not-found").
    async fn destroy(&self, vmid: Vmid) -> Result<(), BackendError>;

    async fn status(&self, vmid: Vmid) -> Result<GuestStatus, BackendError>;

    async fn guest_ip(&self, vmid: Vmid) -> Result<String, BackendError>;

    async fn snapshot_create(&self, vmid: Vmid, name: &str) -> Result<(), BackendError>;

    async fn snapshot_restore(&self, vmid: Vmid, name: &str) -> Result<(), BackendError>;

    async fn snapshot_list(&self, vmid: Vmid) -> Result<Vec<SnapshotInfo>, BackendError>;

    async fn snapshot_delete(&self, vmid: Vmid, name: &str) -> Result<(), BackendError>;

    async fn volume_create(&self, storage: &str, size_gb: u32) -> Result<VolumeInfo, BackendError>;

    async fn volume_delete(&self, volume_id: &str) -> Result<(), BackendError>;

    async fn volume_info(&self, volume_id: &str) -> Result<VolumeInfo, BackendError>;

    async fn volume_clone(&self, volume_id: &str, new_name: &str) -> Result<VolumeInfo, BackendError>;

    async fn volume_clone_from_snapshot(
        &self,
        volume_id: &str,
        snapshot_name: &str,
        new_name: &str,
    ) -> Result<VolumeInfo, BackendError>;

    async fn volume_snapshot_create(&self, volume_id: &str, name: &str) -> Result<(), BackendError>;

    async fn volume_snapshot_restore(&self, volume_id: &str, name: &str) -> Result<(), BackendError>;

    async fn volume_snapshot_list(&self, volume_id: &str) -> Result<Vec<SnapshotInfo>, BackendError>;

    async fn volume_snapshot_delete(&self, volume_id: &str, name: &str) -> Result<(), BackendError>;

    async fn volume_attach(&self, volume_id: &str, vmid: Vmid) -> Result<(), BackendError>;

    async fn volume_detach(&self, volume_id: &str, vmid: Vmid) -> Result<(), BackendError>;

    /// Path to the volume's block device on the host, for `fsck`
    /// (spec.md §4.2 "Volume path must be a block device").
    async fn volume_device_path(&self, volume_id: &str) -> Result<String, BackendError>;
}
