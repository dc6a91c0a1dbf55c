// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cloud-init snippet store (spec.md §1 collaborator table, §4.3
//! step 6: "render the cloud-init snippet from the profile and
//! bootstrap token, write it where the hypervisor's snippet storage
//! expects it, get back a path"). The path returned by `write` is what
//! `fleetd_adapters::HypervisorBackend::configure` receives as
//! `VmConfig::cloud_init_path`.

use async_trait::async_trait;
use fleetd_core::Vmid;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnippetError {
    #[error("snippet for vmid {0} not found")]
    NotFound(Vmid),

    #[error("snippet store rpc failed: {0}")]
    Rpc(String),
}

#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Writes `contents` (a rendered cloud-init user-data document) and
    /// returns the path the hypervisor should be configured to read it
    /// from.
    async fn write(&self, vmid: Vmid, contents: &str) -> Result<String, SnippetError>;

    /// Removes a previously written snippet. Idempotent: removing a
    /// snippet that is already gone is not an error.
    async fn remove(&self, vmid: Vmid) -> Result<(), SnippetError>;
}
