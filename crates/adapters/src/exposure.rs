// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The exposure publisher (spec.md §1 collaborator table, §4.5
//! "publishes a reachable URL for a workspace/sandbox pair through
//! whatever ingress mechanism the deployment uses"). This crate only
//! defines the contract; a real publisher (e.g. a reverse-proxy
//! controller) lives outside this repo.

use async_trait::async_trait;
use fleetd_core::Vmid;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("exposure {0:?} not found")]
    NotFound(String),

    #[error("port {0} already published for vmid {1}")]
    PortInUse(u16, Vmid),

    #[error("publisher rpc failed: {0}")]
    Rpc(String),
}

/// Publishes and retracts reachable URLs for a `(vmid, port)` pair.
/// Implementations must be idempotent on `unpublish` for a handle that
/// was already retracted (spec.md §7 "Recovery").
#[async_trait]
pub trait ExposurePublisher: Send + Sync {
    async fn publish(&self, vmid: Vmid, port: u16, label: &str) -> Result<String, PublishError>;

    async fn unpublish(&self, handle: &str) -> Result<(), PublishError>;
}
