// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exposure identifier and row (spec.md §3).
//!
//! An exposure is a host-published TCP port routing to a sandbox. The
//! exposure publisher itself (reverse proxy, DNS) is a collaborator
//! (spec.md §1); this crate only carries the record and its lifecycle tag.

use crate::sandbox::Vmid;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an exposure.
    pub struct ExposureId("exp-");
}

/// Lifecycle state of a published exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureState {
    Publishing,
    Published,
    Unpublishing,
    Unpublished,
    Failed,
}

crate::simple_display! {
    ExposureState {
        Publishing => "publishing",
        Published => "published",
        Unpublishing => "unpublishing",
        Unpublished => "unpublished",
        Failed => "failed",
    }
}

/// An exposure row (spec.md §3): a name-unique published TCP port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exposure {
    pub id: ExposureId,
    pub name: String,
    pub vmid: Vmid,
    pub port: u16,
    pub target_ip: String,
    pub url: String,
    pub state: ExposureState,
    pub created_at: u64,
    pub last_updated_at: u64,
}

impl Exposure {
    pub fn new(
        name: impl Into<String>,
        vmid: Vmid,
        port: u16,
        target_ip: impl Into<String>,
        url: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: ExposureId::new(),
            name: name.into(),
            vmid,
            port,
            target_ip: target_ip.into(),
            url: url.into(),
            state: ExposureState::Publishing,
            created_at: now_ms,
            last_updated_at: now_ms,
        }
    }
}

crate::builder! {
    pub struct ExposureBuilder => Exposure {
        into {
            name: String = "test-exposure",
            target_ip: String = "10.0.0.5",
            url: String = "http://10.0.0.5:8080",
        }
        set {
            vmid: Vmid = crate::sandbox::Vmid(1000),
            port: u16 = 8080,
            state: ExposureState = ExposureState::Publishing,
            created_at: u64 = 0,
            last_updated_at: u64 = 0,
        }
        computed {
            id: ExposureId = ExposureId::new(),
        }
    }
}
