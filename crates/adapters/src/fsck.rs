// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The filesystem-check runner (spec.md §4.2 `FSCK(id, repair)`):
//! classifies the exit-code bitmap of `fsck -f -n <path>` (read-only) or
//! `fsck -f -y <path>` (repair) run against a workspace volume's block
//! device. Like [`crate::hypervisor::HypervisorBackend`], this crate
//! defines the contract only; a real runner shelling out to the host's
//! `fsck(8)` lives outside this repo's scope, and a stub drives tests.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FsckError {
    #[error("{0} is not a block device")]
    NotBlockDevice(String),

    #[error("fsck runner rpc failed: {0}")]
    Rpc(String),
}

/// Outcome status, derived from the `fsck(8)` exit-code bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsckStatus {
    Clean,
    Repaired,
    NeedsRepair,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FsckOutcome {
    pub status: FsckStatus,
    pub reboot_required: bool,
    pub exit_code: i32,
}

impl FsckOutcome {
    /// Classify a standard e2fsprogs `fsck(8)` exit-code bitmap: bit 0
    /// errors corrected, bit 1 reboot required, bit 2 errors left
    /// uncorrected, bits 3/4/5/7 operational/usage/cancel/shared-lib
    /// errors (spec.md §4.2 "exit-code bitmap determines status").
    pub fn from_exit_code(code: i32, repair: bool) -> Self {
        let reboot_required = code & 2 != 0;
        let status = if code & (8 | 16 | 32 | 128) != 0 {
            FsckStatus::Failed
        } else if code & 4 != 0 {
            FsckStatus::NeedsRepair
        } else if repair && code & 1 != 0 {
            FsckStatus::Repaired
        } else {
            FsckStatus::Clean
        };
        Self { status, reboot_required, exit_code: code }
    }
}

#[async_trait]
pub trait FsckRunner: Send + Sync {
    /// Run `fsck` against `device_path`; `repair` selects `-y` over `-n`.
    async fn run(&self, device_path: &str, repair: bool) -> Result<FsckOutcome, FsckError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod stub {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::{FsckError, FsckOutcome, FsckRunner, FsckStatus};

    /// Fake runner: returns a programmed outcome per device path, or a
    /// clean result by default.
    #[derive(Default)]
    pub struct StubFsckRunner {
        responses: Mutex<HashMap<String, FsckOutcome>>,
    }

    impl StubFsckRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn program(&self, device_path: impl Into<String>, outcome: FsckOutcome) {
            self.responses.lock().insert(device_path.into(), outcome);
        }
    }

    #[async_trait]
    impl FsckRunner for StubFsckRunner {
        async fn run(&self, device_path: &str, _repair: bool) -> Result<FsckOutcome, FsckError> {
            Ok(self
                .responses
                .lock()
                .get(device_path)
                .cloned()
                .unwrap_or(FsckOutcome { status: FsckStatus::Clean, reboot_required: false, exit_code: 0 }))
        }
    }
}
