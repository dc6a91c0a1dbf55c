// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fleetd-adapters: the collaborator contracts spec.md §1 calls out as
//! out of scope for the core ("the hypervisor driver... the cloud-init
//! snippet store... the exposure publisher") plus a stub implementation
//! of each, used to drive the in-process tests spec.md §8 requires.
//!
//! Nothing in `fleetd-engine` depends on a concrete backend — every
//! manager takes `Arc<dyn HypervisorBackend>` / `Arc<dyn
//! ExposurePublisher>` / `Arc<dyn SnippetStore>`, matching spec.md §9's
//! "dynamic dispatch on backend" design note.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bootstrap;
pub mod exposure;
pub mod fsck;
pub mod hypervisor;
pub mod snippet;
#[cfg(any(test, feature = "test-support"))]
pub mod stub;

pub use bootstrap::BootstrapToken;
pub use exposure::{ExposurePublisher, PublishError};
pub use fsck::{FsckError, FsckOutcome, FsckRunner, FsckStatus};
pub use hypervisor::{
    BackendError, GuestStatus, HypervisorBackend, SnapshotInfo, VmConfig, VolumeInfo,
};
pub use snippet::{SnippetError, SnippetStore};
#[cfg(any(test, feature = "test-support"))]
pub use stub::{StubExposurePublisher, StubFsckRunner, StubHypervisorBackend, StubSnippetStore};
