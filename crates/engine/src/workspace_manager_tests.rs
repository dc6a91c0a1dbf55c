// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use fleetd_adapters::stub::{StubFsckRunner, StubHypervisorBackend};
use fleetd_core::{FakeClock, OwnerId, Sandbox, WorkspaceError};
use fleetd_storage::memory::MemoryStore;
use tokio_util::sync::CancellationToken;

use super::*;

fn manager() -> WorkspaceManager<FakeClock> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let backend: Arc<dyn HypervisorBackend> = Arc::new(StubHypervisorBackend::new());
    let fsck: Arc<dyn FsckRunner> = Arc::new(StubFsckRunner::new());
    WorkspaceManager::new(store, backend, fsck, FakeClock::new())
}

#[tokio::test]
async fn create_then_resolve_by_id_and_name() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.expect("create");
    assert_eq!(mgr.resolve(&workspace.id.to_string()).unwrap().id, workspace.id);
    assert_eq!(mgr.resolve("ws-one").unwrap().id, workspace.id);
}

#[tokio::test]
async fn create_duplicate_name_is_rejected() {
    let mgr = manager();
    mgr.create("dup", "local-lvm", 20).await.expect("first create");
    let err = mgr.create("dup", "local-lvm", 20).await.unwrap_err();
    assert!(matches!(err, WorkspaceError::AlreadyExists(_)));
}

#[tokio::test]
async fn attach_requires_known_sandbox() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    let err = mgr.attach(&workspace.id, Vmid(1000)).unwrap_err();
    assert!(matches!(err, WorkspaceError::SandboxNotFound(_)));
}

#[tokio::test]
async fn attach_then_detach_round_trips() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    mgr.store.put_sandbox(Sandbox::builder().vmid(Vmid(1000)).build()).unwrap();

    let attached = mgr.attach(&workspace.id, Vmid(1000)).expect("attach");
    assert_eq!(attached.attached_vm, Some(Vmid(1000)));
    assert!(matches!(mgr.attach(&workspace.id, Vmid(1000)), Err(WorkspaceError::Attached(_))));

    let detached = mgr.detach(&workspace.id).expect("detach");
    assert_eq!(detached.attached_vm, None);
    assert!(matches!(mgr.detach(&workspace.id), Err(WorkspaceError::NotAttached(_))));
}

#[tokio::test]
async fn attach_rejects_vmid_already_holding_another_workspace() {
    let mgr = manager();
    let a = mgr.create("ws-a", "local-lvm", 20).await.unwrap();
    let b = mgr.create("ws-b", "local-lvm", 20).await.unwrap();
    mgr.store.put_sandbox(Sandbox::builder().vmid(Vmid(1000)).build()).unwrap();
    mgr.attach(&a.id, Vmid(1000)).unwrap();
    let err = mgr.attach(&b.id, Vmid(1000)).unwrap_err();
    assert!(matches!(err, WorkspaceError::VmInUse { .. }));
}

#[tokio::test]
async fn try_acquire_denies_second_owner_then_release_frees_it() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    let first = mgr.try_acquire(&workspace.id, OwnerId::job(fleetd_core::JobId::new()), Duration::from_secs(60)).expect("first acquire");
    let second = mgr.try_acquire(&workspace.id, OwnerId::job(fleetd_core::JobId::new()), Duration::from_secs(60));
    assert!(matches!(second, Err(WorkspaceError::Lease(fleetd_core::LeaseError::Held(_)))));

    mgr.release(&workspace.id, &first.owner, &first.nonce).expect("release");
    assert!(mgr.try_acquire(&workspace.id, OwnerId::job(fleetd_core::JobId::new()), Duration::from_secs(60)).is_ok());
}

#[tokio::test]
async fn renew_requires_matching_owner_and_nonce() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    let owner = OwnerId::job(fleetd_core::JobId::new());
    let held = mgr.try_acquire(&workspace.id, owner.clone(), Duration::from_secs(60)).unwrap();
    assert!(mgr.renew(&workspace.id, &held.owner, &held.nonce, Duration::from_secs(120)).is_ok());

    let wrong_nonce = fleetd_core::Nonce::generate();
    assert!(mgr.renew(&workspace.id, &held.owner, &wrong_nonce, Duration::from_secs(120)).is_err());
}

#[tokio::test]
async fn acquire_with_wait_succeeds_once_holder_releases() {
    let mgr = Arc::new(manager());
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    let holder = mgr.try_acquire(&workspace.id, OwnerId::job(fleetd_core::JobId::new()), Duration::from_secs(60)).unwrap();

    let waiter_mgr = Arc::clone(&mgr);
    let id = workspace.id.clone();
    let waiter = tokio::spawn(async move {
        let cancel = CancellationToken::new();
        waiter_mgr
            .acquire_with_wait(&id, OwnerId::job(fleetd_core::JobId::new()), Duration::from_secs(60), 5, &cancel)
            .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    mgr.release(&workspace.id, &holder.owner, &holder.nonce).unwrap();

    let outcome = waiter.await.unwrap().expect("waiter should acquire after release");
    assert_eq!(outcome.workspace.id, workspace.id);
}

#[tokio::test]
async fn acquire_with_wait_zero_seconds_fails_fast_when_held() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    mgr.try_acquire(&workspace.id, OwnerId::job(fleetd_core::JobId::new()), Duration::from_secs(60)).unwrap();

    let cancel = CancellationToken::new();
    let err = mgr
        .acquire_with_wait(&workspace.id, OwnerId::job(fleetd_core::JobId::new()), Duration::from_secs(60), 0, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Lease(fleetd_core::LeaseError::NoWait)));
}

#[tokio::test]
async fn fork_requires_detached_source() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    mgr.store.put_sandbox(Sandbox::builder().vmid(Vmid(1000)).build()).unwrap();
    mgr.attach(&workspace.id, Vmid(1000)).unwrap();
    let err = mgr.fork(&workspace.id, "ws-fork", None).await.unwrap_err();
    assert!(matches!(err, WorkspaceError::MustBeDetached(_)));
}

#[tokio::test]
async fn fork_creates_new_workspace_and_releases_lease() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    let forked = mgr.fork(&workspace.id, "ws-fork", None).await.expect("fork");
    assert_eq!(forked.name, "ws-fork");
    assert_ne!(forked.id, workspace.id);
    // lease released on exit: a fresh acquire against the source should succeed immediately
    assert!(mgr.try_acquire(&workspace.id, OwnerId::job(fleetd_core::JobId::new()), Duration::from_secs(60)).is_ok());
}

#[tokio::test]
async fn snapshot_create_list_restore_round_trip() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    mgr.snapshot_create(&workspace.id, "pre-job").await.expect("create");
    let snapshots = mgr.snapshot_list(&workspace.id).await.expect("list");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].name, "pre-job");
    mgr.snapshot_restore(&workspace.id, "pre-job").await.expect("restore");
    assert!(mgr.snapshot_restore(&workspace.id, "missing").await.is_err());
}

#[tokio::test]
async fn fsck_runs_against_device_path_and_releases_lease() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    let outcome = mgr.fsck(&workspace.id, false).await.expect("fsck");
    assert_eq!(outcome.status, fleetd_adapters::FsckStatus::Clean);
    assert!(mgr.try_acquire(&workspace.id, OwnerId::job(fleetd_core::JobId::new()), Duration::from_secs(60)).is_ok());
}

#[tokio::test]
async fn check_surfaces_missing_volume() {
    let mgr = manager();
    let workspace = mgr.create("ws-one", "local-lvm", 20).await.unwrap();
    assert!(mgr.check(&workspace.id).await.is_ok());
    mgr.backend.volume_delete(&workspace.volume_id).await.unwrap();
    assert!(mgr.check(&workspace.id).await.is_err());
}
