// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use fleetd_adapters::stub::{StubHypervisorBackend, StubSnippetStore};
use fleetd_core::{FakeClock, JobId, NetworkMode, Profile, SandboxState};

use super::*;

fn manager() -> SandboxManager<FakeClock> {
    let store: Arc<dyn Store> = Arc::new(fleetd_storage::memory::MemoryStore::new());
    let backend: Arc<dyn HypervisorBackend> = Arc::new(StubHypervisorBackend::new());
    let snippets: Arc<dyn SnippetStore> = Arc::new(StubSnippetStore::new());
    SandboxManager::new(store, backend, snippets, FakeClock::new())
}

fn profile(name: &str, idle_stop_minutes: u32) -> Profile {
    Profile {
        name: name.to_string(),
        template: "ubuntu-24.04".to_string(),
        cores: 2,
        memory_mb: 2048,
        cpu_pin: None,
        bridge: "vmbr0".to_string(),
        network_mode: NetworkMode::Restricted,
        idle_stop_minutes,
        default_ttl_minutes: 60,
        default_keepalive: false,
        allow_host_mounts: false,
        ssh_pub_key: None,
    }
}

#[tokio::test]
async fn transition_rejects_destroyed_as_source() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Destroyed).build()).unwrap();
    let err = mgr.transition(vmid, SandboxState::Running).unwrap_err();
    assert!(matches!(err, SandboxError::InvalidTransition { .. }));
}

#[tokio::test]
async fn transition_walks_the_happy_path() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Requested).build()).unwrap();
    mgr.transition(vmid, SandboxState::Provisioning).expect("requested -> provisioning");
    mgr.transition(vmid, SandboxState::Booting).expect("provisioning -> booting");
    let ready = mgr.transition(vmid, SandboxState::Ready).expect("booting -> ready");
    assert_eq!(ready.state, SandboxState::Ready);
}

#[tokio::test]
async fn start_requires_stopped_and_reaches_running() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Ready).build()).unwrap();
    assert!(matches!(mgr.start(vmid).await.unwrap_err(), SandboxError::InvalidTransition { .. }));

    mgr.store.update_sandbox(vmid, 0, &mut |s| s.state = SandboxState::Stopped).unwrap();
    mgr.backend.clone_vm("ubuntu-24.04", vmid, "test").await.unwrap();
    let started = mgr.start(vmid).await.expect("start");
    assert_eq!(started.state, SandboxState::Running);
}

#[tokio::test]
async fn stop_requires_ready_or_running() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Booting).build()).unwrap();
    assert!(matches!(mgr.stop(vmid).await.unwrap_err(), SandboxError::InvalidTransition { .. }));

    mgr.store.update_sandbox(vmid, 0, &mut |s| s.state = SandboxState::Running).unwrap();
    mgr.backend.clone_vm("ubuntu-24.04", vmid, "test").await.unwrap();
    mgr.backend.start(vmid).await.unwrap();
    let stopped = mgr.stop(vmid).await.expect("stop");
    assert_eq!(stopped.state, SandboxState::Stopped);
}

#[tokio::test]
async fn destroy_is_gated_unless_force_or_already_destroyed() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Running).build()).unwrap();
    let err = mgr.destroy(vmid, false).await.unwrap_err();
    assert!(matches!(err, SandboxError::DestroyGated { .. }));

    let destroyed = mgr.destroy(vmid, true).await.expect("forced destroy");
    assert_eq!(destroyed.state, SandboxState::Destroyed);
    // idempotent against an already-destroyed row, no force required
    let again = mgr.destroy(vmid, false).await.expect("destroy on destroyed is a no-op");
    assert_eq!(again.state, SandboxState::Destroyed);
}

#[tokio::test]
async fn destroy_removes_cloud_init_snippet_and_exposures() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Stopped).build()).unwrap();
    mgr.snippets.write(vmid, "#cloud-config\n").await.unwrap();
    mgr.destroy(vmid, false).await.expect("destroy");
}

#[tokio::test]
async fn revert_is_gated_while_a_job_holds_a_running_sandbox() {
    let mgr = manager();
    let vmid = Vmid(1000);
    let job_id = JobId::new();
    mgr.store
        .put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Running).job_id(job_id.clone()).build())
        .unwrap();
    let err = mgr.revert(vmid, false, false).await.unwrap_err();
    assert!(matches!(err, SandboxError::SandboxInUse { .. }));
}

#[tokio::test]
async fn revert_restores_clean_snapshot_and_restarts_when_asked() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Running).build()).unwrap();
    mgr.backend.clone_vm("ubuntu-24.04", vmid, "test").await.unwrap();
    mgr.backend.start(vmid).await.unwrap();
    mgr.backend.snapshot_create(vmid, "clean").await.unwrap();

    let outcome = mgr.revert(vmid, false, true).await.expect("revert");
    assert_eq!(outcome.snapshot, "clean");
    assert!(outcome.was_running);
}

#[tokio::test]
async fn revert_fails_without_a_clean_snapshot() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Stopped).build()).unwrap();
    mgr.backend.clone_vm("ubuntu-24.04", vmid, "test").await.unwrap();
    let err = mgr.revert(vmid, false, false).await.unwrap_err();
    assert!(matches!(err, SandboxError::Backend(_)));
}

#[tokio::test]
async fn renew_lease_requires_ready_or_running() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Stopped).build()).unwrap();
    assert!(matches!(mgr.renew_lease(vmid, 60_000).unwrap_err(), SandboxError::LeaseNotRenewable { .. }));

    mgr.store.update_sandbox(vmid, 0, &mut |s| s.state = SandboxState::Running).unwrap();
    let renewed = mgr.renew_lease(vmid, 60_000).expect("renew");
    assert!(renewed.lease_expires > 0);
}

#[tokio::test]
async fn prune_orphans_destroys_rows_the_backend_no_longer_knows() {
    let mgr = manager();
    let known = Vmid(1000);
    let orphan = Vmid(1001);
    mgr.store.put_sandbox(Sandbox::builder().vmid(known).state(SandboxState::Running).build()).unwrap();
    mgr.store.put_sandbox(Sandbox::builder().vmid(orphan).state(SandboxState::Running).build()).unwrap();
    mgr.backend.clone_vm("ubuntu-24.04", known, "test").await.unwrap();
    // orphan was never cloned on the backend, so its status lookup is NotFound

    let pruned = mgr.prune_orphans().await;
    assert_eq!(pruned, 1);
    assert_eq!(mgr.store.get_sandbox(orphan).unwrap().state, SandboxState::Destroyed);
    assert_eq!(mgr.store.get_sandbox(known).unwrap().state, SandboxState::Running);
}

#[tokio::test]
async fn prune_orphans_skips_rows_still_mid_provisioning() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Provisioning).build()).unwrap();
    let pruned = mgr.prune_orphans().await;
    assert_eq!(pruned, 0);
    assert_eq!(mgr.store.get_sandbox(vmid).unwrap().state, SandboxState::Provisioning);
}

#[tokio::test]
async fn snapshot_ops_are_forbidden_while_mid_provisioning() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Booting).build()).unwrap();
    let err = mgr.snapshot_create(vmid, "manual", true).await.unwrap_err();
    assert!(matches!(err, SandboxError::InvalidTransition { .. }));
}

#[tokio::test]
async fn snapshot_create_requires_stopped_and_detached_unless_forced() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Running).build()).unwrap();
    mgr.backend.clone_vm("ubuntu-24.04", vmid, "test").await.unwrap();
    assert!(matches!(mgr.snapshot_create(vmid, "manual", false).await.unwrap_err(), SandboxError::SnapshotActive { .. }));
    assert!(mgr.snapshot_create(vmid, "manual", true).await.is_ok());
}

#[tokio::test]
async fn snapshot_list_excludes_current_and_sorts_case_insensitively() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store.put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Stopped).build()).unwrap();
    mgr.backend.clone_vm("ubuntu-24.04", vmid, "test").await.unwrap();
    mgr.backend.snapshot_create(vmid, "current").await.unwrap();
    mgr.backend.snapshot_create(vmid, "Zeta").await.unwrap();
    mgr.backend.snapshot_create(vmid, "alpha").await.unwrap();

    let snapshots = mgr.snapshot_list(vmid).await.expect("list");
    let names: Vec<_> = snapshots.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "Zeta"]);
}

#[tokio::test]
async fn lease_gc_scan_stops_sandboxes_with_expired_non_keepalive_leases() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store
        .put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Running).keepalive(false).lease_expires(500).build())
        .unwrap();
    mgr.backend.clone_vm("ubuntu-24.04", vmid, "test").await.unwrap();
    mgr.backend.start(vmid).await.unwrap();
    mgr.clock.set_epoch_ms(1_000_000);

    let affected = mgr.lease_gc_scan().await;
    assert_eq!(affected, 1);
    assert_eq!(mgr.store.get_sandbox(vmid).unwrap().state, SandboxState::Stopped);
}

#[tokio::test]
async fn lease_gc_scan_leaves_keepalive_sandboxes_alone() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store
        .put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Running).keepalive(true).lease_expires(500).build())
        .unwrap();
    mgr.clock.set_epoch_ms(1_000_000);
    let affected = mgr.lease_gc_scan().await;
    assert_eq!(affected, 0);
    assert_eq!(mgr.store.get_sandbox(vmid).unwrap().state, SandboxState::Running);
}

#[tokio::test]
async fn idle_stop_scan_stops_running_sandboxes_past_the_profile_threshold() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store
        .put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Running).last_used_at(0).build())
        .unwrap();
    mgr.backend.clone_vm("ubuntu-24.04", vmid, "test").await.unwrap();
    mgr.backend.start(vmid).await.unwrap();
    mgr.clock.set_epoch_ms(10 * 60_000);

    let profiles = vec![profile("default", 5)];
    let affected = mgr.idle_stop_scan(&profiles).await;
    assert_eq!(affected, 1);
    assert_eq!(mgr.store.get_sandbox(vmid).unwrap().state, SandboxState::Stopped);
}

#[tokio::test]
async fn idle_stop_scan_ignores_profiles_with_idle_stop_disabled() {
    let mgr = manager();
    let vmid = Vmid(1000);
    mgr.store
        .put_sandbox(Sandbox::builder().vmid(vmid).state(SandboxState::Running).last_used_at(0).build())
        .unwrap();
    mgr.clock.set_epoch_ms(10 * 60_000);
    let profiles = vec![profile("default", 0)];
    let affected = mgr.idle_stop_scan(&profiles).await;
    assert_eq!(affected, 0);
}
