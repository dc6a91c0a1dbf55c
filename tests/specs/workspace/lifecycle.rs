//! Workspace create/attach/detach/fork/check/snapshot (spec.md §4.2, §6).

use crate::prelude::*;

#[test]
fn create_returns_a_volume_backed_workspace() {
    let daemon = DaemonBuilder::new().start();

    let workspace = daemon
        .fleet()
        .json()
        .args(&["workspace", "create", "ws-a", "local-lvm", "20"])
        .passes()
        .json();

    assert_eq!(workspace["name"], "ws-a");
    assert_eq!(workspace["storage"], "local-lvm");
    assert_eq!(workspace["size_gb"], 20);
    assert!(workspace["attached_vm"].is_null());
}

#[test]
fn get_resolves_by_id() {
    let daemon = DaemonBuilder::new().start();

    let created =
        daemon.fleet().json().args(&["workspace", "create", "ws-b", "local-lvm", "10"]).passes().json();
    let id = created["id"].as_str().unwrap();

    let fetched = daemon.fleet().json().args(&["workspace", "get", id]).passes().json();
    assert_eq!(fetched["id"], created["id"]);
}

#[test]
fn attach_and_detach_round_trip() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let workspace =
        daemon.fleet().json().args(&["workspace", "create", "ws-c", "local-lvm", "10"]).passes().json();
    let id = workspace["id"].as_str().unwrap();
    let sandbox =
        daemon.fleet().json().args(&["sandbox", "create", "box-ws", "--profile", "default"]).passes().json();
    let vmid = sandbox["vmid"].as_u64().unwrap().to_string();

    let attached = daemon.fleet().json().args(&["workspace", "attach", id, &vmid]).passes().json();
    assert_eq!(attached["attached_vm"], sandbox["vmid"]);

    let detached = daemon.fleet().json().args(&["workspace", "detach", id]).passes().json();
    assert!(detached["attached_vm"].is_null());
}

#[test]
fn attaching_a_vmid_already_bound_elsewhere_is_rejected() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let ws1 = daemon.fleet().json().args(&["workspace", "create", "ws-d1", "local-lvm", "10"]).passes().json();
    let ws2 = daemon.fleet().json().args(&["workspace", "create", "ws-d2", "local-lvm", "10"]).passes().json();
    let sandbox =
        daemon.fleet().json().args(&["sandbox", "create", "box-collide", "--profile", "default"]).passes().json();
    let vmid = sandbox["vmid"].as_u64().unwrap().to_string();

    daemon.fleet().args(&["workspace", "attach", ws1["id"].as_str().unwrap(), &vmid]).passes();
    daemon.fleet().args(&["workspace", "attach", ws2["id"].as_str().unwrap(), &vmid]).fails();
}

#[test]
fn fork_creates_an_independent_workspace() {
    let daemon = DaemonBuilder::new().start();

    let original =
        daemon.fleet().json().args(&["workspace", "create", "ws-e", "local-lvm", "15"]).passes().json();
    let id = original["id"].as_str().unwrap();

    let forked = daemon.fleet().json().args(&["workspace", "fork", id, "ws-e-fork"]).passes().json();
    assert_eq!(forked["name"], "ws-e-fork");
    assert_ne!(forked["id"], original["id"]);
}

#[test]
fn check_runs_fsck_against_the_volume() {
    let daemon = DaemonBuilder::new().start();

    let workspace =
        daemon.fleet().json().args(&["workspace", "create", "ws-f", "local-lvm", "10"]).passes().json();
    let id = workspace["id"].as_str().unwrap();

    daemon.fleet().args(&["workspace", "check", id]).passes().stdout_has("fsck:");
}

#[test]
fn snapshot_create_then_restore_round_trip() {
    let daemon = DaemonBuilder::new().start();

    let workspace =
        daemon.fleet().json().args(&["workspace", "create", "ws-g", "local-lvm", "10"]).passes().json();
    let id = workspace["id"].as_str().unwrap();

    daemon.fleet().args(&["workspace", "snapshot", id, "clean"]).passes().stdout_has("Snapshot created:");
    daemon.fleet().args(&["workspace", "restore", id, "clean"]).passes().stdout_has("Restored from snapshot:");
}

#[test]
fn restore_of_unknown_snapshot_fails() {
    let daemon = DaemonBuilder::new().start();

    let workspace =
        daemon.fleet().json().args(&["workspace", "create", "ws-h", "local-lvm", "10"]).passes().json();
    let id = workspace["id"].as_str().unwrap();

    daemon.fleet().args(&["workspace", "restore", id, "nonexistent"]).fails();
}
