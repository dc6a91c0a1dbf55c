//! Sandbox create/start/stop/destroy/lease/events (spec.md §4.1, §6).

use crate::prelude::*;

#[test]
fn create_without_provision_returns_requested_sandbox() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let sandbox = daemon
        .fleet()
        .json()
        .args(&["sandbox", "create", "box-a", "--profile", "default"])
        .passes()
        .json();

    assert_eq!(sandbox["name"], "box-a");
    assert_eq!(sandbox["profile"], "default");
    assert_eq!(sandbox["state"], "requested");
}

#[test]
fn create_with_provision_reaches_running() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let sandbox = daemon
        .fleet()
        .json()
        .args(&["sandbox", "create", "box-b", "--profile", "default", "--provision"])
        .passes()
        .json();

    assert_eq!(sandbox["state"], "running");
    assert!(sandbox["ip"].as_str().is_some_and(|ip| !ip.is_empty()));
}

#[test]
fn unknown_profile_is_rejected() {
    let daemon = DaemonBuilder::new().start();

    daemon
        .fleet()
        .args(&["sandbox", "create", "box-c", "--profile", "nonexistent"])
        .fails()
        .stderr_has("nonexistent");
}

#[test]
fn start_stop_destroy_round_trip() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let sandbox = daemon
        .fleet()
        .json()
        .args(&["sandbox", "create", "box-d", "--profile", "default", "--provision"])
        .passes()
        .json();
    let vmid = sandbox["vmid"].as_u64().unwrap().to_string();

    let stopped = daemon.fleet().json().args(&["sandbox", "stop", &vmid]).passes().json();
    assert_eq!(stopped["state"], "stopped");

    let started = daemon.fleet().json().args(&["sandbox", "start", &vmid]).passes().json();
    assert_eq!(started["state"], "running");

    let destroyed = daemon.fleet().json().args(&["sandbox", "stop", &vmid]).passes().json();
    assert_eq!(destroyed["state"], "stopped");

    let destroyed = daemon.fleet().json().args(&["sandbox", "destroy", &vmid]).passes().json();
    assert_eq!(destroyed["state"], "destroyed");
}

#[test]
fn touch_updates_last_used_at() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let sandbox =
        daemon.fleet().json().args(&["sandbox", "create", "box-e", "--profile", "default"]).passes().json();
    let vmid = sandbox["vmid"].as_u64().unwrap().to_string();
    let before = sandbox["last_used_at"].as_u64().unwrap();

    std::thread::sleep(std::time::Duration::from_millis(5));
    let touched = daemon.fleet().json().args(&["sandbox", "touch", &vmid]).passes().json();
    assert!(touched["last_used_at"].as_u64().unwrap() >= before);
}

#[test]
fn renew_lease_extends_expiry() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let sandbox =
        daemon.fleet().json().args(&["sandbox", "create", "box-f", "--profile", "default"]).passes().json();
    let vmid = sandbox["vmid"].as_u64().unwrap().to_string();

    let renewed =
        daemon.fleet().json().args(&["sandbox", "renew-lease", &vmid, "3600"]).passes().json();
    assert!(renewed["lease_expires"].as_u64().unwrap_or(0) > 0);
}

#[test]
fn events_lists_lifecycle_events() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let sandbox = daemon
        .fleet()
        .json()
        .args(&["sandbox", "create", "box-g", "--profile", "default", "--provision"])
        .passes()
        .json();
    let vmid = sandbox["vmid"].as_u64().unwrap().to_string();

    let page = daemon.fleet().json().args(&["sandbox", "events", &vmid]).passes().json();
    let events = page["events"].as_array().unwrap();
    assert!(!events.is_empty(), "provisioning a sandbox should record at least one event");
}

#[test]
fn destroy_of_unknown_vmid_is_not_found() {
    let daemon = DaemonBuilder::new().start();

    daemon.fleet().args(&["sandbox", "destroy", "999999"]).fails();
}
