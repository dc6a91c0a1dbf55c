//! Exposure publish/unpublish (spec.md §4.4, §6).

use crate::prelude::*;

fn sandbox_vmid(daemon: &Daemon, name: &str) -> String {
    let sandbox = daemon.fleet().json().args(&["sandbox", "create", name, "--profile", "default"]).passes().json();
    sandbox["vmid"].as_u64().unwrap().to_string()
}

#[test]
fn create_publishes_a_port() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();
    let vmid = sandbox_vmid(&daemon, "box-exp-a");

    let exposure =
        daemon.fleet().json().args(&["exposure", "create", "exp-a", &vmid, "8080"]).passes().json();

    assert_eq!(exposure["name"], "exp-a");
    assert_eq!(exposure["vmid"], vmid.parse::<u64>().unwrap());
    assert_eq!(exposure["port"], 8080);
    assert!(exposure["url"].as_str().is_some_and(|u| !u.is_empty()));
}

#[test]
fn create_against_unknown_sandbox_is_not_found() {
    let daemon = DaemonBuilder::new().start();

    daemon.fleet().args(&["exposure", "create", "exp-b", "999999", "8080"]).fails();
}

#[test]
fn destroy_removes_the_exposure() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();
    let vmid = sandbox_vmid(&daemon, "box-exp-c");

    daemon.fleet().args(&["exposure", "create", "exp-c", &vmid, "9090"]).passes();
    daemon.fleet().args(&["exposure", "destroy", "exp-c"]).passes().stdout_has("Exposure destroyed:");
}

#[test]
fn destroy_of_unknown_name_fails() {
    let daemon = DaemonBuilder::new().start();

    daemon.fleet().args(&["exposure", "destroy", "nonexistent"]).fails();
}

#[test]
fn duplicate_port_on_same_sandbox_is_rejected() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();
    let vmid = sandbox_vmid(&daemon, "box-exp-d");

    daemon.fleet().args(&["exposure", "create", "exp-d1", &vmid, "7000"]).passes();
    daemon.fleet().args(&["exposure", "create", "exp-d2", &vmid, "7000"]).fails();
}
