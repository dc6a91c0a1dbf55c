//! Job submission and lookup (spec.md §4.3, §6).

use crate::prelude::*;

#[test]
fn create_without_workspace_reaches_running() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let job = daemon
        .fleet()
        .json()
        .args(&["job", "create", "https://example.invalid/repo.git", "--profile", "default", "--task", "echo hi"])
        .passes()
        .json();

    assert_eq!(job["profile"], "default");
    assert_eq!(job["ref"], "main");
    assert_eq!(job["status"], "running");
    assert!(job["sandbox_vmid"].as_u64().is_some());
}

#[test]
fn create_with_inline_workspace_binds_it() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let job = daemon
        .fleet()
        .json()
        .args(&[
            "job",
            "create",
            "https://example.invalid/repo.git",
            "--profile",
            "default",
            "--task",
            "build project",
            "--create-workspace-storage",
            "local-lvm",
            "--create-workspace-size-gb",
            "10",
        ])
        .passes()
        .json();

    assert!(job["workspace_id"].as_str().is_some());
    assert_eq!(job["status"], "running");
}

#[test]
fn create_with_session_id_bootstraps_a_session() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let job = daemon
        .fleet()
        .json()
        .args(&[
            "job",
            "create",
            "https://example.invalid/repo.git",
            "--profile",
            "default",
            "--task",
            "build project",
            "--create-workspace-storage",
            "local-lvm",
            "--create-workspace-size-gb",
            "10",
            "--session-id",
            "sess-a",
        ])
        .passes()
        .json();

    assert_eq!(job["session_id"], "sess-a");

    let session = daemon.fleet().json().args(&["session", "doctor", "sess-a"]).passes().json();
    assert!(session["sections"].as_array().is_some_and(|s| !s.is_empty()));
}

#[test]
fn session_id_without_workspace_is_rejected() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    daemon
        .fleet()
        .args(&[
            "job",
            "create",
            "https://example.invalid/repo.git",
            "--profile",
            "default",
            "--task",
            "build project",
            "--session-id",
            "sess-orphan",
        ])
        .fails();
}

#[test]
fn get_returns_the_job_by_id() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let created = daemon
        .fleet()
        .json()
        .args(&["job", "create", "https://example.invalid/repo.git", "--profile", "default", "--task", "echo hi"])
        .passes()
        .json();
    let id = created["id"].as_str().unwrap();

    let fetched = daemon.fleet().json().args(&["job", "get", id]).passes().json();
    assert_eq!(fetched["id"], created["id"]);
}

#[test]
fn get_with_events_tail_includes_events() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();

    let created = daemon
        .fleet()
        .json()
        .args(&["job", "create", "https://example.invalid/repo.git", "--profile", "default", "--task", "echo hi"])
        .passes()
        .json();
    let id = created["id"].as_str().unwrap();

    let fetched =
        daemon.fleet().json().args(&["job", "get", id, "--events-tail", "50"]).passes().json();
    assert!(fetched["events"].as_array().is_some_and(|e| !e.is_empty()));
}

#[test]
fn get_of_unknown_job_is_not_found() {
    let daemon = DaemonBuilder::new().start();

    daemon.fleet().args(&["job", "get", "job-does-not-exist"]).fails();
}
