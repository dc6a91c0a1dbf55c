//! Session resume/stop/fork/doctor (spec.md §4.3, §6).
//!
//! Sessions come into being as a side effect of `POST /v1/jobs` naming a
//! `session_id` that doesn't exist yet (no dedicated create route), so
//! every test here bootstraps one through a job first.

use crate::prelude::*;

fn bootstrap_session(daemon: &Daemon, session_id: &str, workspace_name: &str) -> serde_json::Value {
    daemon
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
            session_id,
        ])
        .passes()
        .json()
}

#[test]
fn doctor_reports_workspace_and_sandbox_sections() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();
    bootstrap_session(&daemon, "sess-doctor", "ws-doctor");

    let report = daemon.fleet().json().args(&["session", "doctor", "sess-doctor"]).passes().json();
    let sections = report["sections"].as_array().unwrap();
    assert!(sections.iter().any(|s| s["title"] == "workspace"));
    assert!(sections.iter().any(|s| s["title"] == "sandbox"));
}

#[test]
fn resume_binds_a_fresh_sandbox() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();
    bootstrap_session(&daemon, "sess-resume", "ws-resume");

    // `session resume`'s JSON output is the bare `Session`, not the
    // sandbox it just bound, so the bound vmid's state is read back via
    // `sandbox touch` (there is no standalone `sandbox get`).
    let resumed = daemon.fleet().json().args(&["session", "resume", "sess-resume"]).passes().json();
    let vmid = resumed["current_vmid"].as_u64().unwrap().to_string();
    let sandbox = daemon.fleet().json().args(&["sandbox", "touch", &vmid]).passes().json();
    assert_eq!(sandbox["state"], "running");
}

#[test]
fn stop_with_no_bound_sandbox_is_a_no_op() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();
    bootstrap_session(&daemon, "sess-stop", "ws-stop");

    let stopped = daemon.fleet().json().args(&["session", "stop", "sess-stop"]).passes().json();
    assert!(stopped["current_vmid"].is_null());
}

#[test]
fn stop_after_resume_stops_the_bound_sandbox() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();
    bootstrap_session(&daemon, "sess-stop-resumed", "ws-stop-resumed");
    let resumed =
        daemon.fleet().json().args(&["session", "resume", "sess-stop-resumed"]).passes().json();
    let vmid = resumed["current_vmid"].as_u64().unwrap().to_string();

    daemon.fleet().args(&["session", "stop", "sess-stop-resumed"]).passes();
    let sandbox = daemon.fleet().json().args(&["sandbox", "touch", &vmid]).passes().json();
    assert_eq!(sandbox["state"], "stopped");
}

#[test]
fn fork_creates_a_new_session_on_a_forked_workspace() {
    let daemon = DaemonBuilder::new().profile("default", STUB_PROFILE).start();
    let job = bootstrap_session(&daemon, "sess-fork", "ws-fork");

    let forked = daemon.fleet().json().args(&["session", "fork", "sess-fork", "sess-fork-child"]).passes().json();
    assert_eq!(forked["name"], "sess-fork-child");
    assert_ne!(forked["workspace_id"], job["workspace_id"]);
    assert!(forked["current_vmid"].is_null());
}

#[test]
fn doctor_of_unknown_session_is_not_found() {
    let daemon = DaemonBuilder::new().start();

    daemon.fleet().args(&["session", "doctor", "sess-does-not-exist"]).fails();
}
