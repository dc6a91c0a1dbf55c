//! Daemon startup, lock contention, and `/v1/status` (spec.md §9).

use crate::prelude::*;
use std::process::Stdio;

fn fleetd_binary() -> std::path::PathBuf {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let llvm_cov = manifest_dir.join("target/llvm-cov-target/debug/fleetd");
    if llvm_cov.exists() {
        llvm_cov
    } else {
        manifest_dir.join("target/debug/fleetd")
    }
}

fn pick_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[test]
fn socket_exists_once_the_daemon_is_ready() {
    let daemon = DaemonBuilder::new().start();
    assert!(daemon.socket_path().exists());
}

#[test]
fn second_daemon_against_the_same_state_dir_refuses_to_start() {
    let daemon = DaemonBuilder::new().start();

    let mut second = std::process::Command::new(fleetd_binary());
    second.env("FLEETD_STATE_DIR", daemon.state_dir());
    second.env("RUST_LOG", "warn");
    second.env_remove("FLEETD_HOST");
    second.stdout(Stdio::null());
    second.stderr(Stdio::null());

    let mut child = second.spawn().expect("second fleetd should spawn");
    let status = child.wait().expect("second fleetd should exit");
    assert!(!status.success(), "a second daemon against the same state dir should refuse to start");
}

#[test]
fn status_reports_task_health_and_metrics() {
    let daemon = DaemonBuilder::new().start();

    let status = daemon.fleet().json().args(&["status"]).passes().json();
    assert!(status["tasks"].is_object());
    assert!(status["recent_failures"].as_array().is_some());
}

#[test]
fn tcp_status_succeeds_with_the_configured_token() {
    let daemon = DaemonBuilder::new().tcp_port(pick_free_port()).auth_token("s3cr3t-token").start();

    daemon.fleet_tcp().args(&["status"]).passes();
}

#[test]
fn tcp_status_without_a_token_is_rejected() {
    let daemon = DaemonBuilder::new().tcp_port(pick_free_port()).auth_token("s3cr3t-token").start();

    daemon.fleet_tcp_no_token().args(&["status"]).fails();
}
