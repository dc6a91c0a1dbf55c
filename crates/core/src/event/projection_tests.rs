// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::job::JobId;
use crate::sandbox::Vmid;
use serde_json::json;

fn ev(id: &str, ts: u64, kind: &str, vmid: Option<u32>, job: Option<&str>, payload: serde_json::Value) -> Event {
    Event {
        id: crate::event::EventId::from_string(id),
        timestamp: ts,
        kind: EventKind::new(kind),
        sandbox_vmid: vmid.map(Vmid),
        job_id: job.map(JobId::from_string),
        message: String::new(),
        payload,
    }
}

#[test]
fn sandbox_state_transitions_update_health() {
    let mut projection = Projection::new();
    projection.apply_event(&ev(
        "evt-1",
        1,
        "sandbox.state",
        Some(1000),
        None,
        json!({"vmid": 1000, "from_state": "booting", "to_state": "ready"}),
    ));
    let health = projection.sandbox_health(Vmid(1000)).expect("health recorded");
    assert_eq!(health.state, Some(SandboxState::Ready));
    assert!(health.healthy);
}

#[test]
fn sandbox_failure_marks_unhealthy_and_increments_count() {
    let mut projection = Projection::new();
    projection.apply_event(&ev(
        "evt-1",
        1,
        "sandbox.provision.failed",
        Some(1000),
        None,
        json!({"vmid": 1000, "message": "boom"}),
    ));
    let health = projection.sandbox_health(Vmid(1000)).expect("health recorded");
    assert!(!health.healthy);
    assert_eq!(health.failure_count, 1);
}

#[test]
fn duplicate_event_id_is_idempotent() {
    let mut projection = Projection::new();
    let event = ev(
        "evt-1",
        1,
        "sandbox.provision.failed",
        Some(1000),
        None,
        json!({"vmid": 1000, "message": "boom"}),
    );
    projection.apply_event(&event);
    projection.apply_event(&event);
    let health = projection.sandbox_health(Vmid(1000)).expect("health recorded");
    assert_eq!(health.failure_count, 1);
}

#[test]
fn job_running_sets_started_at_to_earliest_observation() {
    let mut projection = Projection::new();
    projection.apply_event(&ev("evt-2", 200, "job.running", None, Some("job-1"), json!({"job_id": "job-1"})));
    projection.apply_event(&ev("evt-1", 100, "job.slo.start", None, Some("job-1"), json!({"job_id": "job-1"})));
    let timeline = projection.job_timeline(&JobId::from_string("job-1")).expect("timeline recorded");
    assert_eq!(timeline.started_at, Some(100));
}

#[test]
fn job_report_completed_sets_completed_at() {
    let mut projection = Projection::new();
    projection.apply_event(&ev(
        "evt-1",
        100,
        "job.report",
        None,
        Some("job-1"),
        json!({"job_id": "job-1", "status": "completed"}),
    ));
    let timeline = projection.job_timeline(&JobId::from_string("job-1")).expect("timeline recorded");
    assert_eq!(timeline.status, Some(JobStatus::Completed));
    assert_eq!(timeline.completed_at, Some(100));
}

#[test]
fn recent_failure_ring_caps_at_ten_and_is_fifo() {
    let mut projection = Projection::new();
    for i in 0..15u64 {
        projection.apply_event(&ev(
            &format!("evt-{i}"),
            i,
            "sandbox.provision.failed",
            Some(1000),
            None,
            json!({"vmid": 1000, "message": format!("boom-{i}")}),
        ));
    }
    let failures: Vec<_> = projection.recent_failures().collect();
    assert_eq!(failures.len(), 10);
    assert_eq!(failures.first().expect("ring non-empty").event_id, "evt-5");
    assert_eq!(failures.last().expect("ring non-empty").event_id, "evt-14");
}

#[test]
fn timeout_kind_counts_as_recent_failure() {
    let mut projection = Projection::new();
    projection.apply_event(&ev("evt-1", 1, "sandbox.timeout", Some(1000), None, json!({"vmid": 1000})));
    assert_eq!(projection.recent_failures().count(), 1);
}

#[test]
fn replay_is_order_independent_with_duplicates() {
    let running = ev("evt-1", 100, "job.running", None, Some("job-1"), json!({"job_id": "job-1"}));
    let failed = ev(
        "evt-2",
        200,
        "job.report",
        None,
        Some("job-1"),
        json!({"job_id": "job-1", "status": "failed"}),
    );

    let mut in_order = Projection::new();
    in_order.replay([&running, &failed]);

    let mut reversed = Projection::new();
    reversed.replay([&failed, &running, &failed]);

    let job = JobId::from_string("job-1");
    let in_order_timeline = in_order.job_timeline(&job).expect("timeline recorded");
    let reversed_timeline = reversed.job_timeline(&job).expect("timeline recorded");

    assert_eq!(reversed_timeline.status, Some(JobStatus::Failed));
    assert_eq!(reversed_timeline.status, in_order_timeline.status);
    assert_eq!(reversed_timeline.completed_at, in_order_timeline.completed_at);
    assert_eq!(reversed_timeline.event_count, in_order_timeline.event_count);
}
