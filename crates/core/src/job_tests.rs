// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_job_starts_queued_on_main_with_dangerous_mode() {
    let job = Job::new("https://example.invalid/repo.git", "default", "echo hi", 1_000);
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.git_ref, "main");
    assert_eq!(job.mode, JobMode::Dangerous);
    assert!(job.workspace_id.is_none());
    assert!(job.result_json.is_none());
}

#[test]
fn job_round_trips_through_json_with_ref_rename() {
    let job = Job::new("https://example.invalid/repo.git", "default", "echo hi", 1_000);
    let json = serde_json::to_string(&job).expect("serialize job");
    assert!(json.contains("\"ref\":\"main\""));
    let restored: Job = serde_json::from_str(&json).expect("deserialize job");
    assert_eq!(restored.id, job.id);
}

#[yare::parameterized(
    queued_to_running = { JobStatus::Queued, JobStatus::Running, true },
    queued_to_completed = { JobStatus::Queued, JobStatus::Completed, true },
    queued_to_failed = { JobStatus::Queued, JobStatus::Failed, true },
    running_to_completed = { JobStatus::Running, JobStatus::Completed, true },
    running_to_timeout = { JobStatus::Running, JobStatus::Timeout, true },
    running_to_queued_is_backwards = { JobStatus::Running, JobStatus::Queued, false },
    completed_is_terminal = { JobStatus::Completed, JobStatus::Running, false },
    failed_is_terminal = { JobStatus::Failed, JobStatus::Running, false },
)]
fn status_transitions_are_monotonic(from: JobStatus, to: JobStatus, expected: bool) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[yare::parameterized(
    queued = { JobStatus::Queued, false },
    running = { JobStatus::Running, false },
    completed = { JobStatus::Completed, true },
    failed = { JobStatus::Failed, true },
    timeout = { JobStatus::Timeout, true },
)]
fn is_terminal_matches_catalog(status: JobStatus, expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[test]
fn builder_can_set_workspace_and_session_bindings() {
    let job = Job::builder()
        .workspace_id(WorkspaceId::new())
        .session_id(SessionId::new("sess-1"))
        .status(JobStatus::Running)
        .build();
    assert!(job.workspace_id.is_some());
    assert_eq!(job.session_id, Some(SessionId::new("sess-1")));
    assert_eq!(job.status, JobStatus::Running);
}
