// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /v1/jobs`, `GET /v1/jobs/{id}` (spec.md §6), and the guest
//! runner's report callback (spec.md §4.3 `HandleReport`) — not named in
//! §6's route bullets, but required by the bootstrap-token flow §6 itself
//! describes ("presented by the guest runner over `Authorization:
//! Bearer`"). Authenticated by the job's own bootstrap token, not the
//! daemon's bearer-auth middleware.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use fleetd_core::{Clock, Job, JobId, JobMode, Session, SessionId, SystemClock};
use fleetd_engine::JobReport;
use fleetd_wire::requests::{CreateJobRequest, JobReportRequest};
use serde::{Deserialize, Serialize};

use crate::api::error::{bad_request, not_found, store_error, AppError};
use crate::state::AppState;

fn parse_job_mode(raw: &str) -> Result<JobMode, AppError> {
    match raw {
        "dangerous" => Ok(JobMode::Dangerous),
        "safe" => Ok(JobMode::Safe),
        other => Err(bad_request(format!("unknown job mode {other:?}"))),
    }
}

pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let now = SystemClock.epoch_ms();

    let workspace_id = if let Some(spec) = &request.workspace_create {
        let workspace = state.workspaces.create(&spec.name, &spec.storage, spec.size_gb).await?;
        Some(workspace.id)
    } else if let Some(id) = &request.workspace_id {
        Some(state.workspaces.resolve(id)?.id)
    } else {
        None
    };

    let mut job = Job::new(request.repo_url.clone(), request.profile.clone(), request.task.clone(), now);
    if let Some(git_ref) = &request.git_ref {
        job.git_ref = git_ref.clone();
    }
    if let Some(mode) = &request.mode {
        job.mode = parse_job_mode(mode)?;
    }
    if let Some(ttl_minutes) = request.ttl_minutes {
        job.ttl_minutes = ttl_minutes;
    }
    if let Some(keepalive) = request.keepalive {
        job.keepalive = keepalive;
    }
    job.workspace_id = workspace_id;

    // No dedicated `POST /v1/sessions` route exists (spec.md §6 only
    // names resume/stop/fork/doctor); a session first comes into being
    // here, the moment a job names one that isn't already on file.
    if let Some(raw_session_id) = &request.session_id {
        let session_id = SessionId::new(raw_session_id.clone());
        if state.store.get_session(&session_id).is_err() {
            let workspace_id = workspace_id
                .ok_or_else(|| bad_request("session_id requires workspace_id or workspace_create"))?;
            let mut session = Session::new(raw_session_id.clone(), workspace_id, &job.profile, &job.git_ref, now);
            session.id = session_id.clone();
            state.store.put_session(session).map_err(store_error)?;
        }
        job.session_id = Some(session_id);
    }

    state.store.put_job(job.clone()).map_err(store_error)?;

    let outcome = state.jobs.run(&job.id, request.workspace_wait_seconds.unwrap_or(0) as i64).await?;
    Ok((StatusCode::CREATED, Json(outcome.job)))
}

#[derive(Debug, Deserialize)]
pub struct GetJobQuery {
    pub events_tail: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct JobWithEvents {
    #[serde(flatten)]
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<fleetd_core::Event>>,
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<GetJobQuery>,
) -> Result<Json<JobWithEvents>, AppError> {
    let job_id = JobId::from_string(&id);
    let job = state.store.get_job(&job_id).map_err(|_| not_found(format!("job {id} not found")))?;

    let events = query.events_tail.map(|tail| {
        let tail = tail.min(1000) as usize;
        let mut events: Vec<_> =
            state.store.list_events().into_iter().filter(|e| e.job_id.as_ref() == Some(&job_id)).collect();
        events.sort_by_key(|e| e.timestamp);
        if events.len() > tail {
            events = events.split_off(events.len() - tail);
        }
        events
    });

    Ok(Json(JobWithEvents { job, events }))
}

pub async fn report_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<JobReportRequest>,
) -> Result<Json<Job>, AppError> {
    let job_id = JobId::from_string(&id);
    let job = state.store.get_job(&job_id).map_err(|_| not_found(format!("job {id} not found")))?;
    let vmid = job.sandbox_vmid.ok_or_else(|| AppError::from(fleetd_core::JobError::NotProvisioned(job_id.clone())))?;

    if let Some(expected) = state.jobs.bootstrap_token(vmid) {
        let presented = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match presented {
            Some(token) if expected.matches(token) => {}
            _ => return Err(AppError(fleetd_wire::ApiError::new(401, "missing or invalid bootstrap token"))),
        }
    }

    let report = JobReport {
        status: request.status,
        artifacts: request.artifacts,
        result: request.result,
        message: request.message,
    };
    let updated = state.jobs.handle_report(&job_id, report).await?;
    Ok(Json(updated))
}
