// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event projections (spec.md §4.4): sandbox health, job timeline, and a
//! recent-failure ring. [`Projection`] is a pure, idempotent, order-
//! independent reducer — replaying the same event set in any order
//! produces the same read models, which is what lets the Store serve
//! snapshots from multiple shards without a global event order.

use crate::job::{JobId, JobStatus};
use crate::sandbox::{SandboxState, Vmid};
use std::collections::{HashMap, VecDeque};

use super::Event;

/// Per-VMID health, keyed off `sandbox.state` transitions.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SandboxHealth {
    pub state: Option<SandboxState>,
    pub healthy: bool,
    pub failure_count: u64,
    pub last_failure_at: Option<u64>,
    pub last_failure_kind: Option<String>,
    pub last_failure_message: Option<String>,
    pub last_event_id: Option<String>,
    pub last_event_at: Option<u64>,
}

/// Per-job timeline, keyed off `job.running`/`job.slo.start`/`job.report`
/// and failure/timeout events.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct JobTimeline {
    pub status: Option<JobStatus>,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
    pub event_count: u64,
    pub failure_count: u64,
    pub last_failure_at: Option<u64>,
    pub last_failure_kind: Option<String>,
    pub last_failure_message: Option<String>,
}

/// One entry in the fixed-capacity recent-failure ring.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FailureRingEntry {
    pub event_id: String,
    pub timestamp: u64,
    pub kind: String,
    pub sandbox_vmid: Option<Vmid>,
    pub job_id: Option<JobId>,
    pub message: String,
}

const FAILURE_RING_CAPACITY: usize = 10;

/// The stateful reducer over a deduplicated, sorted event stream.
#[derive(Debug, Default)]
pub struct Projection {
    sandboxes: HashMap<Vmid, SandboxHealth>,
    jobs: HashMap<JobId, JobTimeline>,
    recent_failures: VecDeque<FailureRingEntry>,
    seen_event_ids: std::collections::HashSet<String>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a batch of events. Sorts by `(id, timestamp, kind, message)`
    /// first (spec.md §4.4) so the result is the same regardless of the
    /// order a multi-writer/multi-shard read handed events back in.
    pub fn replay<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) {
        let mut ordered: Vec<&'a Event> = events.into_iter().collect();
        ordered.sort_by(|a, b| {
            (a.id.as_str(), a.timestamp, a.kind.as_str(), a.message.as_str())
                .cmp(&(b.id.as_str(), b.timestamp, b.kind.as_str(), b.message.as_str()))
        });
        for event in ordered {
            self.apply_event(event);
        }
    }

    /// Apply one event. De-duplicates by event id, so replaying the same
    /// event twice (e.g. an overlapping snapshot window) is a no-op the
    /// second time.
    pub fn apply_event(&mut self, event: &Event) {
        if !self.seen_event_ids.insert(event.id.to_string()) {
            return;
        }

        if let Some(vmid) = event.sandbox_vmid {
            self.apply_sandbox(vmid, event);
        }
        if let Some(job_id) = &event.job_id {
            self.apply_job(job_id.clone(), event);
        }
        if event.kind.matches_recent_failure() {
            self.push_failure(event);
        }
    }

    fn apply_sandbox(&mut self, vmid: Vmid, event: &Event) {
        let health = self.sandboxes.entry(vmid).or_default();
        health.last_event_id = Some(event.id.to_string());
        health.last_event_at = Some(event.timestamp);

        if event.kind.as_str() == "sandbox.state" {
            if let Some(to_state) = event
                .payload
                .get("to_state")
                .and_then(|v| v.as_str())
                .and_then(|s| parse_sandbox_state(s))
            {
                health.state = Some(to_state);
                health.healthy = to_state.healthy();
            }
        }

        if event.kind.matches_recent_failure() {
            health.failure_count += 1;
            health.last_failure_at = Some(event.timestamp);
            health.last_failure_kind = Some(event.kind.to_string());
            health.last_failure_message = Some(event.message.clone());
            health.healthy = false;
        }
    }

    fn apply_job(&mut self, job_id: JobId, event: &Event) {
        let timeline = self.jobs.entry(job_id).or_default();
        timeline.event_count += 1;

        match event.kind.as_str() {
            "job.running" | "job.slo.start" => {
                timeline.status = Some(JobStatus::Running);
                if timeline.started_at.is_none_or(|existing| event.timestamp < existing) {
                    timeline.started_at = Some(event.timestamp);
                }
            }
            "job.report" => {
                if let Some(status) = event.payload.get("status").and_then(|v| v.as_str()) {
                    match status.to_ascii_lowercase().as_str() {
                        "running" => {
                            timeline.status = Some(JobStatus::Running);
                            if timeline.started_at.is_none_or(|existing| event.timestamp < existing) {
                                timeline.started_at = Some(event.timestamp);
                            }
                        }
                        "completed" | "failed" | "timeout" => {
                            let parsed = match status.to_ascii_lowercase().as_str() {
                                "completed" => JobStatus::Completed,
                                "failed" => JobStatus::Failed,
                                _ => JobStatus::Timeout,
                            };
                            timeline.status = Some(parsed);
                            if timeline.completed_at.is_none_or(|existing| event.timestamp < existing) {
                                timeline.completed_at = Some(event.timestamp);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }

        if event.kind.matches_recent_failure() {
            timeline.failure_count += 1;
            timeline.last_failure_at = Some(event.timestamp);
            timeline.last_failure_kind = Some(event.kind.to_string());
            timeline.last_failure_message = Some(event.message.clone());
            if timeline.completed_at.is_none() {
                timeline.completed_at = Some(event.timestamp);
            }
            timeline.status = Some(if event.kind.as_str().contains("timeout") {
                JobStatus::Timeout
            } else {
                JobStatus::Failed
            });
        }
    }

    fn push_failure(&mut self, event: &Event) {
        if self.recent_failures.len() == FAILURE_RING_CAPACITY {
            self.recent_failures.pop_front();
        }
        self.recent_failures.push_back(FailureRingEntry {
            event_id: event.id.to_string(),
            timestamp: event.timestamp,
            kind: event.kind.to_string(),
            sandbox_vmid: event.sandbox_vmid,
            job_id: event.job_id.clone(),
            message: event.message.clone(),
        });
    }

    pub fn sandbox_health(&self, vmid: Vmid) -> Option<&SandboxHealth> {
        self.sandboxes.get(&vmid)
    }

    pub fn job_timeline(&self, job_id: &JobId) -> Option<&JobTimeline> {
        self.jobs.get(job_id)
    }

    pub fn recent_failures(&self) -> impl Iterator<Item = &FailureRingEntry> {
        self.recent_failures.iter()
    }
}

fn parse_sandbox_state(s: &str) -> Option<SandboxState> {
    use SandboxState::*;
    Some(match s {
        "requested" => Requested,
        "provisioning" => Provisioning,
        "booting" => Booting,
        "ready" => Ready,
        "running" => Running,
        "suspended" => Suspended,
        "completed" => Completed,
        "failed" => Failed,
        "timeout" => Timeout,
        "stopped" => Stopped,
        "destroyed" => Destroyed,
        _ => return None,
    })
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod tests;
