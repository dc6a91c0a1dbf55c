// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lightweight in-process metrics registry shared across the daemon.
//!
//! Nothing here talks to a metrics backend: the engine and daemon crates
//! increment counters and record durations through this registry, and the
//! status endpoint (spec.md §6 `GET /v1/status`) reads a snapshot of it.
//! Exporting to Prometheus or similar is a collaborator's job, not ours.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A named counter, incremented by the engine as events occur.
#[derive(Debug, Default)]
struct Counter(AtomicU64);

impl Counter {
    fn incr(&self, by: u64) {
        self.0.fetch_add(by, Ordering::Relaxed);
    }

    fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A running count + sum, used to report an average duration without
/// keeping a full histogram.
#[derive(Debug, Default)]
struct DurationStat {
    count: AtomicU64,
    total_ms: AtomicU64,
}

impl DurationStat {
    fn record(&self, ms: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_ms.fetch_add(ms, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DurationSnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let total_ms = self.total_ms.load(Ordering::Relaxed);
        DurationSnapshot {
            count,
            avg_ms: if count == 0 { 0 } else { total_ms / count },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DurationSnapshot {
    pub count: u64,
    pub avg_ms: u64,
}

/// Shared, cheaply-cloned handle to the daemon's metrics counters.
///
/// Fields correspond to the counters and timers named in spec.md §4.4's
/// event catalog stages — `record_event` is the usual way to feed it, but
/// callers that already have the duration in hand can call the specific
/// `record_*` method directly.
#[derive(Debug, Default, Clone)]
pub struct MetricsRegistry(Arc<Inner>);

#[derive(Debug, Default)]
struct Inner {
    workspace_lease_contention: Counter,
    workspace_lease_acquired: Counter,
    sandbox_provision: DurationStat,
    job_pipeline: DurationStat,
    job_failed: Counter,
    job_timeout: Counter,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_lease_contention(&self) {
        self.0.workspace_lease_contention.incr(1);
    }

    pub fn record_lease_acquired(&self) {
        self.0.workspace_lease_acquired.incr(1);
    }

    pub fn record_sandbox_provision_ms(&self, ms: u64) {
        self.0.sandbox_provision.record(ms);
    }

    pub fn record_job_pipeline_ms(&self, ms: u64) {
        self.0.job_pipeline.record(ms);
    }

    pub fn record_job_failed(&self) {
        self.0.job_failed.incr(1);
    }

    pub fn record_job_timeout(&self) {
        self.0.job_timeout.incr(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            workspace_lease_contention: self.0.workspace_lease_contention.get(),
            workspace_lease_acquired: self.0.workspace_lease_acquired.get(),
            sandbox_provision_duration_ms: self.0.sandbox_provision.snapshot(),
            job_pipeline_duration_ms: self.0.job_pipeline.snapshot(),
            job_failed_total: self.0.job_failed.get(),
            job_timeout_total: self.0.job_timeout.get(),
        }
    }
}

/// Point-in-time view of [`MetricsRegistry`], serialized for `GET /v1/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub workspace_lease_contention: u64,
    pub workspace_lease_acquired: u64,
    pub sandbox_provision_duration_ms: DurationSnapshot,
    pub job_pipeline_duration_ms: DurationSnapshot,
    pub job_failed_total: u64,
    pub job_timeout_total: u64,
}

/// Health information the daemon exposes for collaborator background
/// tasks (lease GC, idle-stop scanner) to report their last-run outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskHealth {
    pub last_run_ms: u64,
    pub last_error: Option<String>,
    pub items_processed: usize,
}

/// Tracks the most recent [`TaskHealth`] per named background task.
#[derive(Debug, Default)]
pub struct TaskHealthRegistry(parking_lot::Mutex<HashMap<String, TaskHealth>>);

impl TaskHealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, task: impl Into<String>, health: TaskHealth) {
        self.0.lock().insert(task.into(), health);
    }

    pub fn snapshot(&self) -> HashMap<String, TaskHealth> {
        self.0.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_stat_averages() {
        let registry = MetricsRegistry::new();
        registry.record_sandbox_provision_ms(100);
        registry.record_sandbox_provision_ms(300);
        let snap = registry.snapshot();
        assert_eq!(snap.sandbox_provision_duration_ms.count, 2);
        assert_eq!(snap.sandbox_provision_duration_ms.avg_ms, 200);
    }

    #[test]
    fn counters_are_independent() {
        let registry = MetricsRegistry::new();
        registry.record_lease_contention();
        registry.record_lease_contention();
        registry.record_lease_acquired();
        let snap = registry.snapshot();
        assert_eq!(snap.workspace_lease_contention, 2);
        assert_eq!(snap.workspace_lease_acquired, 1);
    }

    #[test]
    fn task_health_registry_tracks_latest_per_task() {
        let registry = TaskHealthRegistry::new();
        registry.report("lease_gc", TaskHealth { last_run_ms: 10, last_error: None, items_processed: 3 });
        registry.report(
            "lease_gc",
            TaskHealth { last_run_ms: 20, last_error: Some("boom".into()), items_processed: 0 },
        );
        let snap = registry.snapshot();
        let health = snap.get("lease_gc").expect("task recorded");
        assert_eq!(health.last_run_ms, 20);
        assert_eq!(health.last_error.as_deref(), Some("boom"));
    }
}
