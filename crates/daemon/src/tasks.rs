// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background scanners (spec.md §4.1, §9 "Background tasks ... are
//! spawned per-daemon with explicit shutdown channels; avoid hidden
//! singletons"): lease GC, idle-stop, and orphan pruning, each reporting
//! its health into the shared [`fleetd_core::TaskHealthRegistry`].

use std::time::Duration;

use fleetd_core::{Clock, SystemClock, TaskHealth};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::state::AppState;

/// Spawns the three periodic scanners. Each stops as soon as `shutdown`
/// is cancelled, per spec.md §9's "explicit shutdown channels" note.
pub fn spawn_background_tasks(state: AppState, interval: Duration, shutdown: CancellationToken) {
    spawn_loop(state.clone(), interval, shutdown.clone(), "lease_gc", |state| async move {
        state.sandboxes.lease_gc_scan().await
    });
    spawn_loop(state.clone(), interval, shutdown.clone(), "idle_stop", |state| async move {
        let profiles: Vec<_> = state.profiles.values().cloned().collect();
        state.sandboxes.idle_stop_scan(&profiles).await
    });
    spawn_loop(state, interval, shutdown, "prune_orphans", |state| async move { state.sandboxes.prune_orphans().await });
}

fn spawn_loop<F, Fut>(state: AppState, interval: Duration, shutdown: CancellationToken, name: &'static str, run: F)
where
    F: Fn(AppState) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = usize> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(task = name, "background task stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let items_processed = run(state.clone()).await;
                    if items_processed > 0 {
                        info!(task = name, items_processed, "background scan completed");
                    }
                    state.tasks.report(
                        name,
                        TaskHealth { last_run_ms: state.workspaces_clock_now_ms(), last_error: None, items_processed },
                    );
                }
            }
        }
    });
}

impl AppState {
    fn workspaces_clock_now_ms(&self) -> u64 {
        SystemClock.epoch_ms()
    }
}
