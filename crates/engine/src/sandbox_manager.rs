// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox Manager (spec.md §4.1): the FSM over [`SandboxState`], its
//! start/stop/destroy/revert operations, lease GC, idle-stop, and
//! snapshot gating.
//!
//! Holds no long locks: every state mutation is a single `Store`
//! transaction (`update_sandbox_state_if`); concurrent callers racing the
//! same vmid serialize at that row and the loser sees `InvalidTransition`
//! (spec.md §5).

use std::sync::Arc;

use fleetd_adapters::{BackendError, HypervisorBackend, SnippetError, SnippetStore};
use fleetd_core::{Clock, Profile, Sandbox, SandboxError, SandboxState, Vmid};
use fleetd_storage::Store;
use serde_json::json;

/// Outcome of [`SandboxManager::revert`] (spec.md §4.1 `Revert`).
#[derive(Debug, Clone)]
pub struct RevertOutcome {
    pub sandbox: Sandbox,
    pub snapshot: String,
    pub was_running: bool,
    pub restarted: bool,
}

pub struct SandboxManager<C: Clock> {
    store: Arc<dyn Store>,
    backend: Arc<dyn HypervisorBackend>,
    snippets: Arc<dyn SnippetStore>,
    clock: C,
}

impl<C: Clock> SandboxManager<C> {
    pub fn new(store: Arc<dyn Store>, backend: Arc<dyn HypervisorBackend>, snippets: Arc<dyn SnippetStore>, clock: C) -> Self {
        Self { store, backend, snippets, clock }
    }

    fn load(&self, vmid: Vmid) -> Result<Sandbox, SandboxError> {
        self.store.get_sandbox(vmid).map_err(|_| SandboxError::NotFound(vmid))
    }

    fn map_store_err(vmid: Vmid, err: fleetd_storage::StoreError) -> SandboxError {
        match err {
            fleetd_storage::StoreError::NotFound { .. } => SandboxError::NotFound(vmid),
            other => SandboxError::Store(other.to_string()),
        }
    }

    fn record_state_event(&self, vmid: Vmid, from: SandboxState, to: SandboxState, job_id: Option<fleetd_core::JobId>, duration_ms: u64, now: u64) {
        crate::events::emit(
            self.store.as_ref(),
            "sandbox.state",
            json!({"vmid": vmid.get(), "from_state": from.to_string(), "to_state": to.to_string(), "duration_ms": duration_ms}),
            Some(vmid),
            job_id,
            format!("{from} -> {to}"),
            now,
        );
    }

    /// `Transition(vmid, to)` (spec.md §4.1).
    pub fn transition(&self, vmid: Vmid, to: SandboxState) -> Result<Sandbox, SandboxError> {
        let sandbox = self.load(vmid)?;
        if !sandbox.state.can_transition_to(to) {
            return Err(SandboxError::InvalidTransition { vmid, from: sandbox.state, to });
        }
        let now = self.clock.epoch_ms();
        let updated = self
            .store
            .update_sandbox_state_if(vmid, sandbox.state, to, now)
            .map_err(|e| Self::map_store_err(vmid, e))?;
        self.record_state_event(vmid, sandbox.state, to, updated.job_id, now.saturating_sub(sandbox.last_updated_at), now);
        Ok(updated)
    }

    /// `Start(vmid)`: requires STOPPED; calls `Backend.Start`; transitions
    /// to RUNNING on success.
    pub async fn start(&self, vmid: Vmid) -> Result<Sandbox, SandboxError> {
        let sandbox = self.load(vmid)?;
        if sandbox.state != SandboxState::Stopped {
            return Err(SandboxError::InvalidTransition { vmid, from: sandbox.state, to: SandboxState::Running });
        }
        let started_at = self.clock.now();
        match self.backend.start(vmid).await {
            Ok(()) => {
                let now = self.clock.epoch_ms();
                let updated = self
                    .store
                    .update_sandbox_state_if(vmid, SandboxState::Stopped, SandboxState::Running, now)
                    .map_err(|e| Self::map_store_err(vmid, e))?;
                let duration_ms = started_at.elapsed().as_millis() as u64;
                crate::events::emit(
                    self.store.as_ref(),
                    "sandbox.start.completed",
                    json!({"vmid": vmid.get(), "duration_ms": duration_ms}),
                    Some(vmid),
                    updated.job_id,
                    "sandbox started",
                    now,
                );
                Ok(updated)
            }
            Err(err) => {
                let now = self.clock.epoch_ms();
                crate::events::emit(
                    self.store.as_ref(),
                    "sandbox.start.failed",
                    json!({"vmid": vmid.get(), "message": err.to_string()}),
                    Some(vmid),
                    sandbox.job_id,
                    "sandbox start failed",
                    now,
                );
                Err(SandboxError::Backend(err.to_string()))
            }
        }
    }

    /// `Stop(vmid)`: requires READY or RUNNING; calls `Backend.Stop`;
    /// transitions to STOPPED.
    pub async fn stop(&self, vmid: Vmid) -> Result<Sandbox, SandboxError> {
        let sandbox = self.load(vmid)?;
        if !matches!(sandbox.state, SandboxState::Ready | SandboxState::Running) {
            return Err(SandboxError::InvalidTransition { vmid, from: sandbox.state, to: SandboxState::Stopped });
        }
        self.backend.stop(vmid).await.map_err(|e| SandboxError::Backend(e.to_string()))?;
        let now = self.clock.epoch_ms();
        let updated = self
            .store
            .update_sandbox_state_if(vmid, sandbox.state, SandboxState::Stopped, now)
            .map_err(|e| Self::map_store_err(vmid, e))?;
        self.record_state_event(vmid, sandbox.state, SandboxState::Stopped, updated.job_id, now.saturating_sub(sandbox.last_updated_at), now);
        Ok(updated)
    }

    /// `Destroy(vmid, force)` (spec.md §4.1): gated unless `force`.
    /// Idempotent against an already-destroyed row.
    pub async fn destroy(&self, vmid: Vmid, force: bool) -> Result<Sandbox, SandboxError> {
        let sandbox = self.load(vmid)?;
        if sandbox.state == SandboxState::Destroyed {
            return Ok(sandbox);
        }
        if !force && !sandbox.state.destroy_compatible() {
            return Err(SandboxError::DestroyGated { vmid, state: sandbox.state });
        }
        if let Err(err) = self.backend.destroy(vmid).await {
            if !matches!(err, BackendError::NotFound(_)) {
                return Err(SandboxError::Backend(err.to_string()));
            }
        }
        if let Err(err) = self.snippets.remove(vmid).await {
            if !matches!(err, SnippetError::NotFound(_)) {
                tracing::warn!(vmid = vmid.get(), %err, "failed to remove cloud-init snippet");
            }
        }
        for exposure in self.store.list_exposures().into_iter().filter(|e| e.vmid == vmid) {
            let _ = self.store.delete_exposure(&exposure.id);
        }
        let now = self.clock.epoch_ms();
        let updated = self
            .store
            .update_sandbox_state_if(vmid, sandbox.state, SandboxState::Destroyed, now)
            .map_err(|e| Self::map_store_err(vmid, e))?;
        crate::events::emit(
            self.store.as_ref(),
            "sandbox.destroyed",
            json!({"vmid": vmid.get(), "forced": force}),
            Some(vmid),
            updated.job_id,
            "sandbox destroyed",
            now,
        );
        Ok(updated)
    }

    pub async fn force_destroy(&self, vmid: Vmid) -> Result<Sandbox, SandboxError> {
        self.destroy(vmid, true).await
    }

    /// `Revert(vmid, {Force, Restart})` (spec.md §4.1).
    pub async fn revert(&self, vmid: Vmid, force: bool, restart: bool) -> Result<RevertOutcome, SandboxError> {
        let sandbox = self.load(vmid)?;
        if let Some(job_id) = sandbox.job_id.clone() {
            if sandbox.state == SandboxState::Running && !force {
                return Err(SandboxError::SandboxInUse { vmid, job_id });
            }
        }

        let now = self.clock.epoch_ms();
        crate::events::emit(
            self.store.as_ref(),
            "sandbox.revert.started",
            json!({"vmid": vmid.get(), "force": force}),
            Some(vmid),
            sandbox.job_id.clone(),
            "sandbox revert started",
            now,
        );

        const CLEAN_SNAPSHOT: &str = "clean";
        if let Err(err) = self.backend.snapshot_restore(vmid, CLEAN_SNAPSHOT).await {
            let now = self.clock.epoch_ms();
            crate::events::emit(
                self.store.as_ref(),
                "sandbox.revert.failed",
                json!({"vmid": vmid.get(), "message": err.to_string()}),
                Some(vmid),
                sandbox.job_id.clone(),
                "sandbox revert failed",
                now,
            );
            return Err(SandboxError::Backend(err.to_string()));
        }

        let was_running = sandbox.state == SandboxState::Running;
        let status = self.backend.status(vmid).await.map_err(|e| SandboxError::Backend(e.to_string()))?;
        let mut current = sandbox.clone();
        if status != fleetd_adapters::GuestStatus::Running {
            let now = self.clock.epoch_ms();
            current = self
                .store
                .update_sandbox(vmid, now, &mut |s| s.ip = String::new())
                .map_err(|e| Self::map_store_err(vmid, e))?;
            if current.state != SandboxState::Stopped && current.state.can_transition_to(SandboxState::Stopped) {
                current = self
                    .store
                    .update_sandbox_state_if(vmid, current.state, SandboxState::Stopped, now)
                    .map_err(|e| Self::map_store_err(vmid, e))?;
            }
        }

        let mut restarted = false;
        if restart && was_running && current.state == SandboxState::Stopped {
            current = self.start(vmid).await?;
            restarted = true;
        }

        let now = self.clock.epoch_ms();
        crate::events::emit(
            self.store.as_ref(),
            "sandbox.revert.completed",
            json!({"vmid": vmid.get(), "was_running": was_running, "restarted": restarted}),
            Some(vmid),
            current.job_id.clone(),
            "sandbox revert completed",
            now,
        );

        Ok(RevertOutcome { sandbox: current, snapshot: CLEAN_SNAPSHOT.to_string(), was_running, restarted })
    }

    /// `RenewLease(vmid, ttl)` (spec.md §4.1): a sandbox's own keepalive
    /// lease, distinct from the workspace lease protocol.
    pub fn renew_lease(&self, vmid: Vmid, ttl_ms: u64) -> Result<Sandbox, SandboxError> {
        let sandbox = self.load(vmid)?;
        if !matches!(sandbox.state, SandboxState::Ready | SandboxState::Running) {
            return Err(SandboxError::LeaseNotRenewable { vmid, state: sandbox.state });
        }
        let now = self.clock.epoch_ms();
        let lease_expires = now + ttl_ms;
        let updated = self
            .store
            .update_sandbox(vmid, now, &mut |s| s.lease_expires = lease_expires)
            .map_err(|e| Self::map_store_err(vmid, e))?;
        crate::events::emit(
            self.store.as_ref(),
            "sandbox.lease",
            json!({"vmid": vmid.get(), "lease_expires": lease_expires}),
            Some(vmid),
            updated.job_id.clone(),
            "sandbox lease renewed",
            now,
        );
        Ok(updated)
    }

    /// `PruneOrphans()` (spec.md §4.1): any sandbox the backend no longer
    /// knows about (and which isn't still mid-provisioning) is forced to
    /// DESTROYED. Returns the number of rows pruned.
    pub async fn prune_orphans(&self) -> usize {
        let mut pruned = 0;
        for sandbox in self.store.list_sandboxes() {
            if matches!(sandbox.state, SandboxState::Requested | SandboxState::Provisioning | SandboxState::Destroyed) {
                continue;
            }
            if matches!(self.backend.status(sandbox.vmid).await, Err(BackendError::NotFound(_))) {
                let now = self.clock.epoch_ms();
                if self.store.update_sandbox_state_if(sandbox.vmid, sandbox.state, SandboxState::Destroyed, now).is_ok() {
                    crate::events::emit(
                        self.store.as_ref(),
                        "sandbox.destroyed",
                        json!({"vmid": sandbox.vmid.get(), "forced": true}),
                        Some(sandbox.vmid),
                        sandbox.job_id.clone(),
                        "orphan sandbox pruned",
                        now,
                    );
                    pruned += 1;
                }
            }
        }
        pruned
    }

    fn check_snapshot_allowed(&self, sandbox: &Sandbox, force: bool) -> Result<(), SandboxError> {
        if sandbox.state.snapshot_forbidden() {
            return Err(SandboxError::InvalidTransition { vmid: sandbox.vmid, from: sandbox.state, to: sandbox.state });
        }
        if !force {
            if sandbox.state != SandboxState::Stopped {
                return Err(SandboxError::SnapshotActive { vmid: sandbox.vmid });
            }
            if sandbox.workspace_id.is_some() {
                return Err(SandboxError::SnapshotWorkspaceAttached { vmid: sandbox.vmid });
            }
        }
        Ok(())
    }

    pub async fn snapshot_create(&self, vmid: Vmid, name: &str, force: bool) -> Result<(), SandboxError> {
        let sandbox = self.load(vmid)?;
        self.check_snapshot_allowed(&sandbox, force)?;
        self.backend.snapshot_create(vmid, name).await.map_err(|e| SandboxError::Backend(e.to_string()))
    }

    pub async fn snapshot_restore(&self, vmid: Vmid, name: &str, force: bool) -> Result<(), SandboxError> {
        let sandbox = self.load(vmid)?;
        self.check_snapshot_allowed(&sandbox, force)?;
        self.backend.snapshot_restore(vmid, name).await.map_err(|e| match e {
            BackendError::SnapshotNotFound { vmid, name } => SandboxError::SnapshotMissing { vmid, name },
            other => SandboxError::Backend(other.to_string()),
        })
    }

    /// Excludes the `current` pseudo-snapshot; sorted case-insensitively
    /// (spec.md §4.1).
    pub async fn snapshot_list(&self, vmid: Vmid) -> Result<Vec<fleetd_adapters::SnapshotInfo>, SandboxError> {
        let sandbox = self.load(vmid)?;
        self.check_snapshot_allowed(&sandbox, true)?;
        let mut snapshots = self.backend.snapshot_list(vmid).await.map_err(|e| SandboxError::Backend(e.to_string()))?;
        snapshots.retain(|s| s.name != "current");
        snapshots.sort_by_key(|s| s.name.to_lowercase());
        Ok(snapshots)
    }

    /// Lease GC (spec.md §4.1): sandboxes whose own keepalive lease has
    /// expired and which aren't `keepalive` are stopped. Returns the
    /// count affected.
    pub async fn lease_gc_scan(&self) -> usize {
        let now = self.clock.epoch_ms();
        let mut affected = 0;
        for sandbox in self.store.list_sandboxes() {
            if sandbox.keepalive || !sandbox.lease_expired(now) {
                continue;
            }
            if !matches!(sandbox.state, SandboxState::Ready | SandboxState::Running | SandboxState::Suspended) {
                continue;
            }
            if sandbox.state == SandboxState::Suspended {
                continue;
            }
            if self.stop(sandbox.vmid).await.is_ok() {
                affected += 1;
            }
        }
        affected
    }

    /// Idle-stop scanner (spec.md §4.1): RUNNING sandboxes whose profile
    /// sets `idle_stop_minutes` and which have been idle longer than that
    /// threshold are stopped, emitting `sandbox.idle_stop`.
    pub async fn idle_stop_scan(&self, profiles: &[Profile]) -> usize {
        let now = self.clock.epoch_ms();
        let mut affected = 0;
        for sandbox in self.store.list_sandboxes() {
            if sandbox.state != SandboxState::Running {
                continue;
            }
            let Some(profile) = profiles.iter().find(|p| p.name == sandbox.profile) else { continue };
            if profile.idle_stop_minutes == 0 {
                continue;
            }
            let idle_ms = now.saturating_sub(sandbox.last_used_at);
            let threshold_ms = u64::from(profile.idle_stop_minutes) * 60_000;
            if idle_ms < threshold_ms {
                continue;
            }
            if self.stop(sandbox.vmid).await.is_ok() {
                let now = self.clock.epoch_ms();
                crate::events::emit(
                    self.store.as_ref(),
                    "sandbox.idle_stop",
                    json!({"vmid": sandbox.vmid.get(), "idle_minutes": idle_ms / 60_000}),
                    Some(sandbox.vmid),
                    sandbox.job_id.clone(),
                    "sandbox stopped by idle-stop scanner",
                    now,
                );
                affected += 1;
            }
        }
        affected
    }
}

#[cfg(test)]
#[path = "sandbox_manager_tests.rs"]
mod tests;
