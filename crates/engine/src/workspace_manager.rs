// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace Manager & lease protocol (spec.md §4.2): volume CRUD, attach/
//! detach, fork, check, snapshot ops, fsck, and the CAS lease primitives
//! layered with `AcquireWithWait`'s cancelable backoff loop.
//!
//! Fork/snapshot/fsck all acquire an internal lease scoped by a process-
//! wide nanosecond counter (`OwnerId::Snapshot/Fork/Fsck`) and release it
//! on every exit path, mirroring [`crate::sandbox_manager`]'s single-
//! Store-transaction-per-mutation discipline.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fleetd_adapters::{BackendError, FsckError, FsckOutcome, FsckRunner, HypervisorBackend, SnapshotInfo};
use fleetd_core::{Clock, LeaseConflict, LeaseError, Nonce, OwnerId, Vmid, Workspace, WorkspaceError, WorkspaceId};
use fleetd_storage::{Store, StoreError};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Outcome of a successful lease acquisition (spec.md §4.2
/// `AcquireWithWait`).
#[derive(Debug, Clone)]
pub struct AcquireOutcome {
    pub workspace: Workspace,
    pub owner: OwnerId,
    pub nonce: Nonce,
}

pub struct WorkspaceManager<C: Clock> {
    store: Arc<dyn Store>,
    backend: Arc<dyn HypervisorBackend>,
    fsck: Arc<dyn FsckRunner>,
    clock: C,
}

static INTERNAL_NANOS_COUNTER: AtomicU64 = AtomicU64::new(0);

impl<C: Clock> WorkspaceManager<C> {
    pub fn new(store: Arc<dyn Store>, backend: Arc<dyn HypervisorBackend>, fsck: Arc<dyn FsckRunner>, clock: C) -> Self {
        Self { store, backend, fsck, clock }
    }

    /// A process-wide unique nanosecond value for internal-operation
    /// owner strings (spec.md §4.2 `snapshot:<id>:<nanos>` etc). `Clock`
    /// only carries millisecond resolution, so the low bits come from a
    /// monotonic counter rather than a wall-clock nanosecond read.
    fn internal_nanos(&self) -> u128 {
        let counter = u128::from(INTERNAL_NANOS_COUNTER.fetch_add(1, Ordering::Relaxed));
        u128::from(self.clock.epoch_ms()) * 1_000_000 + counter
    }

    fn map_not_found(id: &WorkspaceId, err: StoreError) -> WorkspaceError {
        match err {
            StoreError::NotFound { .. } => WorkspaceError::NotFound(id.clone()),
            StoreError::LeaseHeld(conflict) => WorkspaceError::Lease(LeaseError::Held(conflict)),
            StoreError::LeaseMismatch => WorkspaceError::Lease(LeaseError::Held(LeaseConflict {
                workspace_id: id.clone(),
                workspace_name: String::new(),
                attached_vmid: None,
                lease_owner: None,
                lease_expires_at: None,
                workspace_wait_seconds: None,
            })),
            other => WorkspaceError::Store(other.to_string()),
        }
    }

    /// `Create(name, storage, size_gb)` (spec.md §4.2). Rolls the backend
    /// volume back if the row insert loses a name race.
    pub async fn create(&self, name: &str, storage: &str, size_gb: u32) -> Result<Workspace, WorkspaceError> {
        let volume = self
            .backend
            .volume_create(storage, size_gb)
            .await
            .map_err(|e| WorkspaceError::Backend(e.to_string()))?;
        let now = self.clock.epoch_ms();
        let workspace = Workspace::new(WorkspaceId::new(), name, storage, volume.volume_id.clone(), size_gb, now);
        if let Err(err) = self.store.put_workspace(workspace.clone()) {
            if let Err(rollback_err) = self.backend.volume_delete(&volume.volume_id).await {
                tracing::warn!(volume_id = %volume.volume_id, %rollback_err, "failed to roll back orphaned volume");
            }
            return Err(match err {
                StoreError::AlreadyExists { name, .. } => WorkspaceError::AlreadyExists(name),
                other => WorkspaceError::Store(other.to_string()),
            });
        }
        Ok(workspace)
    }

    pub fn list(&self) -> Vec<Workspace> {
        self.store.list_workspaces()
    }

    /// `Resolve(id_or_name)`: tries the workspace id namespace first, then
    /// falls back to a name lookup.
    pub fn resolve(&self, id_or_name: &str) -> Result<Workspace, WorkspaceError> {
        if id_or_name.starts_with(WorkspaceId::PREFIX) {
            let id = WorkspaceId::from_string(id_or_name);
            return self.store.get_workspace(&id).map_err(|e| Self::map_not_found(&id, e));
        }
        self.store.get_workspace_by_name(id_or_name).map_err(|e| match e {
            StoreError::NotFound { .. } => WorkspaceError::NotFound(WorkspaceId::from_string(id_or_name)),
            other => WorkspaceError::Store(other.to_string()),
        })
    }

    /// `Attach(id, vmid)` (spec.md §4.2): attaches the backing volume on
    /// the backend before flipping the Store row, so a backend failure
    /// never leaves `attached_vm` set against an unattached volume.
    pub async fn attach(&self, id: &WorkspaceId, vmid: Vmid) -> Result<Workspace, WorkspaceError> {
        let workspace = self.store.get_workspace(id).map_err(|e| Self::map_not_found(id, e))?;
        if workspace.is_attached() {
            return Err(WorkspaceError::Attached(id.clone()));
        }
        self.store.get_sandbox(vmid).map_err(|_| WorkspaceError::SandboxNotFound(vmid))?;
        if let Some(other) = self.store.list_workspaces().into_iter().find(|w| w.attached_vm == Some(vmid) && w.id != *id) {
            return Err(WorkspaceError::VmInUse { vmid, other: other.id });
        }
        self.backend.volume_attach(&workspace.volume_id, vmid).await.map_err(|e| WorkspaceError::Backend(e.to_string()))?;
        let now = self.clock.epoch_ms();
        let updated = self.store.attach_workspace(id, vmid, now).map_err(|e| match e {
            StoreError::InvalidTransition { .. } => WorkspaceError::Attached(id.clone()),
            other => Self::map_not_found(id, other),
        })?;
        crate::events::emit(
            self.store.as_ref(),
            "workspace.attached",
            json!({"workspace_id": id.to_string(), "vmid": vmid.get()}),
            Some(vmid),
            None,
            "workspace attached",
            now,
        );
        Ok(updated)
    }

    /// `Detach(id)` (spec.md §4.2): detaches on the backend first; the
    /// Store row only flips once the backend confirms.
    pub async fn detach(&self, id: &WorkspaceId) -> Result<Workspace, WorkspaceError> {
        let workspace = self.store.get_workspace(id).map_err(|e| Self::map_not_found(id, e))?;
        let vmid = workspace.attached_vm.ok_or_else(|| WorkspaceError::NotAttached(id.clone()))?;
        self.backend.volume_detach(&workspace.volume_id, vmid).await.map_err(|e| WorkspaceError::Backend(e.to_string()))?;
        let now = self.clock.epoch_ms();
        let updated = self.store.detach_workspace(id, vmid, now).map_err(|e| match e {
            StoreError::InvalidTransition { .. } => WorkspaceError::NotAttached(id.clone()),
            other => Self::map_not_found(id, other),
        })?;
        crate::events::emit(
            self.store.as_ref(),
            "workspace.detached",
            json!({"workspace_id": id.to_string(), "vmid": vmid.get()}),
            Some(vmid),
            None,
            "workspace detached",
            now,
        );
        Ok(updated)
    }

    /// `Check(id)` (spec.md §4.2): confirms the backing volume still
    /// exists per the hypervisor backend.
    pub async fn check(&self, id: &WorkspaceId) -> Result<Workspace, WorkspaceError> {
        let workspace = self.store.get_workspace(id).map_err(|e| Self::map_not_found(id, e))?;
        self.backend
            .volume_info(&workspace.volume_id)
            .await
            .map_err(|e| WorkspaceError::Backend(e.to_string()))?;
        Ok(workspace)
    }

    /// `TryAcquire(workspace_id, owner, nonce, expires_at)` (spec.md
    /// §4.2), issuing a fresh nonce per call.
    pub fn try_acquire(&self, id: &WorkspaceId, owner: OwnerId, ttl: Duration) -> Result<AcquireOutcome, WorkspaceError> {
        let nonce = Nonce::generate();
        let now = self.clock.epoch_ms();
        let ttl_ms = ttl.as_millis() as u64;
        match self.store.try_acquire_lease(id, &owner, &nonce, ttl_ms, now) {
            Ok(workspace) => {
                crate::events::emit(
                    self.store.as_ref(),
                    "workspace.lease.acquired",
                    json!({"workspace_id": id.to_string(), "owner": owner.to_string(), "ttl_seconds": ttl.as_secs()}),
                    workspace.attached_vm,
                    owner.as_job().cloned(),
                    "workspace lease acquired",
                    now,
                );
                Ok(AcquireOutcome { workspace, owner, nonce })
            }
            Err(StoreError::LeaseHeld(conflict)) => {
                crate::events::emit(
                    self.store.as_ref(),
                    "workspace.lease.denied",
                    json!({"workspace_id": id.to_string(), "owner": owner.to_string(), "held_by": conflict.lease_owner}),
                    conflict.attached_vmid,
                    owner.as_job().cloned(),
                    "workspace lease denied",
                    now,
                );
                Err(WorkspaceError::Lease(LeaseError::Held(conflict)))
            }
            Err(other) => Err(Self::map_not_found(id, other)),
        }
    }

    /// `Renew(workspace_id, owner, nonce, new_expires_at)` (spec.md §4.2).
    pub fn renew(&self, id: &WorkspaceId, owner: &OwnerId, nonce: &Nonce, ttl: Duration) -> Result<Workspace, WorkspaceError> {
        let now = self.clock.epoch_ms();
        let ttl_ms = ttl.as_millis() as u64;
        let workspace = self.store.renew_lease(id, owner, nonce, ttl_ms, now).map_err(|e| Self::map_not_found(id, e))?;
        crate::events::emit(
            self.store.as_ref(),
            "workspace.lease.renewed",
            json!({"workspace_id": id.to_string(), "owner": owner.to_string(), "ttl_seconds": ttl.as_secs()}),
            workspace.attached_vm,
            owner.as_job().cloned(),
            "workspace lease renewed",
            now,
        );
        Ok(workspace)
    }

    /// `Release(workspace_id, owner, nonce)`: idempotent (spec.md §4.2).
    pub fn release(&self, id: &WorkspaceId, owner: &OwnerId, nonce: &Nonce) -> Result<Workspace, WorkspaceError> {
        let now = self.clock.epoch_ms();
        let workspace = self.store.release_lease(id, owner, nonce).map_err(|e| Self::map_not_found(id, e))?;
        crate::events::emit(
            self.store.as_ref(),
            "workspace.lease.released",
            json!({"workspace_id": id.to_string(), "owner": owner.to_string()}),
            workspace.attached_vm,
            owner.as_job().cloned(),
            "workspace lease released",
            now,
        );
        Ok(workspace)
    }

    /// `AcquireWithWait(workspace, owner, ttl, wait_seconds)` (spec.md
    /// §4.2): exponential backoff from 250ms, doubling, capped at 2s;
    /// cancelable via `cancel`.
    pub async fn acquire_with_wait(
        &self,
        id: &WorkspaceId,
        owner: OwnerId,
        ttl: Duration,
        wait_seconds: i64,
        cancel: &CancellationToken,
    ) -> Result<AcquireOutcome, WorkspaceError> {
        match self.try_acquire(id, owner.clone(), ttl) {
            Ok(outcome) => return Ok(outcome),
            Err(WorkspaceError::Lease(LeaseError::Held(_))) => {}
            Err(other) => return Err(other),
        }
        if wait_seconds <= 0 {
            return Err(WorkspaceError::Lease(LeaseError::NoWait));
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(wait_seconds as u64);
        let mut attempt: u32 = 0;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(WorkspaceError::Lease(LeaseError::WaitTimeout));
            }
            let sleep_for = fleetd_core::lease::acquire_wait_backoff(attempt).min(remaining);
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = cancel.cancelled() => return Err(WorkspaceError::Lease(LeaseError::Cancelled)),
            }
            match self.try_acquire(id, owner.clone(), ttl) {
                Ok(outcome) => return Ok(outcome),
                Err(WorkspaceError::Lease(LeaseError::Held(_))) => {
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Runs `op` while holding an internal lease keyed by `owner`,
    /// releasing it on every exit path (spec.md §4.2: "acquire an
    /// internal lease... and release on all exits").
    async fn with_internal_lease<T, Fut>(&self, id: &WorkspaceId, owner: OwnerId, op: impl FnOnce() -> Fut) -> Result<T, WorkspaceError>
    where
        Fut: Future<Output = Result<T, WorkspaceError>>,
    {
        let nonce = Nonce::generate();
        let now = self.clock.epoch_ms();
        let ttl_ms = fleetd_core::DEFAULT_LEASE_TTL.as_millis() as u64;
        self.store.try_acquire_lease(id, &owner, &nonce, ttl_ms, now).map_err(|e| Self::map_not_found(id, e))?;
        crate::events::emit(
            self.store.as_ref(),
            "workspace.lease.acquired",
            json!({"workspace_id": id.to_string(), "owner": owner.to_string(), "ttl_seconds": fleetd_core::DEFAULT_LEASE_TTL.as_secs()}),
            None,
            None,
            "internal workspace lease acquired",
            now,
        );

        let result = op().await;

        let now = self.clock.epoch_ms();
        let _ = self.store.release_lease(id, &owner, &nonce);
        crate::events::emit(
            self.store.as_ref(),
            "workspace.lease.released",
            json!({"workspace_id": id.to_string(), "owner": owner.to_string()}),
            None,
            None,
            "internal workspace lease released",
            now,
        );

        result
    }

    fn require_detached(&self, id: &WorkspaceId) -> Result<Workspace, WorkspaceError> {
        let workspace = self.store.get_workspace(id).map_err(|e| Self::map_not_found(id, e))?;
        if workspace.is_attached() {
            return Err(WorkspaceError::MustBeDetached(id.clone()));
        }
        Ok(workspace)
    }

    /// `Fork(id, name, [from_snapshot])` (spec.md §4.2).
    pub async fn fork(&self, id: &WorkspaceId, new_name: &str, from_snapshot: Option<&str>) -> Result<Workspace, WorkspaceError> {
        let source = self.require_detached(id)?;
        let owner = OwnerId::fork(id.clone(), self.internal_nanos());
        let volume_id = source.volume_id.clone();
        let storage = source.storage.clone();
        let new_name = new_name.to_string();
        let from_snapshot = from_snapshot.map(str::to_string);
        let backend = Arc::clone(&self.backend);
        let store = Arc::clone(&self.store);
        let clock = self.clock.clone();

        self.with_internal_lease(id, owner, move || async move {
            let volume = match from_snapshot {
                Some(snapshot) => backend.volume_clone_from_snapshot(&volume_id, &snapshot, &new_name).await,
                None => backend.volume_clone(&volume_id, &new_name).await,
            }
            .map_err(|e| match e {
                BackendError::StorageUnsupported(s) => WorkspaceError::StorageUnsupported(s),
                other => WorkspaceError::Backend(other.to_string()),
            })?;
            let now = clock.epoch_ms();
            let forked = Workspace::new(WorkspaceId::new(), &new_name, &storage, volume.volume_id, volume.size_gb, now);
            store.put_workspace(forked.clone()).map_err(|e| match e {
                StoreError::AlreadyExists { name, .. } => WorkspaceError::AlreadyExists(name),
                other => WorkspaceError::Store(other.to_string()),
            })?;
            Ok(forked)
        })
        .await
    }

    /// `SnapshotCreate(id, name)` (spec.md §4.2).
    pub async fn snapshot_create(&self, id: &WorkspaceId, name: &str) -> Result<(), WorkspaceError> {
        let workspace = self.require_detached(id)?;
        let owner = OwnerId::snapshot(id.clone(), self.internal_nanos());
        let volume_id = workspace.volume_id.clone();
        let name = name.to_string();
        let backend = Arc::clone(&self.backend);
        self.with_internal_lease(id, owner, move || async move {
            backend.volume_snapshot_create(&volume_id, &name).await.map_err(|e| WorkspaceError::Backend(e.to_string()))
        })
        .await
    }

    /// `SnapshotRestore(id, name)` (spec.md §4.2). Surfaces a backend
    /// error unchanged if the snapshot predates the current volume size
    /// (spec.md §6 open question: no resize reconciliation attempted).
    pub async fn snapshot_restore(&self, id: &WorkspaceId, name: &str) -> Result<(), WorkspaceError> {
        let workspace = self.require_detached(id)?;
        let owner = OwnerId::snapshot(id.clone(), self.internal_nanos());
        let volume_id = workspace.volume_id.clone();
        let name = name.to_string();
        let backend = Arc::clone(&self.backend);
        self.with_internal_lease(id, owner, move || async move {
            backend.volume_snapshot_restore(&volume_id, &name).await.map_err(|e| WorkspaceError::Backend(e.to_string()))
        })
        .await
    }

    /// `SnapshotList(id)` (spec.md §4.2).
    pub async fn snapshot_list(&self, id: &WorkspaceId) -> Result<Vec<SnapshotInfo>, WorkspaceError> {
        let workspace = self.require_detached(id)?;
        let owner = OwnerId::snapshot(id.clone(), self.internal_nanos());
        let volume_id = workspace.volume_id.clone();
        let backend = Arc::clone(&self.backend);
        self.with_internal_lease(id, owner, move || async move {
            backend.volume_snapshot_list(&volume_id).await.map_err(|e| WorkspaceError::Backend(e.to_string()))
        })
        .await
    }

    /// `FSCK(id, repair)` (spec.md §4.2): `repair=false` runs read-only
    /// (`fsck -f -n`), `repair=true` runs repair (`fsck -f -y`).
    pub async fn fsck(&self, id: &WorkspaceId, repair: bool) -> Result<FsckOutcome, WorkspaceError> {
        let workspace = self.require_detached(id)?;
        let owner = OwnerId::fsck(id.clone(), self.internal_nanos());
        let volume_id = workspace.volume_id.clone();
        let backend = Arc::clone(&self.backend);
        let runner = Arc::clone(&self.fsck);
        self.with_internal_lease(id, owner, move || async move {
            let device_path = backend.volume_device_path(&volume_id).await.map_err(|e| WorkspaceError::Backend(e.to_string()))?;
            runner.run(&device_path, repair).await.map_err(|e| match e {
                FsckError::NotBlockDevice(path) => WorkspaceError::StorageUnsupported(format!("{path} is not a block device")),
                FsckError::Rpc(message) => WorkspaceError::Backend(message),
            })
        })
        .await
    }
}

#[cfg(test)]
#[path = "workspace_manager_tests.rs"]
mod tests;
