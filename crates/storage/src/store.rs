// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Store contract (spec.md §2 collaborator table: "Transactional KV
//! over entities; atomic lease CAS; append-only event log").
//!
//! This crate treats the Store the way the spec treats it — as an
//! injected collaborator behind a trait, not a concrete database. The
//! only implementation shipped here is [`crate::memory::MemoryStore`], an
//! in-process row store with an optional on-disk event WAL; a future
//! on-disk/relational backend implements the same trait without touching
//! any manager code.

use fleetd_core::{
    Envelope, Event, Exposure, ExposureId, FailureRingEntry, Job, JobId, JobStatus, JobTimeline,
    Nonce, OwnerId, Sandbox, SandboxHealth, SandboxState, Session, SessionId, Vmid, Workspace,
    WorkspaceId,
};

use crate::error::StoreError;

/// Transactional KV over entities, atomic lease CAS, and an append-only
/// event log. All methods are synchronous: the in-memory implementation
/// never blocks longer than a mutex acquisition, and callers that need to
/// keep an async runtime responsive should wrap calls in
/// `tokio::task::spawn_blocking` at the call site rather than push
/// `async fn` through every Manager.
pub trait Store: Send + Sync {
    // --- Sandboxes ---------------------------------------------------
    fn put_sandbox(&self, sandbox: Sandbox) -> Result<(), StoreError>;
    fn get_sandbox(&self, vmid: Vmid) -> Result<Sandbox, StoreError>;
    fn list_sandboxes(&self) -> Vec<Sandbox>;
    fn delete_sandbox(&self, vmid: Vmid) -> Result<(), StoreError>;

    /// Compare-and-swap the sandbox's state, failing with
    /// `InvalidTransition` if the row's current state does not match
    /// `from` (spec.md §5: "all state mutations are single Store
    /// transactions (`UpdateStateIfFrom`). Concurrent transitions
    /// serialize at the row; losers see `InvalidTransition`.").
    fn update_sandbox_state_if(
        &self,
        vmid: Vmid,
        from: SandboxState,
        to: SandboxState,
        now_ms: u64,
    ) -> Result<Sandbox, StoreError>;

    /// Allocate the next unused VMID at or above `fleetd_core::sandbox::VMID_MIN`.
    fn allocate_vmid(&self) -> Vmid;

    /// Mutate auxiliary sandbox fields (ip, workspace_id, job_id,
    /// keepalive, lease_expires, last_used_at) under the row lock,
    /// stamping `last_updated_at`. State itself is never touched here —
    /// see [`Store::update_sandbox_state_if`] for that CAS.
    fn update_sandbox(&self, vmid: Vmid, now_ms: u64, mutate: &mut dyn FnMut(&mut Sandbox)) -> Result<Sandbox, StoreError>;

    // --- Workspaces ----------------------------------------------------
    fn put_workspace(&self, workspace: Workspace) -> Result<(), StoreError>;
    fn get_workspace(&self, id: &WorkspaceId) -> Result<Workspace, StoreError>;
    fn get_workspace_by_name(&self, name: &str) -> Result<Workspace, StoreError>;
    fn list_workspaces(&self) -> Vec<Workspace>;
    fn delete_workspace(&self, id: &WorkspaceId) -> Result<(), StoreError>;

    /// CAS attach: succeeds only if the workspace is currently detached.
    fn attach_workspace(&self, id: &WorkspaceId, vmid: Vmid, now_ms: u64) -> Result<Workspace, StoreError>;

    /// CAS detach: succeeds only if the workspace is attached to `vmid`.
    fn detach_workspace(&self, id: &WorkspaceId, vmid: Vmid, now_ms: u64) -> Result<Workspace, StoreError>;

    // --- Lease primitives (spec.md §4.2, Store-level CAS) --------------
    fn try_acquire_lease(
        &self,
        id: &WorkspaceId,
        owner: &OwnerId,
        nonce: &Nonce,
        ttl_ms: u64,
        now_ms: u64,
    ) -> Result<Workspace, StoreError>;

    fn renew_lease(
        &self,
        id: &WorkspaceId,
        owner: &OwnerId,
        nonce: &Nonce,
        ttl_ms: u64,
        now_ms: u64,
    ) -> Result<Workspace, StoreError>;

    fn release_lease(&self, id: &WorkspaceId, owner: &OwnerId, nonce: &Nonce) -> Result<Workspace, StoreError>;

    // --- Sessions --------------------------------------------------------
    fn put_session(&self, session: Session) -> Result<(), StoreError>;
    fn get_session(&self, id: &SessionId) -> Result<Session, StoreError>;
    fn list_sessions(&self) -> Vec<Session>;
    fn delete_session(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Mutate auxiliary session fields (current_vmid, branch) under the
    /// row lock.
    fn update_session(&self, id: &SessionId, now_ms: u64, mutate: &mut dyn FnMut(&mut Session)) -> Result<Session, StoreError>;

    // --- Jobs --------------------------------------------------------
    fn put_job(&self, job: Job) -> Result<(), StoreError>;
    fn get_job(&self, id: &JobId) -> Result<Job, StoreError>;
    fn list_jobs(&self) -> Vec<Job>;

    fn update_job_status_if(
        &self,
        id: &JobId,
        from: JobStatus,
        to: JobStatus,
        now_ms: u64,
    ) -> Result<Job, StoreError>;

    /// Mutate auxiliary job fields (sandbox_vmid, result_json, ...)
    /// under the row lock. Status itself is never touched here — see
    /// [`Store::update_job_status_if`].
    fn update_job(&self, id: &JobId, now_ms: u64, mutate: &mut dyn FnMut(&mut Job)) -> Result<Job, StoreError>;

    // --- Exposures --------------------------------------------------------
    fn put_exposure(&self, exposure: Exposure) -> Result<(), StoreError>;
    fn get_exposure(&self, id: &ExposureId) -> Result<Exposure, StoreError>;
    fn list_exposures(&self) -> Vec<Exposure>;
    fn delete_exposure(&self, id: &ExposureId) -> Result<(), StoreError>;

    /// Mutate auxiliary exposure fields (state, url, target_ip) under the
    /// row lock.
    fn update_exposure(&self, id: &ExposureId, now_ms: u64, mutate: &mut dyn FnMut(&mut Exposure)) -> Result<Exposure, StoreError>;

    // --- Events (spec.md §4.4) --------------------------------------------------------
    /// Assigns a monotonic id and timestamp, appends to the log, and
    /// folds into the live projection. Returns the recorded event.
    fn append_event(
        &self,
        envelope: Envelope,
        sandbox_vmid: Option<Vmid>,
        job_id: Option<JobId>,
        message: String,
        now_ms: u64,
    ) -> Result<Event, StoreError>;

    fn list_events(&self) -> Vec<Event>;

    fn sandbox_health(&self, vmid: Vmid) -> Option<SandboxHealth>;
    fn job_timeline(&self, job_id: &JobId) -> Option<JobTimeline>;
    fn recent_failures(&self) -> Vec<FailureRingEntry>;
}
