// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`MemoryStore`]: the in-process [`Store`] implementation.
//!
//! A single `parking_lot::Mutex<MaterializedState>` guards every row and
//! the live projection; every public method is one lock acquisition, one
//! CAS check, one mutation. This mirrors spec.md §5's ordering guarantee
//! ("Sandbox Manager holds no long locks; all state mutations are single
//! Store transactions... Concurrent transitions serialize at the row;
//! losers see `InvalidTransition`") — here the "row" granularity collapses
//! to "the whole map" because there is only one process and one lock, but
//! the CAS semantics callers observe are identical to a sharded store.

use std::path::PathBuf;

use fleetd_core::{
    Envelope, Event, EventId, Exposure, ExposureId, FailureRingEntry, Job, JobId, JobStatus,
    JobTimeline, LeaseConflict, Nonce, OwnerId, Sandbox, SandboxHealth, SandboxState, Session,
    SessionId, Vmid, Workspace, WorkspaceId,
};
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::state::MaterializedState;
use crate::store::Store;
use crate::wal::EventLog;

/// In-process row store. Optionally durable: when constructed with
/// [`MemoryStore::open`], every appended event is also written to an
/// on-disk [`EventLog`] and replayed back on the next `open` — this is
/// the only persistence this crate ships (spec.md treats entity-row
/// persistence itself as out of scope: "schema migrations are the
/// Store's concern", deferred to a real relational backend).
pub struct MemoryStore {
    state: Mutex<Inner>,
}

struct Inner {
    materialized: MaterializedState,
    event_log: Option<EventLog>,
    next_event_seq: u64,
}

impl MemoryStore {
    /// A fresh, non-durable store (tests, `--stub` runs).
    pub fn new() -> Self {
        Self { state: Mutex::new(Inner { materialized: MaterializedState::new(), event_log: None, next_event_seq: 1 }) }
    }

    /// Open (or create) a durable store backed by an event WAL at `path`.
    /// Entity rows themselves are not persisted by this crate (see struct
    /// doc); only the event log survives a restart, so `sandbox_health`/
    /// `job_timeline`/`recent_failures` recover but row lookups start
    /// empty. This matches DESIGN.md's recorded open-question decision on
    /// WAL/snapshot layout.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let events = EventLog::replay(&path)?;
        let log = EventLog::open(&path)?;
        let mut materialized = MaterializedState::new();
        let next_event_seq = events.iter().filter_map(|e| e.id.suffix().parse::<u64>().ok()).max().unwrap_or(0) + 1;
        materialized.replay_events(events);
        Ok(Self { state: Mutex::new(Inner { materialized, event_log: Some(log), next_event_seq }) })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> StoreError {
    StoreError::NotFound { entity, id: id.to_string() }
}

impl Store for MemoryStore {
    // --- Sandboxes ---------------------------------------------------

    fn put_sandbox(&self, sandbox: Sandbox) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        if guard.materialized.sandboxes.contains_key(&sandbox.vmid) {
            return Err(StoreError::AlreadyExists { entity: "sandbox", name: sandbox.vmid.to_string() });
        }
        guard.materialized.sandboxes.insert(sandbox.vmid, sandbox);
        Ok(())
    }

    fn get_sandbox(&self, vmid: Vmid) -> Result<Sandbox, StoreError> {
        self.state.lock().materialized.sandboxes.get(&vmid).cloned().ok_or_else(|| not_found("sandbox", vmid))
    }

    fn list_sandboxes(&self) -> Vec<Sandbox> {
        self.state.lock().materialized.sandboxes.values().cloned().collect()
    }

    fn delete_sandbox(&self, vmid: Vmid) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        guard.materialized.sandboxes.remove(&vmid).ok_or_else(|| not_found("sandbox", vmid))?;
        Ok(())
    }

    fn update_sandbox_state_if(
        &self,
        vmid: Vmid,
        from: SandboxState,
        to: SandboxState,
        now_ms: u64,
    ) -> Result<Sandbox, StoreError> {
        let mut guard = self.state.lock();
        let sandbox =
            guard.materialized.sandboxes.get_mut(&vmid).ok_or_else(|| not_found("sandbox", vmid))?;
        if sandbox.state != from {
            return Err(StoreError::InvalidTransition { entity: "sandbox", id: vmid.to_string() });
        }
        sandbox.state = to;
        sandbox.last_updated_at = now_ms;
        Ok(sandbox.clone())
    }

    fn allocate_vmid(&self) -> Vmid {
        let guard = self.state.lock();
        let max = guard.materialized.sandboxes.keys().map(|v| v.get()).max().unwrap_or(fleetd_core::sandbox::VMID_MIN - 1);
        Vmid::new((max + 1).max(fleetd_core::sandbox::VMID_MIN))
    }

    fn update_sandbox(&self, vmid: Vmid, now_ms: u64, mutate: &mut dyn FnMut(&mut Sandbox)) -> Result<Sandbox, StoreError> {
        let mut guard = self.state.lock();
        let sandbox = guard.materialized.sandboxes.get_mut(&vmid).ok_or_else(|| not_found("sandbox", vmid))?;
        mutate(sandbox);
        sandbox.last_updated_at = now_ms;
        Ok(sandbox.clone())
    }

    // --- Workspaces ----------------------------------------------------

    fn put_workspace(&self, workspace: Workspace) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        if guard.materialized.workspaces.contains_key(&workspace.id) {
            return Err(StoreError::AlreadyExists { entity: "workspace", name: workspace.id.to_string() });
        }
        if guard.materialized.workspace_by_name(&workspace.name).is_some() {
            return Err(StoreError::AlreadyExists { entity: "workspace", name: workspace.name.clone() });
        }
        guard.materialized.workspaces.insert(workspace.id.clone(), workspace);
        Ok(())
    }

    fn get_workspace(&self, id: &WorkspaceId) -> Result<Workspace, StoreError> {
        self.state.lock().materialized.workspaces.get(id).cloned().ok_or_else(|| not_found("workspace", id))
    }

    fn get_workspace_by_name(&self, name: &str) -> Result<Workspace, StoreError> {
        self.state
            .lock()
            .materialized
            .workspace_by_name(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { entity: "workspace", id: name.to_string() })
    }

    fn list_workspaces(&self) -> Vec<Workspace> {
        self.state.lock().materialized.workspaces.values().cloned().collect()
    }

    fn delete_workspace(&self, id: &WorkspaceId) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        guard.materialized.workspaces.remove(id).ok_or_else(|| not_found("workspace", id))?;
        Ok(())
    }

    fn attach_workspace(&self, id: &WorkspaceId, vmid: Vmid, now_ms: u64) -> Result<Workspace, StoreError> {
        let mut guard = self.state.lock();
        if guard.materialized.workspaces.values().any(|w| w.attached_vm == Some(vmid) && &w.id != id) {
            return Err(StoreError::AlreadyExists { entity: "workspace-attach", name: vmid.to_string() });
        }
        let ws = guard.materialized.workspaces.get_mut(id).ok_or_else(|| not_found("workspace", id))?;
        if ws.attached_vm.is_some() {
            return Err(StoreError::InvalidTransition { entity: "workspace", id: id.to_string() });
        }
        ws.attached_vm = Some(vmid);
        ws.last_updated_at = now_ms;
        Ok(ws.clone())
    }

    fn detach_workspace(&self, id: &WorkspaceId, vmid: Vmid, now_ms: u64) -> Result<Workspace, StoreError> {
        let mut guard = self.state.lock();
        let ws = guard.materialized.workspaces.get_mut(id).ok_or_else(|| not_found("workspace", id))?;
        if ws.attached_vm != Some(vmid) {
            return Err(StoreError::InvalidTransition { entity: "workspace", id: id.to_string() });
        }
        ws.attached_vm = None;
        ws.last_updated_at = now_ms;
        Ok(ws.clone())
    }

    // --- Lease primitives ------------------------------------------------

    fn try_acquire_lease(
        &self,
        id: &WorkspaceId,
        owner: &OwnerId,
        nonce: &Nonce,
        ttl_ms: u64,
        now_ms: u64,
    ) -> Result<Workspace, StoreError> {
        let mut guard = self.state.lock();
        let ws = guard.materialized.workspaces.get_mut(id).ok_or_else(|| not_found("workspace", id))?;
        let owner_str = owner.to_string();
        let held_by_other = ws.lease_held(now_ms) && ws.lease_owner.as_deref() != Some(owner_str.as_str());
        if held_by_other {
            return Err(StoreError::LeaseHeld(LeaseConflict {
                workspace_id: ws.id.clone(),
                workspace_name: ws.name.clone(),
                attached_vmid: ws.attached_vm,
                lease_owner: ws.lease_owner.clone(),
                lease_expires_at: Some(ws.lease_expires),
                workspace_wait_seconds: None,
            }));
        }
        ws.lease_owner = Some(owner_str);
        ws.lease_nonce = Some(nonce.as_str().to_string());
        ws.lease_expires = now_ms + ttl_ms;
        ws.last_updated_at = now_ms;
        Ok(ws.clone())
    }

    fn renew_lease(
        &self,
        id: &WorkspaceId,
        owner: &OwnerId,
        nonce: &Nonce,
        ttl_ms: u64,
        now_ms: u64,
    ) -> Result<Workspace, StoreError> {
        let mut guard = self.state.lock();
        let ws = guard.materialized.workspaces.get_mut(id).ok_or_else(|| not_found("workspace", id))?;
        if !ws.lease_matches(&owner.to_string(), nonce.as_str()) {
            return Err(StoreError::LeaseMismatch);
        }
        ws.lease_expires = now_ms + ttl_ms;
        ws.last_updated_at = now_ms;
        Ok(ws.clone())
    }

    fn release_lease(&self, id: &WorkspaceId, owner: &OwnerId, nonce: &Nonce) -> Result<Workspace, StoreError> {
        let mut guard = self.state.lock();
        let ws = guard.materialized.workspaces.get_mut(id).ok_or_else(|| not_found("workspace", id))?;
        // Idempotent (spec.md §7 "Recovery"): releasing an already-released
        // or mismatched lease is not an error, it simply does nothing.
        if ws.lease_matches(&owner.to_string(), nonce.as_str()) {
            ws.lease_owner = None;
            ws.lease_nonce = None;
            ws.lease_expires = 0;
        }
        Ok(ws.clone())
    }

    // --- Sessions --------------------------------------------------------

    fn put_session(&self, session: Session) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        if guard.materialized.sessions.values().any(|s| s.name == session.name) {
            return Err(StoreError::AlreadyExists { entity: "session", name: session.name.clone() });
        }
        guard.materialized.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn get_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.state.lock().materialized.sessions.get(id).cloned().ok_or_else(|| not_found("session", id))
    }

    fn list_sessions(&self) -> Vec<Session> {
        self.state.lock().materialized.sessions.values().cloned().collect()
    }

    fn delete_session(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        guard.materialized.sessions.remove(id).ok_or_else(|| not_found("session", id))?;
        Ok(())
    }

    fn update_session(&self, id: &SessionId, now_ms: u64, mutate: &mut dyn FnMut(&mut Session)) -> Result<Session, StoreError> {
        let mut guard = self.state.lock();
        let session = guard.materialized.sessions.get_mut(id).ok_or_else(|| not_found("session", id))?;
        mutate(session);
        session.last_updated_at = now_ms;
        Ok(session.clone())
    }

    // --- Jobs --------------------------------------------------------

    fn put_job(&self, job: Job) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        if guard.materialized.jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists { entity: "job", name: job.id.to_string() });
        }
        guard.materialized.jobs.insert(job.id, job);
        Ok(())
    }

    fn get_job(&self, id: &JobId) -> Result<Job, StoreError> {
        self.state.lock().materialized.jobs.get(id).cloned().ok_or_else(|| not_found("job", id))
    }

    fn list_jobs(&self) -> Vec<Job> {
        self.state.lock().materialized.jobs.values().cloned().collect()
    }

    fn update_job_status_if(
        &self,
        id: &JobId,
        from: JobStatus,
        to: JobStatus,
        now_ms: u64,
    ) -> Result<Job, StoreError> {
        let mut guard = self.state.lock();
        let job = guard.materialized.jobs.get_mut(id).ok_or_else(|| not_found("job", id))?;
        if job.status != from {
            return Err(StoreError::InvalidTransition { entity: "job", id: id.to_string() });
        }
        job.status = to;
        job.last_updated_at = now_ms;
        Ok(job.clone())
    }

    fn update_job(&self, id: &JobId, now_ms: u64, mutate: &mut dyn FnMut(&mut Job)) -> Result<Job, StoreError> {
        let mut guard = self.state.lock();
        let job = guard.materialized.jobs.get_mut(id).ok_or_else(|| not_found("job", id))?;
        mutate(job);
        job.last_updated_at = now_ms;
        Ok(job.clone())
    }

    // --- Exposures --------------------------------------------------------

    fn put_exposure(&self, exposure: Exposure) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        if guard.materialized.exposures.values().any(|e| e.name == exposure.name) {
            return Err(StoreError::AlreadyExists { entity: "exposure", name: exposure.name.clone() });
        }
        guard.materialized.exposures.insert(exposure.id.clone(), exposure);
        Ok(())
    }

    fn get_exposure(&self, id: &ExposureId) -> Result<Exposure, StoreError> {
        self.state.lock().materialized.exposures.get(id).cloned().ok_or_else(|| not_found("exposure", id))
    }

    fn list_exposures(&self) -> Vec<Exposure> {
        self.state.lock().materialized.exposures.values().cloned().collect()
    }

    fn delete_exposure(&self, id: &ExposureId) -> Result<(), StoreError> {
        let mut guard = self.state.lock();
        guard.materialized.exposures.remove(id).ok_or_else(|| not_found("exposure", id))?;
        Ok(())
    }

    fn update_exposure(&self, id: &ExposureId, now_ms: u64, mutate: &mut dyn FnMut(&mut Exposure)) -> Result<Exposure, StoreError> {
        let mut guard = self.state.lock();
        let exposure = guard.materialized.exposures.get_mut(id).ok_or_else(|| not_found("exposure", id))?;
        mutate(exposure);
        exposure.last_updated_at = now_ms;
        Ok(exposure.clone())
    }

    // --- Events --------------------------------------------------------

    fn append_event(
        &self,
        envelope: Envelope,
        sandbox_vmid: Option<Vmid>,
        job_id: Option<JobId>,
        message: String,
        now_ms: u64,
    ) -> Result<Event, StoreError> {
        let mut guard = self.state.lock();
        let seq = guard.next_event_seq;
        guard.next_event_seq += 1;
        let event = Event {
            id: EventId::from_string(format!("{}{:019}", EventId::PREFIX, seq)),
            timestamp: now_ms,
            kind: envelope.kind,
            sandbox_vmid,
            job_id,
            message,
            payload: serde_json::json!({
                "schema_version": envelope.schema_version,
                "stage": envelope.stage,
                "payload": envelope.payload,
            }),
        };
        if let Some(log) = guard.event_log.as_mut() {
            log.append(&event)?;
        }
        guard.materialized.record_event(event.clone());
        Ok(event)
    }

    fn list_events(&self) -> Vec<Event> {
        self.state.lock().materialized.events.clone()
    }

    fn sandbox_health(&self, vmid: Vmid) -> Option<SandboxHealth> {
        self.state.lock().materialized.projection.sandbox_health(vmid).cloned()
    }

    fn job_timeline(&self, job_id: &JobId) -> Option<JobTimeline> {
        self.state.lock().materialized.projection.job_timeline(job_id).cloned()
    }

    fn recent_failures(&self) -> Vec<FailureRingEntry> {
        self.state.lock().materialized.projection.recent_failures().cloned().collect()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
