// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Orchestrator (spec.md §4.3): the provisioning pipeline, guest
//! report handling, and workspace rebind. Built on top of
//! [`crate::sandbox_manager::SandboxManager`] and
//! [`crate::workspace_manager::WorkspaceManager`] rather than talking to
//! the Store or the backend collaborators directly wherever one of those
//! managers already owns the relevant invariant.
//!
//! The pipeline accumulates everything it has done so far into a
//! [`ProvisionState`]; on any failure `compensate` unwinds it in reverse.
//! Detach/reattach happens before the sandbox is destroyed, and the
//! workspace lease is released last of all, so a crash mid-compensation
//! never leaves a lease orphaned against an already-gone sandbox.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fleetd_adapters::{BackendError, BootstrapToken, GuestStatus, HypervisorBackend, SnippetStore, VmConfig};
use fleetd_core::{
    Clock, Job, JobError, JobId, JobStatus, MetricsRegistry, Nonce, OwnerId, Profile, Sandbox,
    SandboxError, SandboxState, Vmid, Workspace, WorkspaceError, WorkspaceId, DEFAULT_LEASE_TTL,
};
use fleetd_storage::{Store, StoreError};
use parking_lot::Mutex;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::sandbox_manager::SandboxManager;
use crate::workspace_manager::WorkspaceManager;

/// Default ceiling on a single `Run` pipeline (spec.md §4.3 "provisioning
/// that hasn't reached RUNNING within this window is abandoned").
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const GUEST_IP_POLL_ATTEMPTS: u32 = 5;
const GUEST_IP_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Outcome of a successful provisioning run (spec.md §4.3 `Run`).
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub job: Job,
    pub sandbox: Sandbox,
    pub workspace: Option<Workspace>,
}

/// Outcome of [`JobOrchestrator::rebind_workspace`] (spec.md §4.3
/// `RebindWorkspace`).
#[derive(Debug, Clone)]
pub struct RebindOutcome {
    pub workspace: Workspace,
    pub sandbox: Sandbox,
    pub old_vmid: Option<Vmid>,
}

/// The guest runner's callback body (spec.md §4.3 `HandleReport`),
/// decoupled from the wire crate's request type so this crate doesn't
/// need to depend on it.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub status: String,
    pub artifacts: Option<Vec<String>>,
    pub result: Option<serde_json::Value>,
    pub message: Option<String>,
}

/// Everything the pipeline has committed so far, used to drive
/// `compensate` on failure. Reverse order of acquisition: detach/reattach,
/// then destroy the sandbox, then release the lease last.
#[derive(Default)]
struct ProvisionState {
    lease: Option<(WorkspaceId, OwnerId, Nonce)>,
    vmid: Option<Vmid>,
    workspace_id: Option<WorkspaceId>,
    prev_vmid: Option<Vmid>,
    attached_new: bool,
}

pub struct JobOrchestrator<C: Clock> {
    store: Arc<dyn Store>,
    backend: Arc<dyn HypervisorBackend>,
    snippets: Arc<dyn SnippetStore>,
    sandboxes: Arc<SandboxManager<C>>,
    workspaces: Arc<WorkspaceManager<C>>,
    clock: C,
    metrics: MetricsRegistry,
    profiles: HashMap<String, Profile>,
    provision_timeout: Duration,
    controller_url: String,
    bootstrap_tokens: Mutex<HashMap<Vmid, BootstrapToken>>,
    /// Job-held workspace leases, tracked so the renewal task and
    /// `HandleReport` can release them without re-deriving the nonce.
    leases: Arc<Mutex<HashMap<JobId, (WorkspaceId, OwnerId, Nonce)>>>,
}

impl<C: Clock + 'static> JobOrchestrator<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn Store>,
        backend: Arc<dyn HypervisorBackend>,
        snippets: Arc<dyn SnippetStore>,
        sandboxes: Arc<SandboxManager<C>>,
        workspaces: Arc<WorkspaceManager<C>>,
        clock: C,
        metrics: MetricsRegistry,
        profiles: HashMap<String, Profile>,
        controller_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            backend,
            snippets,
            sandboxes,
            workspaces,
            clock,
            metrics,
            profiles,
            provision_timeout: DEFAULT_PROVISION_TIMEOUT,
            controller_url: controller_url.into(),
            bootstrap_tokens: Mutex::new(HashMap::new()),
            leases: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_provision_timeout(mut self, timeout: Duration) -> Self {
        self.provision_timeout = timeout;
        self
    }

    /// The bootstrap token minted for `vmid`, if any — used by the
    /// daemon's guest-callback auth to check the presented token.
    pub fn bootstrap_token(&self, vmid: Vmid) -> Option<BootstrapToken> {
        self.bootstrap_tokens.lock().get(&vmid).cloned()
    }

    fn profile(&self, name: &str) -> Result<Profile, JobError> {
        self.profiles.get(name).cloned().ok_or_else(|| JobError::UnknownProfile(name.to_string()))
    }

    /// `Run(job_id)` (spec.md §4.3): the full provisioning pipeline,
    /// wrapped in the provision timeout and compensating rollback.
    pub async fn run(&self, job_id: &JobId, workspace_wait_seconds: i64) -> Result<ProvisionOutcome, JobError> {
        let job = self.store.get_job(job_id).map_err(|_| JobError::NotFound(job_id.clone()))?;
        let profile = self.profile(&job.profile)?;
        let mut state = ProvisionState::default();
        let pipeline_started = self.clock.now();

        let outcome = match tokio::time::timeout(
            self.provision_timeout,
            self.run_pipeline(&job, &profile, workspace_wait_seconds, &mut state),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => {
                if let Some(vmid) = state.vmid {
                    let now = self.clock.epoch_ms();
                    crate::events::emit(
                        self.store.as_ref(),
                        "sandbox.timeout",
                        json!({"vmid": vmid.get()}),
                        Some(vmid),
                        Some(job.id.clone()),
                        "provisioning timed out",
                        now,
                    );
                }
                Err(JobError::ProvisionTimeout(self.provision_timeout))
            }
        };

        match outcome {
            Ok(outcome) => {
                self.metrics.record_job_pipeline_ms(pipeline_started.elapsed().as_millis() as u64);
                if let Some((ws_id, owner, nonce)) = state.lease.clone() {
                    self.leases.lock().insert(job.id.clone(), (ws_id.clone(), owner.clone(), nonce.clone()));
                    self.spawn_lease_renewal(job.id.clone(), ws_id, owner, nonce);
                }
                Ok(outcome)
            }
            Err(err) => {
                self.compensate(&state).await;
                match &err {
                    JobError::ProvisionTimeout(_) => self.metrics.record_job_timeout(),
                    _ => self.metrics.record_job_failed(),
                }
                let now = self.clock.epoch_ms();
                if let Some(vmid) = state.vmid {
                    crate::events::emit(
                        self.store.as_ref(),
                        "sandbox.provision.failed",
                        json!({"vmid": vmid.get(), "message": err.to_string()}),
                        Some(vmid),
                        Some(job.id.clone()),
                        "provisioning failed",
                        now,
                    );
                }
                let _ = self.store.update_job_status_if(&job.id, JobStatus::Queued, JobStatus::Failed, now);
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        job: &Job,
        profile: &Profile,
        workspace_wait_seconds: i64,
        state: &mut ProvisionState,
    ) -> Result<ProvisionOutcome, JobError> {
        // Step 1: validate & defaults. Host-mount requests aren't part of
        // `CreateJobRequest` today, so `Profile::allow_host_mounts` has no
        // caller-supplied flag to check against yet; nothing to gate here.
        let ttl_minutes = if job.ttl_minutes > 0 { job.ttl_minutes } else { profile.default_ttl_minutes };
        let keepalive = job.keepalive || profile.default_keepalive;
        let now = self.clock.epoch_ms();
        self.store
            .update_job(&job.id, now, &mut |j| {
                j.ttl_minutes = ttl_minutes;
                j.keepalive = keepalive;
            })
            .map_err(|e| JobError::Store(e.to_string()))?;

        // Step 2: workspace lease, if this job carries one.
        let mut workspace = None;
        if let Some(ws_id) = job.workspace_id.clone() {
            let owner = OwnerId::for_job_or_session(&job.id, job.session_id.as_ref());
            let cancel = CancellationToken::new();
            let acquired = self
                .workspaces
                .acquire_with_wait(&ws_id, owner, DEFAULT_LEASE_TTL, workspace_wait_seconds, &cancel)
                .await?;
            state.prev_vmid = acquired.workspace.attached_vm;
            state.workspace_id = Some(ws_id.clone());
            state.lease = Some((ws_id, acquired.owner, acquired.nonce));
            workspace = Some(acquired.workspace);
            self.metrics.record_lease_acquired();
        }

        // Steps 3-12: allocate, clone, bootstrap, configure, attach, boot.
        // The workspace lease (if any) was already acquired above under the
        // job/session owner, so `provision` doesn't need to acquire its own.
        let sandbox = self
            .provision(&job.task, profile, Some(job.id.clone()), state.workspace_id.clone(), state.prev_vmid, keepalive, false, state)
            .await?;

        if let Some(ws_id) = &state.workspace_id {
            workspace = Some(self.store.get_workspace(ws_id).map_err(|e| JobError::Store(e.to_string()))?);
        }

        // Step 13: the job itself transitions to RUNNING once its sandbox does.
        let now = self.clock.epoch_ms();
        let _ = self.store.update_job_status_if(&job.id, JobStatus::Queued, JobStatus::Running, now);
        let updated_job = self
            .store
            .update_job(&job.id, now, &mut |j| j.sandbox_vmid = Some(sandbox.vmid))
            .map_err(|e| JobError::Store(e.to_string()))?;
        crate::events::emit(
            self.store.as_ref(),
            "job.running",
            json!({"job_id": job.id.to_string(), "vmid": sandbox.vmid.get()}),
            Some(sandbox.vmid),
            Some(job.id.clone()),
            "job running",
            now,
        );
        crate::events::emit(
            self.store.as_ref(),
            "job.slo.start",
            json!({"job_id": job.id.to_string()}),
            Some(sandbox.vmid),
            Some(job.id.clone()),
            "job slo clock started",
            now,
        );

        Ok(ProvisionOutcome { job: updated_job, sandbox, workspace })
    }

    /// Steps 3-12 of the pipeline: allocate a VMID, clone and configure
    /// the guest, attach the workspace (if any), boot it, and take the
    /// clean snapshot. Shared between [`Self::run_pipeline`] and
    /// [`Self::rebind_workspace`], which both provision a fresh sandbox
    /// the same way.
    ///
    /// `acquire_sandbox_lease` is set by `rebind_workspace`, which holds
    /// no lease of its own going in: once the new vmid is allocated, this
    /// acquires the workspace lease under owner `sandbox:<vmid>` so a
    /// concurrent job/session can't grab the volume mid-swap. `run_pipeline`
    /// already holds its own job/session-owned lease before calling in, so
    /// it passes `false`.
    #[allow(clippy::too_many_arguments)]
    async fn provision(
        &self,
        name: &str,
        profile: &Profile,
        job_id: Option<JobId>,
        workspace_id: Option<WorkspaceId>,
        prev_vmid: Option<Vmid>,
        keepalive: bool,
        acquire_sandbox_lease: bool,
        state: &mut ProvisionState,
    ) -> Result<Sandbox, JobError> {
        self.backend.validate_template(&profile.template).await.map_err(|e| JobError::Backend(e.to_string()))?;

        let mut allocated = None;
        for _ in 0..fleetd_core::sandbox::VMID_ALLOC_RETRIES {
            let candidate = self.store.allocate_vmid();
            let now = self.clock.epoch_ms();
            let mut sandbox = Sandbox::new(candidate, name, &profile.name, now);
            sandbox.job_id = job_id.clone();
            sandbox.keepalive = keepalive;
            sandbox.workspace_id = workspace_id.clone();
            match self.store.put_sandbox(sandbox) {
                Ok(()) => {
                    allocated = Some(candidate);
                    break;
                }
                Err(StoreError::AlreadyExists { .. }) => continue,
                Err(e) => return Err(JobError::Store(e.to_string())),
            }
        }
        let vmid = allocated
            .ok_or(JobError::Sandbox(SandboxError::VmidAllocationExhausted { attempts: fleetd_core::sandbox::VMID_ALLOC_RETRIES }))?;
        state.vmid = Some(vmid);

        if acquire_sandbox_lease {
            if let Some(ws_id) = &workspace_id {
                let owner = OwnerId::sandbox(vmid);
                let acquired = self.workspaces.try_acquire(ws_id, owner, DEFAULT_LEASE_TTL)?;
                state.lease = Some((ws_id.clone(), acquired.owner, acquired.nonce));
            }
        }

        self.sandboxes.transition(vmid, SandboxState::Provisioning)?;
        self.backend.clone_vm(&profile.template, vmid, name).await.map_err(|e| JobError::Backend(e.to_string()))?;

        let now = self.clock.epoch_ms();
        let token = BootstrapToken::mint(vmid, now, self.provision_timeout.as_millis() as u64);
        let plaintext = token.plaintext.clone().unwrap_or_default();
        self.bootstrap_tokens.lock().insert(vmid, token);

        let contents = json!({
            "vmid": vmid.get(),
            "hostname": name,
            "ssh_pub_key": profile.ssh_pub_key,
            "bootstrap_token": plaintext,
            "controller_url": self.controller_url,
        })
        .to_string();
        let cloud_init_path = self.snippets.write(vmid, &contents).await.map_err(|e| JobError::Backend(e.to_string()))?;

        let config = VmConfig {
            cores: profile.cores,
            memory_mb: profile.memory_mb,
            cpu_pin: profile.cpu_pin.clone(),
            bridge: profile.bridge.clone(),
            firewall_group: profile.network_mode.to_string(),
            cloud_init_path,
        };
        self.backend.configure(vmid, &config).await.map_err(|e| JobError::Backend(e.to_string()))?;

        if let Some(ws_id) = &workspace_id {
            if prev_vmid.is_some() {
                self.workspaces.detach(ws_id).await?;
            }
            match self.workspaces.attach(ws_id, vmid).await {
                Ok(_) => state.attached_new = true,
                Err(err) => {
                    if let Some(prev) = prev_vmid {
                        let _ = self.workspaces.attach(ws_id, prev).await;
                    }
                    return Err(err.into());
                }
            }
        }

        self.sandboxes.transition(vmid, SandboxState::Booting)?;
        self.backend.start(vmid).await.map_err(|e| JobError::Backend(e.to_string()))?;

        let mut guest_ip = None;
        for attempt in 0..GUEST_IP_POLL_ATTEMPTS {
            match self.backend.guest_ip(vmid).await {
                Ok(addr) => {
                    guest_ip = Some(addr);
                    break;
                }
                Err(BackendError::GuestIpNotFound(_)) => {
                    let now = self.clock.epoch_ms();
                    crate::events::emit(
                        self.store.as_ref(),
                        "sandbox.ip_pending",
                        json!({"vmid": vmid.get()}),
                        Some(vmid),
                        job_id.clone(),
                        "guest ip not yet available",
                        now,
                    );
                    if attempt + 1 < GUEST_IP_POLL_ATTEMPTS {
                        tokio::time::sleep(GUEST_IP_POLL_INTERVAL).await;
                    }
                }
                Err(err) => return Err(JobError::Backend(err.to_string())),
            }
        }
        let guest_ip = guest_ip.ok_or_else(|| JobError::Backend(format!("guest ip not available for vmid {vmid} after polling")))?;
        let now = self.clock.epoch_ms();
        self.store
            .update_sandbox(vmid, now, &mut |s| s.ip = guest_ip.clone())
            .map_err(|e| JobError::Store(e.to_string()))?;

        let sandbox = self.sandboxes.transition(vmid, SandboxState::Ready)?;
        let now = self.clock.epoch_ms();
        let duration_ms = now.saturating_sub(sandbox.created_at);
        crate::events::emit(
            self.store.as_ref(),
            "sandbox.slo.ready",
            json!({"vmid": vmid.get(), "duration_ms": duration_ms}),
            Some(vmid),
            job_id.clone(),
            "sandbox ready",
            now,
        );
        self.metrics.record_sandbox_provision_ms(duration_ms);

        match self.backend.status(vmid).await {
            Ok(GuestStatus::Running) => {
                crate::events::emit(
                    self.store.as_ref(),
                    "sandbox.slo.ssh_ready",
                    json!({"vmid": vmid.get()}),
                    Some(vmid),
                    job_id.clone(),
                    "ssh probe succeeded",
                    now,
                );
            }
            _ => {
                crate::events::emit(
                    self.store.as_ref(),
                    "sandbox.slo.ssh_failed",
                    json!({"vmid": vmid.get(), "message": "guest backend not reporting running"}),
                    Some(vmid),
                    job_id.clone(),
                    "ssh probe failed",
                    now,
                );
            }
        }

        let sandbox = self.sandboxes.transition(vmid, SandboxState::Running)?;

        if let Err(err) = self.backend.snapshot_create(vmid, "clean").await {
            tracing::warn!(vmid = vmid.get(), %err, "failed to create clean snapshot after provisioning");
        }

        Ok(sandbox)
    }

    /// Unwinds whatever `state` recorded, in the order spec.md §4.3
    /// describes: detach/reattach, then destroy the sandbox (idempotent
    /// against not-found), then release the lease last.
    async fn compensate(&self, state: &ProvisionState) {
        if let Some(ws_id) = &state.workspace_id {
            if state.attached_new {
                let _ = self.workspaces.detach(ws_id).await;
                if let Some(prev) = state.prev_vmid {
                    let _ = self.workspaces.attach(ws_id, prev).await;
                }
            }
        }
        if let Some(vmid) = state.vmid {
            let _ = self.sandboxes.force_destroy(vmid).await;
            self.bootstrap_tokens.lock().remove(&vmid);
        }
        if let Some((ws_id, owner, nonce)) = &state.lease {
            let _ = self.workspaces.release(ws_id, owner, nonce);
        }
    }

    /// Renews the job's workspace lease at `renew_interval(ttl)` until the
    /// job reaches a terminal status (spec.md §9: "lease renewal is the
    /// only background coroutine started by a job").
    fn spawn_lease_renewal(&self, job_id: JobId, workspace_id: WorkspaceId, owner: OwnerId, nonce: Nonce) {
        let workspaces = Arc::clone(&self.workspaces);
        let store = Arc::clone(&self.store);
        let leases = Arc::clone(&self.leases);
        let ttl = DEFAULT_LEASE_TTL;
        let interval = fleetd_core::lease::renew_interval(ttl);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match store.get_job(&job_id) {
                    Ok(job) if !job.status.is_terminal() => {}
                    _ => break,
                }
                if workspaces.renew(&workspace_id, &owner, &nonce, ttl).is_err() {
                    break;
                }
            }
            leases.lock().remove(&job_id);
        });
    }

    /// `HandleReport(job_id, report)` (spec.md §4.3): folds the guest's
    /// self-reported status into the job row, emits `job.report` plus the
    /// matching terminal event, and — unless the job asked to keep its
    /// sandbox alive — tears the sandbox and lease down.
    pub async fn handle_report(&self, job_id: &JobId, report: JobReport) -> Result<Job, JobError> {
        let job = self.store.get_job(job_id).map_err(|_| JobError::NotFound(job_id.clone()))?;
        let vmid = job.sandbox_vmid.ok_or_else(|| JobError::NotProvisioned(job_id.clone()))?;
        match self.store.get_sandbox(vmid) {
            Ok(sandbox) if sandbox.job_id.as_ref() == Some(&job.id) => {}
            _ => return Err(JobError::SandboxMismatch { job_id: job_id.clone(), vmid }),
        }

        let parsed_status = parse_job_status(&report.status)
            .ok_or_else(|| JobError::Backend(format!("unknown job status {:?}", report.status)))?;

        let now = self.clock.epoch_ms();
        crate::events::emit(
            self.store.as_ref(),
            "job.report",
            json!({"job_id": job.id.to_string(), "status": report.status, "result": report.result, "artifacts": report.artifacts}),
            Some(vmid),
            Some(job.id.clone()),
            report.message.clone().unwrap_or_else(|| "job report".to_string()),
            now,
        );

        let mut updated = self
            .store
            .update_job(&job.id, now, &mut |j| j.result_json = report.result.clone())
            .map_err(|e| JobError::Store(e.to_string()))?;

        if job.status.can_transition_to(parsed_status) {
            updated = self
                .store
                .update_job_status_if(&job.id, job.status, parsed_status, now)
                .map_err(|e| JobError::Store(e.to_string()))?;
        }

        if parsed_status.is_terminal() {
            let kind = match parsed_status {
                JobStatus::Completed => "job.completed",
                JobStatus::Failed => "job.failed",
                JobStatus::Timeout => "job.timeout",
                _ => unreachable!("is_terminal only holds for Completed/Failed/Timeout"),
            };
            let mut payload = json!({"job_id": job.id.to_string(), "vmid": vmid.get()});
            if parsed_status == JobStatus::Failed {
                payload["message"] = json!(report.message.clone().unwrap_or_else(|| "job failed".to_string()));
            }
            crate::events::emit(self.store.as_ref(), kind, payload, Some(vmid), Some(job.id.clone()), "job reached a terminal status", now);
            match parsed_status {
                JobStatus::Failed => self.metrics.record_job_failed(),
                JobStatus::Timeout => self.metrics.record_job_timeout(),
                _ => {}
            }

            if let Some(ws_id) = job.workspace_id.clone() {
                let _ = self.workspaces.detach(&ws_id).await;
            }
            let keepalive = self.store.get_sandbox(vmid).map(|s| s.keepalive).unwrap_or(job.keepalive);
            if !keepalive {
                let _ = self.sandboxes.force_destroy(vmid).await;
                self.bootstrap_tokens.lock().remove(&vmid);
            }
            if let Some((ws_id, owner, nonce)) = self.leases.lock().remove(&job.id) {
                let _ = self.workspaces.release(&ws_id, &owner, &nonce);
            }
        }

        Ok(updated)
    }

    /// `RebindWorkspace(workspace_id, profile, ttl_minutes?, keep_old)`
    /// (spec.md §4.3): provisions a fresh sandbox against the same
    /// workspace volume and swaps it in, optionally keeping the old
    /// sandbox alive instead of destroying it.
    pub async fn rebind_workspace(
        &self,
        workspace_id: &WorkspaceId,
        profile_name: &str,
        ttl_minutes: Option<u32>,
        keep_old: bool,
    ) -> Result<RebindOutcome, JobError> {
        let profile = self.profile(profile_name)?;
        let workspace = self
            .store
            .get_workspace(workspace_id)
            .map_err(|_| JobError::Workspace(WorkspaceError::NotFound(workspace_id.clone())))?;
        let old_vmid = workspace.attached_vm;

        let mut state = ProvisionState::default();
        state.workspace_id = Some(workspace_id.clone());
        state.prev_vmid = old_vmid;

        let name = format!("rebind-{}", workspace_id.short(8));
        let sandbox = match self.provision(&name, &profile, None, Some(workspace_id.clone()), old_vmid, false, true, &mut state).await {
            Ok(sandbox) => sandbox,
            Err(err) => {
                self.compensate(&state).await;
                return Err(err);
            }
        };

        if let Some(ttl) = ttl_minutes {
            let _ = self.sandboxes.renew_lease(sandbox.vmid, u64::from(ttl) * 60_000);
        }

        if let (Some(old), false) = (old_vmid, keep_old) {
            let _ = self.sandboxes.force_destroy(old).await;
        }

        // The sandbox-owned lease only needed to hold exclusivity across the
        // swap; nothing renews it afterward, so release it once the new
        // sandbox is durably attached.
        if let Some((ws_id, owner, nonce)) = state.lease.take() {
            let _ = self.workspaces.release(&ws_id, &owner, &nonce);
        }

        let workspace = self.store.get_workspace(workspace_id).map_err(|e| JobError::Store(e.to_string()))?;
        Ok(RebindOutcome { workspace, sandbox, old_vmid })
    }
}

fn parse_job_status(status: &str) -> Option<JobStatus> {
    match status {
        "queued" => Some(JobStatus::Queued),
        "running" => Some(JobStatus::Running),
        "completed" => Some(JobStatus::Completed),
        "failed" => Some(JobStatus::Failed),
        "timeout" => Some(JobStatus::Timeout),
        _ => None,
    }
}

#[cfg(test)]
#[path = "job_orchestrator_tests.rs"]
mod tests;
