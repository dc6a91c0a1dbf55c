// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's shared handle: one `Store`, the stub backend collaborators
//! (spec.md §1's hypervisor/snippet/exposure/fsck contracts — no real
//! implementation of any of these ships in this repo, see DESIGN.md), the
//! three managers, the profile table, and the ambient registries every
//! route handler reads from.

use std::collections::HashMap;
use std::sync::Arc;

use fleetd_adapters::{
    ExposurePublisher, HypervisorBackend, StubExposurePublisher, StubFsckRunner, StubHypervisorBackend,
    StubSnippetStore,
};
use fleetd_core::{MetricsRegistry, Profile, SystemClock, TaskHealthRegistry};
use fleetd_engine::{JobOrchestrator, SandboxManager, WorkspaceManager};
use fleetd_storage::{MemoryStore, Store};

use crate::config::DaemonConfig;

/// Cloneable application handle threaded through every axum handler via
/// `State<AppState>`. Every field behind an `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Held directly (not just inside the managers) so route handlers
    /// that provision a job-less sandbox (`POST /v1/sandboxes`) can drive
    /// the clone/configure/start sequence themselves, the same way
    /// `JobOrchestrator::provision` does for job-bound sandboxes.
    pub backend: Arc<dyn HypervisorBackend>,
    pub sandboxes: Arc<SandboxManager<SystemClock>>,
    pub workspaces: Arc<WorkspaceManager<SystemClock>>,
    pub jobs: Arc<JobOrchestrator<SystemClock>>,
    pub exposures: Arc<dyn ExposurePublisher>,
    pub profiles: Arc<HashMap<String, Profile>>,
    pub metrics: MetricsRegistry,
    pub tasks: TaskHealthRegistry,
    pub auth_token: Option<String>,
    pub artifacts_dir: std::path::PathBuf,
}

impl AppState {
    pub fn new(config: &DaemonConfig, profiles: HashMap<String, Profile>) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let backend: Arc<dyn HypervisorBackend> = Arc::new(StubHypervisorBackend::with_templates(
            profiles.values().map(|p| p.template.clone()),
        ));
        let snippets = Arc::new(StubSnippetStore::new());
        let fsck = Arc::new(StubFsckRunner::new());
        let exposures: Arc<dyn ExposurePublisher> = Arc::new(StubExposurePublisher::new());
        let clock = SystemClock;
        let metrics = MetricsRegistry::new();

        let sandboxes = Arc::new(SandboxManager::new(
            Arc::clone(&store),
            Arc::clone(&backend),
            snippets.clone(),
            clock.clone(),
        ));
        let workspaces = Arc::new(WorkspaceManager::new(
            Arc::clone(&store),
            Arc::clone(&backend),
            fsck.clone(),
            clock.clone(),
        ));
        let jobs = Arc::new(
            JobOrchestrator::new(
                Arc::clone(&store),
                Arc::clone(&backend),
                snippets,
                Arc::clone(&sandboxes),
                Arc::clone(&workspaces),
                clock,
                metrics.clone(),
                profiles.clone(),
                config.controller_url.clone(),
            )
            .with_provision_timeout(config.provision_timeout),
        );

        Self {
            store,
            backend,
            sandboxes,
            workspaces,
            jobs,
            exposures,
            profiles: Arc::new(profiles),
            metrics,
            tasks: TaskHealthRegistry::new(),
            auth_token: config.auth_token.clone(),
            artifacts_dir: config.state_dir.join("artifacts"),
        }
    }

    pub fn resolve_profile(&self, name: &str) -> Option<Profile> {
        self.profiles.get(name).cloned()
    }
}
