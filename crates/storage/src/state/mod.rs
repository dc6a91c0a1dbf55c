// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MaterializedState`: the in-memory aggregate behind [`crate::memory::MemoryStore`].
//!
//! Entities are written directly by Store CRUD calls (they are rows, not
//! reconstructed from the event stream); the event log feeds only
//! [`fleetd_core::Projection`]. This mirrors the architecture note in
//! spec.md §2: "Store writes (sandbox row, workspace attach, events)" are
//! three distinct things, not one.

use fleetd_core::{
    Event, Exposure, ExposureId, Job, JobId, Projection, Sandbox, Session, SessionId, Vmid,
    Workspace, WorkspaceId,
};
use std::collections::HashMap;

#[derive(Default)]
pub struct MaterializedState {
    pub sandboxes: HashMap<Vmid, Sandbox>,
    pub workspaces: HashMap<WorkspaceId, Workspace>,
    pub sessions: HashMap<SessionId, Session>,
    pub jobs: HashMap<JobId, Job>,
    pub exposures: HashMap<ExposureId, Exposure>,
    pub events: Vec<Event>,
    pub projection: Projection,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild `projection` from a previously-replayed event log. Entity
    /// rows are not touched — those come from whatever snapshot mechanism
    /// the caller used, which this repo does not implement yet (see
    /// DESIGN.md open question 2).
    pub fn replay_events(&mut self, events: Vec<Event>) {
        self.projection.replay(events.iter());
        self.events = events;
    }

    pub fn record_event(&mut self, event: Event) {
        self.projection.apply_event(&event);
        self.events.push(event);
    }

    pub fn workspace_by_name(&self, name: &str) -> Option<&Workspace> {
        self.workspaces.values().find(|w| w.name == name)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
