// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fakes for the three backend contracts, used by
//! `fleetd-engine`'s tests and by any integration test that needs a
//! working fleet without a real hypervisor (spec.md §8 "properties
//! must hold against the stub backend").

use std::collections::HashMap;

use async_trait::async_trait;
use fleetd_core::Vmid;
use parking_lot::Mutex;

use crate::exposure::{ExposurePublisher, PublishError};
use crate::hypervisor::{BackendError, GuestStatus, HypervisorBackend, SnapshotInfo, VmConfig, VolumeInfo};
use crate::snippet::{SnippetError, SnippetStore};

pub use crate::fsck::stub::StubFsckRunner;

#[derive(Debug, Clone)]
struct GuestRecord {
    status: GuestStatus,
    config: Option<VmConfig>,
    ip: Option<String>,
    snapshots: Vec<SnapshotInfo>,
}

impl Default for GuestRecord {
    fn default() -> Self {
        Self { status: GuestStatus::Stopped, config: None, ip: None, snapshots: Vec::new() }
    }
}

/// Fake hypervisor: every VMID that has been cloned exists; start/stop
/// just flip `status`; guest IP becomes available once the guest is
/// running.
#[derive(Default)]
pub struct StubHypervisorBackend {
    guests: Mutex<HashMap<Vmid, GuestRecord>>,
    volumes: Mutex<HashMap<String, VolumeInfo>>,
    volume_snapshots: Mutex<HashMap<String, Vec<SnapshotInfo>>>,
    next_volume_id: Mutex<u64>,
    known_templates: Mutex<Vec<String>>,
    fail_next_configure: Mutex<bool>,
}

impl StubHypervisorBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: impl IntoIterator<Item = String>) -> Self {
        let backend = Self::default();
        *backend.known_templates.lock() = templates.into_iter().collect();
        backend
    }

    /// Test hook: makes the next `configure` call fail, to exercise the
    /// provisioning pipeline's compensation path.
    pub fn fail_next_configure(&self) {
        *self.fail_next_configure.lock() = true;
    }
}

#[async_trait]
impl HypervisorBackend for StubHypervisorBackend {
    async fn validate_template(&self, template: &str) -> Result<(), BackendError> {
        let known = self.known_templates.lock();
        if known.is_empty() || known.iter().any(|t| t == template) {
            Ok(())
        } else {
            Err(BackendError::TemplateNotFound(template.to_string()))
        }
    }

    async fn clone_vm(&self, _template: &str, vmid: Vmid, _name: &str) -> Result<(), BackendError> {
        self.guests.lock().insert(vmid, GuestRecord::default());
        Ok(())
    }

    async fn configure(&self, vmid: Vmid, config: &VmConfig) -> Result<(), BackendError> {
        let mut fail = self.fail_next_configure.lock();
        if *fail {
            *fail = false;
            return Err(BackendError::Rpc("injected configure failure".into()));
        }
        let mut guests = self.guests.lock();
        let record = guests.get_mut(&vmid).ok_or(BackendError::NotFound(vmid))?;
        record.config = Some(config.clone());
        Ok(())
    }

    async fn start(&self, vmid: Vmid) -> Result<(), BackendError> {
        let mut guests = self.guests.lock();
        let record = guests.get_mut(&vmid).ok_or(BackendError::NotFound(vmid))?;
        record.status = GuestStatus::Running;
        record.ip = Some(format!("10.30.{}.{}", (vmid.get() >> 8) & 0xff, vmid.get() & 0xff));
        Ok(())
    }

    async fn stop(&self, vmid: Vmid) -> Result<(), BackendError> {
        let mut guests = self.guests.lock();
        let record = guests.get_mut(&vmid).ok_or(BackendError::NotFound(vmid))?;
        record.status = GuestStatus::Stopped;
        record.ip = None;
        Ok(())
    }

    async fn destroy(&self, vmid: Vmid) -> Result<(), BackendError> {
        self.guests.lock().remove(&vmid);
        Ok(())
    }

    async fn status(&self, vmid: Vmid) -> Result<GuestStatus, BackendError> {
        Ok(self.guests.lock().get(&vmid).map(|g| g.status).unwrap_or(GuestStatus::Unknown))
    }

    async fn guest_ip(&self, vmid: Vmid) -> Result<String, BackendError> {
        self.guests
            .lock()
            .get(&vmid)
            .and_then(|g| g.ip.clone())
            .ok_or(BackendError::GuestIpNotFound(vmid))
    }

    async fn snapshot_create(&self, vmid: Vmid, name: &str) -> Result<(), BackendError> {
        let mut guests = self.guests.lock();
        let record = guests.get_mut(&vmid).ok_or(BackendError::NotFound(vmid))?;
        record.snapshots.retain(|s| s.name != name);
        record.snapshots.push(SnapshotInfo { name: name.to_string(), created_at: 0 });
        Ok(())
    }

    async fn snapshot_restore(&self, vmid: Vmid, name: &str) -> Result<(), BackendError> {
        let guests = self.guests.lock();
        let record = guests.get(&vmid).ok_or(BackendError::NotFound(vmid))?;
        if record.snapshots.iter().any(|s| s.name == name) {
            Ok(())
        } else {
            Err(BackendError::SnapshotNotFound { vmid, name: name.to_string() })
        }
    }

    async fn snapshot_list(&self, vmid: Vmid) -> Result<Vec<SnapshotInfo>, BackendError> {
        let guests = self.guests.lock();
        let record = guests.get(&vmid).ok_or(BackendError::NotFound(vmid))?;
        Ok(record.snapshots.clone())
    }

    async fn snapshot_delete(&self, vmid: Vmid, name: &str) -> Result<(), BackendError> {
        let mut guests = self.guests.lock();
        let record = guests.get_mut(&vmid).ok_or(BackendError::NotFound(vmid))?;
        record.snapshots.retain(|s| s.name != name);
        Ok(())
    }

    async fn volume_create(&self, storage: &str, size_gb: u32) -> Result<VolumeInfo, BackendError> {
        let mut next = self.next_volume_id.lock();
        *next += 1;
        let volume_id = format!("vol-{}", *next);
        let info = VolumeInfo { volume_id: volume_id.clone(), storage: storage.to_string(), size_gb };
        self.volumes.lock().insert(volume_id, info.clone());
        Ok(info)
    }

    async fn volume_delete(&self, volume_id: &str) -> Result<(), BackendError> {
        self.volumes.lock().remove(volume_id);
        Ok(())
    }

    async fn volume_info(&self, volume_id: &str) -> Result<VolumeInfo, BackendError> {
        self.volumes.lock().get(volume_id).cloned().ok_or_else(|| BackendError::VolumeNotFound(volume_id.to_string()))
    }

    async fn volume_clone(&self, volume_id: &str, new_name: &str) -> Result<VolumeInfo, BackendError> {
        let source = self.volume_info(volume_id).await?;
        self.volume_create(&source.storage, source.size_gb).await.map(|mut v| {
            v.volume_id = new_name.to_string();
            v
        })
    }

    async fn volume_clone_from_snapshot(
        &self,
        volume_id: &str,
        _snapshot_name: &str,
        new_name: &str,
    ) -> Result<VolumeInfo, BackendError> {
        self.volume_clone(volume_id, new_name).await
    }

    async fn volume_snapshot_create(&self, volume_id: &str, name: &str) -> Result<(), BackendError> {
        self.volume_info(volume_id).await?;
        let mut snapshots = self.volume_snapshots.lock();
        let entry = snapshots.entry(volume_id.to_string()).or_default();
        entry.retain(|s| s.name != name);
        entry.push(SnapshotInfo { name: name.to_string(), created_at: 0 });
        Ok(())
    }

    async fn volume_snapshot_restore(&self, volume_id: &str, name: &str) -> Result<(), BackendError> {
        self.volume_info(volume_id).await?;
        let snapshots = self.volume_snapshots.lock();
        match snapshots.get(volume_id).into_iter().flatten().any(|s| s.name == name) {
            true => Ok(()),
            false => Err(BackendError::VolumeNotFound(format!("{volume_id}@{name}"))),
        }
    }

    async fn volume_snapshot_list(&self, volume_id: &str) -> Result<Vec<SnapshotInfo>, BackendError> {
        self.volume_info(volume_id).await?;
        Ok(self.volume_snapshots.lock().get(volume_id).cloned().unwrap_or_default())
    }

    async fn volume_snapshot_delete(&self, volume_id: &str, name: &str) -> Result<(), BackendError> {
        self.volume_info(volume_id).await?;
        if let Some(entry) = self.volume_snapshots.lock().get_mut(volume_id) {
            entry.retain(|s| s.name != name);
        }
        Ok(())
    }

    async fn volume_attach(&self, volume_id: &str, _vmid: Vmid) -> Result<(), BackendError> {
        self.volume_info(volume_id).await.map(|_| ())
    }

    async fn volume_detach(&self, volume_id: &str, _vmid: Vmid) -> Result<(), BackendError> {
        self.volume_info(volume_id).await.map(|_| ())
    }

    async fn volume_device_path(&self, volume_id: &str) -> Result<String, BackendError> {
        self.volume_info(volume_id).await.map(|v| format!("/dev/stub/{}", v.volume_id))
    }
}

/// Fake exposure publisher: hands back a deterministic `http://` URL and
/// tracks published handles so `unpublish` can be verified idempotent.
#[derive(Default)]
pub struct StubExposurePublisher {
    published: Mutex<HashMap<String, (Vmid, u16)>>,
}

impl StubExposurePublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExposurePublisher for StubExposurePublisher {
    async fn publish(&self, vmid: Vmid, port: u16, label: &str) -> Result<String, PublishError> {
        let mut published = self.published.lock();
        if published.values().any(|(v, p)| *v == vmid && *p == port) {
            return Err(PublishError::PortInUse(port, vmid));
        }
        let handle = format!("expose-{}-{}-{}", vmid.get(), port, label);
        published.insert(handle.clone(), (vmid, port));
        Ok(format!("http://{}.stub.local", handle))
    }

    async fn unpublish(&self, handle: &str) -> Result<(), PublishError> {
        self.published.lock().remove(handle);
        Ok(())
    }
}

/// Fake cloud-init snippet store: keeps contents in memory keyed by
/// VMID and returns a fabricated path.
#[derive(Default)]
pub struct StubSnippetStore {
    snippets: Mutex<HashMap<Vmid, String>>,
}

impl StubSnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, vmid: Vmid) -> Option<String> {
        self.snippets.lock().get(&vmid).cloned()
    }
}

#[async_trait]
impl SnippetStore for StubSnippetStore {
    async fn write(&self, vmid: Vmid, contents: &str) -> Result<String, SnippetError> {
        self.snippets.lock().insert(vmid, contents.to_string());
        Ok(format!("/var/lib/fleetd/snippets/{}.yaml", vmid.get()))
    }

    async fn remove(&self, vmid: Vmid) -> Result<(), SnippetError> {
        self.snippets.lock().remove(&vmid);
        Ok(())
    }
}

#[cfg(test)]
#[path = "stub_tests.rs"]
mod tests;
