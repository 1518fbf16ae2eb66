// ── JSON file repository ──
//
// A `MemoryStore` that is loaded from and saved to one JSON document.
// Writes mark the store dirty; `flush` rewrites the whole file through a
// sibling temp file and a rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{HealthRepository, MemoryStore};
use crate::error::{CoreError, CoreResult};
use crate::feed::EventQuery;
use crate::model::{Device, DeviceEvent, DeviceId, NewDeviceEvent, Site, SiteId};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateFile {
    version: u32,
    sites: Vec<Site>,
    devices: Vec<Device>,
    events: Vec<DeviceEvent>,
}

/// Repository persisted to a JSON file between processes.
///
/// One process at a time is expected to write a given file.
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    dirty: AtomicBool,
    save_lock: Mutex<()>,
}

fn storage_error(path: &Path, action: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::Dependency {
        message: format!("cannot {action} state file {}: {err}", path.display()),
    }
}

impl FileStore {
    /// Load `path`, or start empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let inner = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let state: StateFile = serde_json::from_slice(&bytes)
                    .map_err(|e| storage_error(&path, "parse", e))?;
                if state.version != FORMAT_VERSION {
                    return Err(storage_error(
                        &path,
                        "load",
                        format!("unsupported format version {}", state.version),
                    ));
                }
                debug!(
                    path = %path.display(),
                    sites = state.sites.len(),
                    devices = state.devices.len(),
                    events = state.events.len(),
                    "state loaded"
                );
                MemoryStore::restore(state.sites, state.devices, state.events)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no saved state, starting empty");
                MemoryStore::new()
            }
            Err(e) => return Err(storage_error(&path, "read", e)),
        };

        Ok(Self {
            path,
            inner,
            dirty: AtomicBool::new(false),
            save_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn touch(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    async fn save(&self) -> CoreResult<()> {
        let state = StateFile {
            version: FORMAT_VERSION,
            sites: self.inner.sites().await?,
            devices: self.inner.all_devices(),
            events: self.inner.all_events().await,
        };
        let body =
            serde_json::to_vec_pretty(&state).map_err(|e| storage_error(&self.path, "encode", e))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| storage_error(&self.path, "create directory for", e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| storage_error(&tmp, "write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error(&self.path, "replace", e))?;

        debug!(
            path = %self.path.display(),
            sites = state.sites.len(),
            devices = state.devices.len(),
            events = state.events.len(),
            "state saved"
        );
        Ok(())
    }
}

#[async_trait]
impl HealthRepository for FileStore {
    async fn find_site_by_external_id(&self, external_id: &str) -> CoreResult<Option<Site>> {
        self.inner.find_site_by_external_id(external_id).await
    }

    async fn get_site(&self, id: SiteId) -> CoreResult<Option<Site>> {
        self.inner.get_site(id).await
    }

    async fn sites(&self) -> CoreResult<Vec<Site>> {
        self.inner.sites().await
    }

    async fn upsert_site(&self, site: Site) -> CoreResult<()> {
        self.inner.upsert_site(site).await?;
        self.touch();
        Ok(())
    }

    async fn find_device_by_external_id(&self, external_id: &str) -> CoreResult<Option<Device>> {
        self.inner.find_device_by_external_id(external_id).await
    }

    async fn get_device(&self, id: DeviceId) -> CoreResult<Option<Device>> {
        self.inner.get_device(id).await
    }

    async fn devices_for_site(&self, site: SiteId) -> CoreResult<Vec<Device>> {
        self.inner.devices_for_site(site).await
    }

    async fn primary_hosts(&self) -> CoreResult<Vec<Device>> {
        self.inner.primary_hosts().await
    }

    async fn upsert_device_status(&self, device: Device) -> CoreResult<()> {
        self.inner.upsert_device_status(device).await?;
        self.touch();
        Ok(())
    }

    async fn append_event(&self, event: NewDeviceEvent) -> CoreResult<DeviceEvent> {
        let event = self.inner.append_event(event).await?;
        self.touch();
        Ok(event)
    }

    async fn events(&self, query: &EventQuery) -> CoreResult<Vec<DeviceEvent>> {
        self.inner.events(query).await
    }

    async fn flush(&self) -> CoreResult<()> {
        let _guard = self.save_lock.lock().await;
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let saved = self.save().await;
        if saved.is_err() {
            self.touch();
        }
        saved
    }
}
