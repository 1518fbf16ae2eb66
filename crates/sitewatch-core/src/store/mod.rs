// ── Persistence boundary ──
//
// The engine reads and writes sites, devices, and events only through
// `HealthRepository`. `MemoryStore` lives for one process (demo mode and
// tests); `FileStore` keeps the same state in a JSON file between runs.

mod collection;
mod file;
mod memory;

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::feed::EventQuery;
use crate::model::{Device, DeviceEvent, DeviceId, NewDeviceEvent, Site, SiteId};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage operations the engine depends on.
///
/// Implementations own transaction boundaries. Reads may be stale but
/// must be internally consistent.
#[async_trait]
pub trait HealthRepository: Send + Sync {
    // ── Sites ────────────────────────────────────────────────────────

    async fn find_site_by_external_id(&self, external_id: &str) -> CoreResult<Option<Site>>;

    async fn get_site(&self, id: SiteId) -> CoreResult<Option<Site>>;

    async fn sites(&self) -> CoreResult<Vec<Site>>;

    /// Insert or replace a site, keyed by its internal id.
    async fn upsert_site(&self, site: Site) -> CoreResult<()>;

    // ── Devices ──────────────────────────────────────────────────────

    async fn find_device_by_external_id(&self, external_id: &str) -> CoreResult<Option<Device>>;

    async fn get_device(&self, id: DeviceId) -> CoreResult<Option<Device>>;

    async fn devices_for_site(&self, site: SiteId) -> CoreResult<Vec<Device>>;

    /// Every device flagged as its site's primary host.
    async fn primary_hosts(&self) -> CoreResult<Vec<Device>>;

    /// Insert or replace a device with its latest cached statuses.
    async fn upsert_device_status(&self, device: Device) -> CoreResult<()>;

    // ── Events ───────────────────────────────────────────────────────

    /// Append an event, assigning the next creation-ordered id.
    async fn append_event(&self, event: NewDeviceEvent) -> CoreResult<DeviceEvent>;

    /// Run a feed query: filtered, newest first, capped.
    async fn events(&self, query: &EventQuery) -> CoreResult<Vec<DeviceEvent>>;

    /// Make every completed write durable. The engine calls this at the end
    /// of each public write operation.
    async fn flush(&self) -> CoreResult<()> {
        Ok(())
    }
}
