// ── In-memory repository ──

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use super::HealthRepository;
use super::collection::EntityCollection;
use crate::error::CoreResult;
use crate::feed::{self, EventQuery};
use crate::model::{Device, DeviceEvent, DeviceId, EventId, NewDeviceEvent, Site, SiteId};

/// Process-local store. Contents live as long as the value does.
pub struct MemoryStore {
    sites: EntityCollection<SiteId, Site>,
    devices: EntityCollection<DeviceId, Device>,
    events: RwLock<Vec<DeviceEvent>>,
    next_event_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sites: EntityCollection::new(),
            devices: EntityCollection::new(),
            events: RwLock::new(Vec::new()),
            next_event_id: AtomicU64::new(1),
        }
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Rebuild a store from saved contents. New event ids continue after
    /// the highest one restored.
    pub fn restore(sites: Vec<Site>, devices: Vec<Device>, mut events: Vec<DeviceEvent>) -> Self {
        let mut store = Self::new();
        for site in sites {
            let external = site.external_site_id.clone();
            store.sites.upsert(&external, site.id, site);
        }
        for device in devices {
            let external = device.external_device_id.clone();
            store.devices.upsert(&external, device.id, device);
        }
        events.sort_by_key(|e| e.id);
        let next = events.last().map_or(1, |e| e.id.get() + 1);
        store.next_event_id.store(next, Ordering::Relaxed);
        *store.events.get_mut() = events;
        store
    }

    pub(crate) fn all_devices(&self) -> Vec<Device> {
        self.devices.snapshot().iter().map(|d| (**d).clone()).collect()
    }

    pub(crate) async fn all_events(&self) -> Vec<DeviceEvent> {
        self.events.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthRepository for MemoryStore {
    async fn find_site_by_external_id(&self, external_id: &str) -> CoreResult<Option<Site>> {
        Ok(self.sites.get_by_external(external_id).map(|s| (*s).clone()))
    }

    async fn get_site(&self, id: SiteId) -> CoreResult<Option<Site>> {
        Ok(self.sites.get(&id).map(|s| (*s).clone()))
    }

    async fn sites(&self) -> CoreResult<Vec<Site>> {
        Ok(self.sites.snapshot().iter().map(|s| (**s).clone()).collect())
    }

    async fn upsert_site(&self, site: Site) -> CoreResult<()> {
        trace!(site = %site.name, status = %site.normalized_status, "upsert site");
        let external = site.external_site_id.clone();
        self.sites.upsert(&external, site.id, site);
        Ok(())
    }

    async fn find_device_by_external_id(&self, external_id: &str) -> CoreResult<Option<Device>> {
        Ok(self
            .devices
            .get_by_external(external_id)
            .map(|d| (*d).clone()))
    }

    async fn get_device(&self, id: DeviceId) -> CoreResult<Option<Device>> {
        Ok(self.devices.get(&id).map(|d| (*d).clone()))
    }

    async fn devices_for_site(&self, site: SiteId) -> CoreResult<Vec<Device>> {
        Ok(self
            .devices
            .snapshot()
            .iter()
            .filter(|d| d.site_id == site)
            .map(|d| (**d).clone())
            .collect())
    }

    async fn primary_hosts(&self) -> CoreResult<Vec<Device>> {
        Ok(self
            .devices
            .snapshot()
            .iter()
            .filter(|d| d.is_primary_host)
            .map(|d| (**d).clone())
            .collect())
    }

    async fn upsert_device_status(&self, device: Device) -> CoreResult<()> {
        trace!(
            device = %device.external_device_id,
            status = %device.normalized_status,
            "upsert device"
        );
        let external = device.external_device_id.clone();
        self.devices.upsert(&external, device.id, device);
        Ok(())
    }

    async fn append_event(&self, event: NewDeviceEvent) -> CoreResult<DeviceEvent> {
        let mut events = self.events.write().await;
        // Assigned under the write lock so id order matches insertion order.
        let id = EventId::new(self.next_event_id.fetch_add(1, Ordering::Relaxed));
        let event = DeviceEvent::from_new(id, event);
        events.push(event.clone());
        Ok(event)
    }

    async fn events(&self, query: &EventQuery) -> CoreResult<Vec<DeviceEvent>> {
        let events = self.events.read().await;
        Ok(feed::select(events.iter(), query, |id| {
            self.devices.get(id).is_some_and(|d| d.is_primary_host)
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{EventKind, HealthStatus, Severity};
    use chrono::Utc;

    fn device(site: SiteId, ext: &str, primary: bool) -> Device {
        Device {
            id: DeviceId::new(),
            external_device_id: ext.into(),
            site_id: site,
            name: None,
            model_type: None,
            ip_address: None,
            vendor: "unifi".into(),
            raw_status: Some("online".into()),
            normalized_status: HealthStatus::Online,
            is_primary_host: primary,
            wan1_status: HealthStatus::Unknown,
            wan2_status: HealthStatus::Unknown,
            last_seen_at: None,
        }
    }

    fn new_event(device: &Device, severity: Severity) -> NewDeviceEvent {
        NewDeviceEvent {
            device_id: device.id,
            site_id: device.site_id,
            kind: EventKind::Sync,
            severity,
            title: "t".into(),
            message: None,
            raw_payload: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sites_resolve_by_external_id() {
        let store = MemoryStore::new();
        let site = Site::new("host-1", "Clinic");
        store.upsert_site(site.clone()).await.unwrap();

        let found = store.find_site_by_external_id("host-1").await.unwrap();
        assert_eq!(found, Some(site.clone()));
        assert_eq!(store.get_site(site.id).await.unwrap(), Some(site));
        assert_eq!(store.site_count(), 1);
    }

    #[tokio::test]
    async fn devices_partition_by_site() {
        let store = MemoryStore::new();
        let a = SiteId::new();
        let b = SiteId::new();
        store.upsert_device_status(device(a, "a-1", true)).await.unwrap();
        store.upsert_device_status(device(a, "a-2", false)).await.unwrap();
        store.upsert_device_status(device(b, "b-1", true)).await.unwrap();

        assert_eq!(store.devices_for_site(a).await.unwrap().len(), 2);
        assert_eq!(store.devices_for_site(b).await.unwrap().len(), 1);
        assert_eq!(store.primary_hosts().await.unwrap().len(), 2);
        assert!(store.find_device_by_external_id("a-2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn appended_events_get_increasing_ids() {
        let store = MemoryStore::new();
        let d = device(SiteId::new(), "d", false);
        let first = store.append_event(new_event(&d, Severity::Info)).await.unwrap();
        let second = store.append_event(new_event(&d, Severity::Info)).await.unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn events_query_respects_primary_flag() {
        let store = MemoryStore::new();
        let site = SiteId::new();
        let host = device(site, "host", true);
        let switch = device(site, "switch", false);
        store.upsert_device_status(host.clone()).await.unwrap();
        store.upsert_device_status(switch.clone()).await.unwrap();
        store.append_event(new_event(&host, Severity::Critical)).await.unwrap();
        store.append_event(new_event(&switch, Severity::Critical)).await.unwrap();

        let all = store.events(&EventQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let primary = store
            .events(&EventQuery {
                primary_only: true,
                ..EventQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(primary.len(), 1);
        assert_eq!(primary[0].device_id, host.id);
    }
}
