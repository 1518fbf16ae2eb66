// ── Health engine ──
//
// The write path (observation -> normalized device -> site rollup ->
// classified events) and the read side (host list, fleet stats, event
// feed). Storage and alert delivery are injected; the engine keeps no
// entity state of its own.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::aggregate::{rollup_statuses, wan_rollup};
use crate::classify::{classify, detect_transitions};
use crate::config::{EngineConfig, PrimaryHostPolicy};
use crate::error::{CoreError, CoreResult};
use crate::feed::EventQuery;
use crate::filter::{SeverityFilter, StatusFilter, filter_hosts};
use crate::model::{
    Device, DeviceEvent, DeviceId, EventEntry, EventKind, HealthStatus, HostSummary, Observation,
    Site, SiteId, TestAlertKind,
};
use crate::normalize::normalize;
use crate::notify::{Delivery, Notifier};
use crate::stats::FleetStats;
use crate::store::HealthRepository;

const DEFAULT_VENDOR: &str = "unifi";
const UNKNOWN_SITE: &str = "Unknown site";
const UNKNOWN_DEVICE: &str = "Unknown device";

/// Result of applying one observation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub device: Device,
    pub site: Site,
    /// `true` when the device had never been observed before.
    pub created: bool,
    /// Events appended for this observation, in append order.
    pub events: Vec<DeviceEvent>,
}

/// An observation dropped for a validation-class reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub external_site_id: String,
    pub external_device_id: String,
    pub reason: String,
}

/// Summary of an [`HealthEngine::apply_batch`] run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub applied: usize,
    pub created: usize,
    pub rejected: Vec<Rejection>,
    pub events: Vec<DeviceEvent>,
}

/// Result of a manual test alert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAlertOutcome {
    pub site_name: String,
    pub host_name: String,
    pub event: DeviceEvent,
    pub delivery: Delivery,
}

pub struct HealthEngine {
    repo: Arc<dyn HealthRepository>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
    /// Serializes writes per site so a rollup never reads a half-updated
    /// device set. A device move holds both sites' locks.
    site_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl HealthEngine {
    pub fn new(
        repo: Arc<dyn HealthRepository>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repo,
            notifier,
            config,
            site_locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn HealthRepository> {
        &self.repo
    }

    // ── Write path ───────────────────────────────────────────────────

    /// Apply one status observation.
    ///
    /// Validation-class errors leave the store untouched.
    pub async fn apply_observation(&self, obs: Observation) -> CoreResult<ApplyOutcome> {
        let outcome = self.apply_unflushed(obs).await?;
        self.repo.flush().await?;
        Ok(outcome)
    }

    async fn apply_unflushed(&self, obs: Observation) -> CoreResult<ApplyOutcome> {
        let external_site_id = obs.external_site_id.trim().to_owned();
        let external_device_id = obs.external_device_id.trim().to_owned();
        if external_site_id.is_empty() {
            return Err(CoreError::validation(format!(
                "observation for device '{external_device_id}' has no site identifier"
            )));
        }
        if external_device_id.is_empty() {
            return Err(CoreError::validation(format!(
                "observation for site '{external_site_id}' has no device identifier"
            )));
        }

        let (_guards, previous) = self
            .lock_sites_for(&external_site_id, &external_device_id)
            .await?;

        let observed_at = obs.observed_at;

        // ── Resolve site ──
        let existing_site = self.repo.find_site_by_external_id(&external_site_id).await?;
        let site_is_new = existing_site.is_none();
        let mut site = match existing_site {
            Some(site) => site,
            None => {
                let name = non_blank(obs.site_name.as_deref()).unwrap_or(&external_site_id);
                debug!(site = %external_site_id, "new site");
                Site::new(external_site_id.clone(), name)
            }
        };
        if let Some(name) = non_blank(obs.site_name.as_deref()) {
            name.clone_into(&mut site.name);
        }
        site.is_active = true;

        // ── Resolve device ──
        let created = previous.is_none();
        let moved_from = previous
            .as_ref()
            .map(|p| p.site_id)
            .filter(|old| *old != site.id);

        let mut device = build_device(&obs, external_device_id, previous.as_ref(), &site);

        // ── Single primary host per site ──
        if device.is_primary_host {
            let siblings = self.repo.devices_for_site(site.id).await?;
            if let Some(existing) = siblings
                .iter()
                .find(|d| d.is_primary_host && d.id != device.id)
            {
                match self.config.primary_host_policy {
                    PrimaryHostPolicy::Reject => {
                        return Err(CoreError::PrimaryHostConflict {
                            site: site.name.clone(),
                            existing: existing.external_device_id.clone(),
                            incoming: device.external_device_id.clone(),
                        });
                    }
                    PrimaryHostPolicy::Flag => {
                        warn!(
                            site = %site.name,
                            existing = %existing.external_device_id,
                            incoming = %device.external_device_id,
                            "site already has a primary host; storing device as non-primary"
                        );
                        device.is_primary_host = false;
                    }
                }
            }
        }

        // ── Persist device and rollups ──
        if site_is_new {
            self.repo.upsert_site(site.clone()).await?;
        }
        self.repo.upsert_device_status(device.clone()).await?;
        site.normalized_status = self.site_rollup(site.id).await?;
        site.updated_at = observed_at;
        self.repo.upsert_site(site.clone()).await?;

        if let Some(old_site_id) = moved_from {
            debug!(device = %device.external_device_id, "device moved between sites");
            self.refresh_site(old_site_id, observed_at).await?;
        }

        // ── Classify transitions ──
        let mut events = Vec::new();
        let mut kinds = detect_transitions(previous.as_ref(), &device);
        if self.config.emit_sync_events {
            kinds.push(EventKind::Sync);
        }
        for kind in kinds {
            let mut new_event = classify(kind, &device, &site, observed_at);
            new_event.raw_payload.clone_from(&obs.raw_payload);
            let event = self.repo.append_event(new_event).await?;
            info!(
                device_id = %device.id,
                severity = %event.severity,
                event_type = event.event_type(),
                title = %event.title,
                "event appended"
            );
            events.push(event);
        }

        debug!(
            device = %device.external_device_id,
            status = %device.normalized_status,
            site_status = %site.normalized_status,
            "observation applied"
        );

        Ok(ApplyOutcome {
            device,
            site,
            created,
            events,
        })
    }

    /// Apply observations in order.
    ///
    /// Validation-class failures are recorded and skipped; the first
    /// dependency-class failure aborts the batch. Observations applied
    /// before an abort are still flushed.
    pub async fn apply_batch<I>(&self, observations: I) -> CoreResult<SyncReport>
    where
        I: IntoIterator<Item = Observation>,
    {
        let applied = self.apply_all(observations).await;
        let flushed = self.repo.flush().await;
        let report = applied?;
        flushed?;
        Ok(report)
    }

    async fn apply_all<I>(&self, observations: I) -> CoreResult<SyncReport>
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut report = SyncReport::default();
        for obs in observations {
            let external_site_id = obs.external_site_id.clone();
            let external_device_id = obs.external_device_id.clone();
            match self.apply_unflushed(obs).await {
                Ok(outcome) => {
                    report.applied += 1;
                    if outcome.created {
                        report.created += 1;
                    }
                    report.events.extend(outcome.events);
                }
                Err(err) if err.is_validation() => {
                    warn!(
                        site = %external_site_id,
                        device = %external_device_id,
                        error = %err,
                        "observation rejected"
                    );
                    report.rejected.push(Rejection {
                        external_site_id,
                        external_device_id,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        info!(
            applied = report.applied,
            created = report.created,
            rejected = report.rejected.len(),
            events = report.events.len(),
            "batch applied"
        );
        Ok(report)
    }

    /// Append a manual test alert for a site's primary host and hand it to
    /// the notifier.
    ///
    /// `site` may be the internal id, the external id, or the display name.
    pub async fn trigger_test_alert(
        &self,
        site: &str,
        kind: TestAlertKind,
    ) -> CoreResult<TestAlertOutcome> {
        let site = self.resolve_site(site).await?;
        let host = self
            .repo
            .devices_for_site(site.id)
            .await?
            .into_iter()
            .find(|d| d.is_primary_host)
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: format!("primary host of site '{}'", site.name),
            })?;

        let mut new_event = classify(EventKind::TestAlert { alert: kind }, &host, &site, Utc::now());
        new_event.raw_payload = Some(serde_json::json!({
            "test": true,
            "alertType": kind.to_string(),
        }));
        let event = self.repo.append_event(new_event).await?;
        self.repo.flush().await?;
        info!(
            site = %site.name,
            alert = %kind,
            severity = %event.severity,
            "test alert triggered"
        );

        let delivery = self.notifier.notify(&event, &site.name).await?;

        Ok(TestAlertOutcome {
            site_name: site.name,
            host_name: host.display_name().to_owned(),
            event,
            delivery,
        })
    }

    // ── Read side ────────────────────────────────────────────────────

    /// Primary hosts with their rollups, ordered by host name.
    pub async fn hosts(&self, filter: StatusFilter) -> CoreResult<Vec<HostSummary>> {
        let primaries = self.repo.primary_hosts().await?;
        let mut sites: HashMap<SiteId, (Option<Site>, Vec<Device>)> = HashMap::new();
        let mut hosts = Vec::with_capacity(primaries.len());

        for host in primaries {
            if !sites.contains_key(&host.site_id) {
                let site = self.repo.get_site(host.site_id).await?;
                let devices = self.repo.devices_for_site(host.site_id).await?;
                sites.insert(host.site_id, (site, devices));
            }
            let Some((site, devices)) = sites.get(&host.site_id) else {
                continue;
            };

            let overall = if devices.is_empty() {
                host.normalized_status
            } else {
                rollup_statuses(devices.iter().map(|d| d.normalized_status))
            };

            hosts.push(HostSummary {
                id: host.id,
                site_name: site.as_ref().map_or_else(|| UNKNOWN_SITE.to_owned(), |s| s.name.clone()),
                host_name: host.display_name().to_owned(),
                ip_address: host.ip_address,
                status: host.normalized_status,
                overall_status: overall,
                wan1_status: host.wan1_status,
                wan2_status: host.wan2_status,
                wan_health: wan_rollup(host.normalized_status, host.wan1_status, host.wan2_status),
                last_seen_at: host.last_seen_at,
            });
        }

        hosts.sort_by(|a, b| {
            a.host_name
                .cmp(&b.host_name)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(filter_hosts(hosts, filter))
    }

    /// Fleet-wide counts over every primary host.
    pub async fn fleet_stats(&self) -> CoreResult<FleetStats> {
        let hosts = self.hosts(StatusFilter::All).await?;
        Ok(FleetStats::from_hosts(&hosts))
    }

    /// Feed query with the configured page size.
    pub fn event_query(&self, severity: SeverityFilter, primary_only: bool) -> EventQuery {
        EventQuery {
            severity,
            primary_only,
            limit: self.config.feed_page_size,
        }
    }

    /// Event feed rows, newest first.
    pub async fn events(&self, query: &EventQuery) -> CoreResult<Vec<EventEntry>> {
        let events = self.repo.events(query).await?;
        let mut devices: HashMap<DeviceId, Option<Device>> = HashMap::new();
        let mut site_names: HashMap<SiteId, String> = HashMap::new();
        let mut entries = Vec::with_capacity(events.len());

        for event in events {
            if !devices.contains_key(&event.device_id) {
                let device = self.repo.get_device(event.device_id).await?;
                devices.insert(event.device_id, device);
            }
            if !site_names.contains_key(&event.site_id) {
                let name = self
                    .repo
                    .get_site(event.site_id)
                    .await?
                    .map_or_else(|| UNKNOWN_SITE.to_owned(), |s| s.name);
                site_names.insert(event.site_id, name);
            }

            let device = devices.get(&event.device_id).and_then(Option::as_ref);
            entries.push(EventEntry {
                id: event.id,
                site_name: site_names
                    .get(&event.site_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_SITE.to_owned()),
                device_name: device
                    .map_or_else(|| UNKNOWN_DEVICE.to_owned(), |d| d.display_name().to_owned()),
                severity: event.severity,
                title: event.title.clone(),
                message: event.message.clone(),
                event_type: event.event_type().to_owned(),
                created_at: event.created_at,
                is_primary_host: device.is_some_and(|d| d.is_primary_host),
            });
        }
        Ok(entries)
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Lock the target site and, if the device currently belongs to another
    /// site, that one too. Locks are always taken in external-id order.
    /// Returns the device's state as read under the locks.
    async fn lock_sites_for(
        &self,
        external_site_id: &str,
        external_device_id: &str,
    ) -> CoreResult<(Vec<OwnedMutexGuard<()>>, Option<Device>)> {
        let (_, mut home) = self.device_home(external_device_id).await?;
        loop {
            let mut keys = vec![external_site_id.to_owned()];
            keys.extend(home.filter(|h| h != external_site_id));
            keys.sort();

            let mut guards = Vec::with_capacity(keys.len());
            for key in &keys {
                guards.push(self.site_lock(key).lock_owned().await);
            }

            // A device only changes site while both sites are locked, so
            // once its current site is among ours it cannot move again.
            let (previous, current) = self.device_home(external_device_id).await?;
            if current.as_ref().is_none_or(|c| keys.contains(c)) {
                return Ok((guards, previous));
            }
            debug!(device = external_device_id, "device moved before locks were held, retrying");
            home = current;
        }
    }

    /// A device by external id, with the external id of the site it is
    /// stored under.
    async fn device_home(
        &self,
        external_device_id: &str,
    ) -> CoreResult<(Option<Device>, Option<String>)> {
        let Some(device) = self
            .repo
            .find_device_by_external_id(external_device_id)
            .await?
        else {
            return Ok((None, None));
        };
        let home = self
            .repo
            .get_site(device.site_id)
            .await?
            .map(|s| s.external_site_id);
        Ok((Some(device), home))
    }

    fn site_lock(&self, external_site_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.site_locks
                .entry(external_site_id.to_owned())
                .or_default()
                .value(),
        )
    }

    async fn site_rollup(&self, site: SiteId) -> CoreResult<HealthStatus> {
        let devices = self.repo.devices_for_site(site).await?;
        Ok(rollup_statuses(devices.iter().map(|d| d.normalized_status)))
    }

    async fn refresh_site(&self, site_id: SiteId, at: DateTime<Utc>) -> CoreResult<()> {
        if let Some(mut site) = self.repo.get_site(site_id).await? {
            site.normalized_status = self.site_rollup(site_id).await?;
            site.updated_at = at;
            self.repo.upsert_site(site).await?;
        }
        Ok(())
    }

    async fn resolve_site(&self, identifier: &str) -> CoreResult<Site> {
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<SiteId>() {
            if let Some(site) = self.repo.get_site(id).await? {
                return Ok(site);
            }
        }
        if let Some(site) = self.repo.find_site_by_external_id(identifier).await? {
            return Ok(site);
        }
        self.repo
            .sites()
            .await?
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(identifier))
            .ok_or_else(|| CoreError::SiteNotFound {
                identifier: identifier.to_owned(),
            })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Merge an observation over the previous device state. Descriptive fields
/// the observation omits keep their previous values.
fn build_device(
    obs: &Observation,
    external_device_id: String,
    previous: Option<&Device>,
    site: &Site,
) -> Device {
    let keep = |new: Option<&str>, old: Option<&String>| {
        non_blank(new).map(str::to_owned).or_else(|| old.cloned())
    };

    Device {
        id: previous.map_or_else(DeviceId::new, |p| p.id),
        external_device_id,
        site_id: site.id,
        name: keep(
            obs.device_name.as_deref(),
            previous.and_then(|p| p.name.as_ref()),
        ),
        model_type: keep(
            obs.model_type.as_deref(),
            previous.and_then(|p| p.model_type.as_ref()),
        ),
        ip_address: obs.ip_address.or_else(|| previous.and_then(|p| p.ip_address)),
        vendor: non_blank(obs.vendor.as_deref())
            .map(str::to_owned)
            .or_else(|| previous.map(|p| p.vendor.clone()))
            .unwrap_or_else(|| DEFAULT_VENDOR.to_owned()),
        raw_status: obs.raw_status.clone(),
        normalized_status: normalize(obs.raw_status.as_deref()),
        is_primary_host: obs.is_primary_host,
        wan1_status: normalize(obs.raw_wan1_status.as_deref()),
        wan2_status: normalize(obs.raw_wan2_status.as_deref()),
        last_seen_at: Some(obs.observed_at),
    }
}
