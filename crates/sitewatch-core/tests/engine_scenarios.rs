#![allow(clippy::unwrap_used)]
//! End-to-end engine behavior against the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use sitewatch_core::aggregate::rollup_statuses;
use sitewatch_core::seed::load_demo;
use sitewatch_core::{
    CoreError, CoreResult, Device, DeviceEvent, DeviceId, EngineConfig, EventQuery, FleetStats,
    HealthEngine, HealthRepository, HealthStatus, MemoryStore, NewDeviceEvent, Observation,
    PrimaryHostPolicy, Severity, SeverityFilter, Site, SiteId, StatusFilter, TestAlertKind,
    TracingNotifier,
};

fn engine_with(config: EngineConfig) -> HealthEngine {
    HealthEngine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(TracingNotifier::default()),
        config,
    )
}

fn engine() -> HealthEngine {
    engine_with(EngineConfig::default())
}

// ── Transitions ─────────────────────────────────────────────────────

#[tokio::test]
async fn single_device_site_goes_online_without_event() {
    let engine = engine();
    let outcome = engine
        .apply_observation(Observation::new("site-a", "device-a").with_status("online").primary())
        .await
        .unwrap();

    assert_eq!(outcome.device.normalized_status, HealthStatus::Online);
    assert!(outcome.events.is_empty());

    let hosts = engine.hosts(StatusFilter::All).await.unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].overall_status, HealthStatus::Online);
}

#[tokio::test]
async fn same_status_twice_appends_nothing() {
    let engine = engine();
    let t0 = Utc::now();
    for minute in 0..3 {
        engine
            .apply_observation(
                Observation::new("site-a", "device-a")
                    .with_status("Offline")
                    .primary()
                    .at(t0 + Duration::minutes(minute)),
            )
            .await
            .unwrap();
    }
    let feed = engine.events(&EventQuery::default()).await.unwrap();
    assert!(feed.is_empty());
}

#[tokio::test]
async fn going_offline_is_critical() {
    let engine = engine();
    let t0 = Utc::now();
    engine
        .apply_observation(Observation::new("s", "udm").with_status("online").primary().at(t0))
        .await
        .unwrap();
    let outcome = engine
        .apply_observation(
            Observation::new("s", "udm")
                .with_status("offline")
                .primary()
                .at(t0 + Duration::minutes(1)),
        )
        .await
        .unwrap();

    assert_eq!(outcome.events.len(), 1);
    let event = &outcome.events[0];
    assert_eq!(event.severity, Severity::Critical);
    assert_eq!(event.event_type(), "status_change");
    assert_eq!(event.title, "Device status changed to OFFLINE");
}

#[tokio::test]
async fn wan_link_down_with_healthy_sibling_is_warning() {
    let engine = engine();
    let t0 = Utc::now();
    engine
        .apply_observation(
            Observation::new("s", "udm")
                .with_status("online")
                .with_wan(Some("online"), Some("online"))
                .primary()
                .at(t0),
        )
        .await
        .unwrap();
    let outcome = engine
        .apply_observation(
            Observation::new("s", "udm")
                .with_status("online")
                .with_wan(Some("online"), Some("offline"))
                .primary()
                .at(t0 + Duration::minutes(1)),
        )
        .await
        .unwrap();

    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.events[0].severity, Severity::Warning);
    assert_eq!(outcome.events[0].title, "WAN 2 link down");

    let hosts = engine.hosts(StatusFilter::All).await.unwrap();
    assert_eq!(hosts[0].status, HealthStatus::Online);
    assert_eq!(hosts[0].wan_health, HealthStatus::Unstable);
}

// ── Aggregation ─────────────────────────────────────────────────────

#[tokio::test]
async fn mixed_site_is_unstable_in_fleet_counts() {
    let engine = engine();
    engine
        .apply_observation(Observation::new("s", "gw").with_status("online").primary())
        .await
        .unwrap();
    engine
        .apply_observation(Observation::new("s", "ap").with_status("offline"))
        .await
        .unwrap();

    let stats = engine.fleet_stats().await.unwrap();
    assert_eq!(
        stats,
        FleetStats {
            total_hosts: 1,
            online: 0,
            offline: 0,
            unstable: 1,
            unknown: 0,
        }
    );

    let site = engine
        .repository()
        .find_site_by_external_id("s")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(site.normalized_status, HealthStatus::Unstable);
}

#[tokio::test]
async fn host_list_is_sorted_and_filterable() {
    let engine = engine();
    for (site, device, status) in [
        ("s3", "zeta", "online"),
        ("s1", "alpha", "offline"),
        ("s2", "mid", "online"),
    ] {
        engine
            .apply_observation(Observation::new(site, device).with_status(status).primary())
            .await
            .unwrap();
    }

    let names: Vec<String> = engine
        .hosts(StatusFilter::All)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.host_name)
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);

    let online = engine
        .hosts(StatusFilter::Only(HealthStatus::Online))
        .await
        .unwrap();
    assert_eq!(online.len(), 2);
}

// ── Primary host policy ─────────────────────────────────────────────

#[tokio::test]
async fn second_primary_is_flagged_by_default() {
    let engine = engine();
    engine
        .apply_observation(Observation::new("s", "first").with_status("online").primary())
        .await
        .unwrap();
    let outcome = engine
        .apply_observation(Observation::new("s", "second").with_status("online").primary())
        .await
        .unwrap();

    assert!(!outcome.device.is_primary_host);
    assert_eq!(engine.hosts(StatusFilter::All).await.unwrap().len(), 1);
}

#[tokio::test]
async fn second_primary_is_rejected_under_reject_policy() {
    let engine = engine_with(EngineConfig {
        primary_host_policy: PrimaryHostPolicy::Reject,
        ..EngineConfig::default()
    });
    engine
        .apply_observation(Observation::new("s", "first").with_status("online").primary())
        .await
        .unwrap();
    let err = engine
        .apply_observation(Observation::new("s", "second").with_status("online").primary())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::PrimaryHostConflict { .. }));
    assert!(err.is_validation());
    assert!(
        engine
            .repository()
            .find_device_by_external_id("second")
            .await
            .unwrap()
            .is_none()
    );
}

// ── Batches ─────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_collects_validation_rejections() {
    let engine = engine();
    let report = engine
        .apply_batch([
            Observation::new("s", "a").with_status("online").primary(),
            Observation::new("s", "   ").with_status("online"),
            Observation::new("", "b").with_status("online"),
            Observation::new("s", "c").with_status("offline"),
        ])
        .await
        .unwrap();

    assert_eq!(report.applied, 2);
    assert_eq!(report.created, 2);
    assert_eq!(report.rejected.len(), 2);
}

/// Delegates to a `MemoryStore` until `fail` is set, then refuses writes.
struct FlakyStore {
    inner: MemoryStore,
    fail: AtomicBool,
}

impl FlakyStore {
    fn check(&self) -> CoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(CoreError::Dependency {
                message: "store offline".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HealthRepository for FlakyStore {
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
        self.check()?;
        self.inner.upsert_site(site).await
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
        self.check()?;
        self.inner.upsert_device_status(device).await
    }
    async fn append_event(&self, event: NewDeviceEvent) -> CoreResult<DeviceEvent> {
        self.check()?;
        self.inner.append_event(event).await
    }
    async fn events(&self, query: &EventQuery) -> CoreResult<Vec<DeviceEvent>> {
        self.inner.events(query).await
    }
}

#[tokio::test]
async fn batch_aborts_on_dependency_failure() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        fail: AtomicBool::new(true),
    });
    let engine = HealthEngine::new(
        store.clone(),
        Arc::new(TracingNotifier::default()),
        EngineConfig::default(),
    );

    let err = engine
        .apply_batch([
            Observation::new("s", "a").with_status("online"),
            Observation::new("s", "b").with_status("online"),
        ])
        .await
        .unwrap_err();
    assert!(err.is_dependency());
    assert_eq!(store.inner.device_count(), 0);

    store.fail.store(false, Ordering::SeqCst);
    let report = engine
        .apply_batch([Observation::new("s", "a").with_status("online")])
        .await
        .unwrap();
    assert_eq!(report.applied, 1);
}

// ── Feed & demo ─────────────────────────────────────────────────────

#[tokio::test]
async fn demo_fleet_stats_and_feed() {
    let store = Arc::new(MemoryStore::new());
    load_demo(store.as_ref()).await.unwrap();
    let engine = HealthEngine::new(
        store,
        Arc::new(TracingNotifier::default()),
        EngineConfig::default(),
    );

    let stats = engine.fleet_stats().await.unwrap();
    assert_eq!(stats.total_hosts, 4);
    assert_eq!(
        (stats.online, stats.offline, stats.unstable, stats.unknown),
        (1, 1, 1, 1)
    );

    let feed = engine.events(&EventQuery::default()).await.unwrap();
    assert_eq!(feed.len(), 5);
    for pair in feed.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }

    let critical = engine
        .events(&engine.event_query(SeverityFilter::Only(Severity::Critical), false))
        .await
        .unwrap();
    assert_eq!(critical.len(), 3);
    assert!(critical.iter().all(|e| e.severity == Severity::Critical));

    let primary_only = engine
        .events(&engine.event_query(SeverityFilter::All, true))
        .await
        .unwrap();
    assert!(primary_only.iter().all(|e| e.is_primary_host));

    let offline = engine
        .hosts(StatusFilter::Only(HealthStatus::Offline))
        .await
        .unwrap();
    assert_eq!(offline.len(), 1);
    assert_eq!(offline[0].site_name, "CLINICA DUO");
}

#[tokio::test]
async fn test_alert_appends_and_simulates_delivery() {
    let store = Arc::new(MemoryStore::new());
    load_demo(store.as_ref()).await.unwrap();
    let engine = HealthEngine::new(
        store,
        Arc::new(TracingNotifier::default()),
        EngineConfig::default(),
    );

    let outcome = engine
        .trigger_test_alert("site-hype-tecno", TestAlertKind::Wan2Down)
        .await
        .unwrap();
    assert!(outcome.delivery.is_simulated());
    assert_eq!(outcome.event.severity, Severity::Warning);
    assert_eq!(outcome.event.title, "Test Alert: WAN2_DOWN_TEST");
    assert_eq!(outcome.site_name, "HYPE TECNOLOGIA");

    let by_name = engine
        .trigger_test_alert("clinica duo", TestAlertKind::HostOffline)
        .await
        .unwrap();
    assert_eq!(by_name.event.severity, Severity::Critical);

    let feed = engine.events(&EventQuery::default()).await.unwrap();
    assert_eq!(feed.len(), 7);
    assert_eq!(feed[0].event_type, "test_alert");
}

#[tokio::test]
async fn feed_is_capped_at_page_size() {
    let engine = engine_with(EngineConfig {
        emit_sync_events: true,
        ..EngineConfig::default()
    });
    let t0 = Utc::now();
    for i in 0..60 {
        engine
            .apply_observation(
                Observation::new("s", "d")
                    .with_status("online")
                    .at(t0 + Duration::seconds(i)),
            )
            .await
            .unwrap();
    }
    let feed = engine.events(&EventQuery::default()).await.unwrap();
    assert_eq!(feed.len(), sitewatch_core::FEED_PAGE_SIZE);
    assert_eq!(feed[0].created_at, t0 + Duration::seconds(59));
}

// ── Concurrency ─────────────────────────────────────────────────────

async fn assert_rollups_match_devices(engine: &HealthEngine) {
    let repo = engine.repository();
    for site in repo.sites().await.unwrap() {
        let devices = repo.devices_for_site(site.id).await.unwrap();
        assert_eq!(
            site.normalized_status,
            rollup_statuses(devices.iter().map(|d| d.normalized_status)),
            "stale rollup for {}",
            site.external_site_id
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_hosts_on_different_sites() {
    let engine = Arc::new(engine());
    let mut tasks = Vec::new();
    for site in 0..64 {
        for device in 0..4 {
            let engine = Arc::clone(&engine);
            tasks.push(tokio::spawn(async move {
                let status = if (site + device) % 3 == 0 { "offline" } else { "online" };
                let mut obs =
                    Observation::new(format!("site-{site}"), format!("site-{site}-dev-{device}"))
                        .with_status(status);
                if device == 0 {
                    obs = obs.primary();
                }
                engine.apply_observation(obs).await
            }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let repo = engine.repository();
    assert_eq!(repo.primary_hosts().await.unwrap().len(), 64);
    assert_eq!(repo.sites().await.unwrap().len(), 64);
    for site in repo.sites().await.unwrap() {
        assert_eq!(repo.devices_for_site(site.id).await.unwrap().len(), 4);
    }
    assert_rollups_match_devices(&engine).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn devices_bouncing_between_sites_leave_both_rollups_current() {
    let engine = Arc::new(engine());
    for site in ["a", "b"] {
        engine
            .apply_observation(Observation::new(site, format!("{site}-anchor")).with_status("online"))
            .await
            .unwrap();
    }

    let mut tasks = Vec::new();
    for round in 0..40 {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            let site = if round % 2 == 0 { "a" } else { "b" };
            let status = if round % 5 == 0 { "online" } else { "offline" };
            engine
                .apply_observation(
                    Observation::new(site, format!("roamer-{}", round % 6)).with_status(status),
                )
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let repo = engine.repository();
    let a = repo.find_site_by_external_id("a").await.unwrap().unwrap();
    let b = repo.find_site_by_external_id("b").await.unwrap().unwrap();
    let total = repo.devices_for_site(a.id).await.unwrap().len()
        + repo.devices_for_site(b.id).await.unwrap().len();
    assert_eq!(total, 8);
    assert_rollups_match_devices(&engine).await;
}
