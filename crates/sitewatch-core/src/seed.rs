// ── Demo fixture ──
//
// Four sites, one primary host each (one per status), and five events
// covering every severity. Used by `--demo` and by tests that need a
// populated store without a vendor API.

use chrono::{Duration, Utc};
use tracing::info;

use crate::aggregate::rollup_statuses;
use crate::classify::classify;
use crate::error::CoreResult;
use crate::model::{Device, DeviceId, EventKind, HealthStatus, Site, TestAlertKind, WanLink};
use crate::store::HealthRepository;

/// What [`load_demo`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoSummary {
    pub sites: usize,
    pub devices: usize,
    pub events: usize,
}

struct DemoHost {
    site_ext: &'static str,
    site_name: &'static str,
    device_ext: &'static str,
    device_name: &'static str,
    ip: [u8; 4],
    status: HealthStatus,
    wan1: HealthStatus,
    wan2: HealthStatus,
}

const HOSTS: [DemoHost; 4] = [
    DemoHost {
        site_ext: "site-abgi-bh",
        site_name: "ABGI BH",
        device_ext: "abgi-bh-console",
        device_name: "ABGI BH - UCK G2 Plus",
        ip: [192, 168, 0, 16],
        status: HealthStatus::Online,
        wan1: HealthStatus::Online,
        wan2: HealthStatus::Online,
    },
    DemoHost {
        site_ext: "site-clinica-duo",
        site_name: "CLINICA DUO",
        device_ext: "clinica-duo-udm-pro",
        device_name: "CLINICA DUO - UDM Pro",
        ip: [192, 168, 15, 2],
        status: HealthStatus::Offline,
        wan1: HealthStatus::Offline,
        wan2: HealthStatus::Online,
    },
    DemoHost {
        site_ext: "site-hype-tecno",
        site_name: "HYPE TECNOLOGIA",
        device_ext: "hype-tec-main",
        device_name: "HYPE TECNOLOGIA - Main Host",
        ip: [10, 0, 0, 10],
        status: HealthStatus::Unstable,
        wan1: HealthStatus::Online,
        wan2: HealthStatus::Offline,
    },
    DemoHost {
        site_ext: "site-grupo-minerar",
        site_name: "GRUPO MINERAR",
        device_ext: "miner-main",
        device_name: "GRUPO MINERAR - Main Host",
        ip: [10, 0, 1, 5],
        status: HealthStatus::Unknown,
        wan1: HealthStatus::Unknown,
        wan2: HealthStatus::Unknown,
    },
];

/// Populate `repo` with the demo fleet.
pub async fn load_demo(repo: &dyn HealthRepository) -> CoreResult<DemoSummary> {
    let now = Utc::now();
    let mut placed: Vec<(Site, Device)> = Vec::with_capacity(HOSTS.len());

    for host in &HOSTS {
        let mut site = Site::new(host.site_ext, host.site_name);
        site.normalized_status = rollup_statuses([host.status]);
        site.updated_at = now;

        let device = Device {
            id: DeviceId::new(),
            external_device_id: host.device_ext.to_owned(),
            site_id: site.id,
            name: Some(host.device_name.to_owned()),
            model_type: Some("UniFi Console".to_owned()),
            ip_address: Some(host.ip.into()),
            vendor: "unifi".to_owned(),
            raw_status: Some(host.status.to_string()),
            normalized_status: host.status,
            is_primary_host: true,
            wan1_status: host.wan1,
            wan2_status: host.wan2,
            last_seen_at: Some(now),
        };

        repo.upsert_site(site.clone()).await?;
        repo.upsert_device_status(device.clone()).await?;
        placed.push((site, device));
    }

    // (host index, kind), oldest first.
    let events = [
        (
            0,
            EventKind::TestAlert {
                alert: TestAlertKind::HostOffline,
            },
        ),
        (
            2,
            EventKind::TestAlert {
                alert: TestAlertKind::HostOffline,
            },
        ),
        (
            1,
            EventKind::StatusChange {
                from: HealthStatus::Online,
                to: HealthStatus::Offline,
            },
        ),
        (
            2,
            EventKind::WanStatusChange {
                link: WanLink::Wan2,
                from: HealthStatus::Online,
                to: HealthStatus::Offline,
                other: HealthStatus::Online,
            },
        ),
        (0, EventKind::Sync),
    ];

    let count = events.len();
    let oldest = now - Duration::minutes(i64::try_from(count).unwrap_or(0));
    for (offset, (host, kind)) in (0_i64..).zip(events) {
        let Some((site, device)) = placed.get(host) else {
            continue;
        };
        let at = oldest + Duration::minutes(offset);
        repo.append_event(classify(kind, device, site, at)).await?;
    }

    let summary = DemoSummary {
        sites: placed.len(),
        devices: placed.len(),
        events: count,
    };
    info!(
        sites = summary.sites,
        devices = summary.devices,
        events = summary.events,
        "demo fleet loaded"
    );
    Ok(summary)
}
