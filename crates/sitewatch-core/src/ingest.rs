// ── Site Manager ingestion ──
//
// Turns a `GET /v1/devices` listing into observations. Each console
// (host) becomes one site; each device under it becomes one observation.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use tracing::debug;

use sitewatch_api::{HostDevices, SiteManagerClient, SiteManagerDevice};

use crate::engine::{HealthEngine, SyncReport};
use crate::error::CoreResult;
use crate::model::Observation;

const VENDOR: &str = "unifi";

/// Build one observation per device. The console device (or, failing
/// that, the first device listed) is marked as its site's primary host.
///
/// Devices without any identifier still yield an observation, with an
/// empty device id, so the engine reports them as rejected.
pub fn observations_from_hosts(hosts: &[HostDevices], observed_at: DateTime<Utc>) -> Vec<Observation> {
    hosts
        .iter()
        .flat_map(|host| {
            let primary = host
                .devices
                .iter()
                .position(|d| d.is_console)
                .unwrap_or(0);
            host.devices
                .iter()
                .enumerate()
                .map(move |(idx, device)| observation(host, device, idx == primary, observed_at))
        })
        .collect()
}

fn observation(
    host: &HostDevices,
    device: &SiteManagerDevice,
    is_primary_host: bool,
    observed_at: DateTime<Utc>,
) -> Observation {
    let ip_address = device.ip.as_deref().and_then(|raw| {
        raw.trim()
            .parse::<IpAddr>()
            .inspect_err(|_| debug!(ip = raw, "ignoring unparseable device address"))
            .ok()
    });

    Observation {
        external_site_id: host.host_id.clone(),
        site_name: host.host_name.clone(),
        external_device_id: device.identifier().unwrap_or_default().to_owned(),
        device_name: device.name.clone(),
        model_type: device.model.clone().or_else(|| device.shortname.clone()),
        ip_address,
        vendor: Some(VENDOR.to_owned()),
        is_primary_host,
        raw_status: device.status.clone(),
        raw_wan1_status: device.extra_str("wan1Status").map(str::to_owned),
        raw_wan2_status: device.extra_str("wan2Status").map(str::to_owned),
        observed_at,
        raw_payload: serde_json::to_value(device).ok(),
    }
}

/// Fetch the current listing and apply it as one batch.
pub async fn sync_from_site_manager(
    engine: &HealthEngine,
    client: &SiteManagerClient,
) -> CoreResult<SyncReport> {
    let hosts = client.list_devices().await?;
    debug!(hosts = hosts.len(), "fetched Site Manager listing");
    engine
        .apply_batch(observations_from_hosts(&hosts, Utc::now()))
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn hosts() -> Vec<HostDevices> {
        serde_json::from_value(json!([
            {
                "hostId": "host-clinica",
                "hostName": "CLINICA DUO",
                "devices": [
                    { "id": "sw-1", "name": "Switch", "status": "online" },
                    {
                        "id": "udm-1",
                        "name": "UDM Pro",
                        "model": "UDM Pro",
                        "ip": "10.0.0.1",
                        "status": "online",
                        "isConsole": true,
                        "wan1Status": "online",
                        "wan2Status": "offline"
                    }
                ]
            },
            {
                "hostId": "host-arena",
                "devices": [
                    { "mac": "aa:bb:cc:00:11:22", "status": "offline", "ip": "not-an-ip" },
                    { "status": "online" }
                ]
            }
        ]))
        .unwrap()
    }

    #[test]
    fn console_device_is_primary() {
        let obs = observations_from_hosts(&hosts(), Utc::now());
        assert_eq!(obs.len(), 4);

        let udm = &obs[1];
        assert!(udm.is_primary_host);
        assert!(!obs[0].is_primary_host);
        assert_eq!(udm.external_site_id, "host-clinica");
        assert_eq!(udm.site_name.as_deref(), Some("CLINICA DUO"));
        assert_eq!(udm.ip_address, Some("10.0.0.1".parse().unwrap()));
        assert_eq!(udm.raw_wan1_status.as_deref(), Some("online"));
        assert_eq!(udm.raw_wan2_status.as_deref(), Some("offline"));
    }

    #[test]
    fn first_device_is_primary_without_console() {
        let obs = observations_from_hosts(&hosts(), Utc::now());
        let arena = &obs[2];
        assert!(arena.is_primary_host);
        assert_eq!(arena.external_device_id, "aa:bb:cc:00:11:22");
        assert_eq!(arena.ip_address, None);
        assert!(!obs[3].is_primary_host);
    }

    #[test]
    fn anonymous_device_yields_empty_id() {
        let obs = observations_from_hosts(&hosts(), Utc::now());
        assert_eq!(obs[3].external_device_id, "");
    }
}
