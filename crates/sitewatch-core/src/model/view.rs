// ── Presentation records ──
//
// Flat, JSON-friendly rows handed to dashboards and the CLI. Built by the
// engine from devices, sites, and events; carry no behavior.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::event::Severity;
use super::ids::{DeviceId, EventId};
use super::status::HealthStatus;

/// One row of the host list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSummary {
    pub id: DeviceId,
    pub site_name: String,
    pub host_name: String,
    pub ip_address: Option<IpAddr>,
    /// The host device's own normalized status.
    pub status: HealthStatus,
    /// Rollup over every device in the host's site.
    pub overall_status: HealthStatus,
    pub wan1_status: HealthStatus,
    pub wan2_status: HealthStatus,
    /// Rollup of the host status and its two WAN links.
    pub wan_health: HealthStatus,
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// One row of the event feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub id: EventId,
    pub site_name: String,
    pub device_name: String,
    pub severity: Severity,
    pub title: String,
    pub message: Option<String>,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
    pub is_primary_host: bool,
}
