// ── Inbound observation ──
//
// One status reading for one device, as delivered by a polling
// collaborator. Nothing here is normalized yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub external_site_id: String,
    pub site_name: Option<String>,
    pub external_device_id: String,
    pub device_name: Option<String>,
    pub model_type: Option<String>,
    pub ip_address: Option<IpAddr>,
    pub vendor: Option<String>,
    /// Whether the source considers this device its site's primary host.
    pub is_primary_host: bool,
    pub raw_status: Option<String>,
    pub raw_wan1_status: Option<String>,
    pub raw_wan2_status: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub raw_payload: Option<serde_json::Value>,
}

impl Observation {
    /// Bare observation for a device; descriptive fields start empty.
    pub fn new(external_site_id: impl Into<String>, external_device_id: impl Into<String>) -> Self {
        Self {
            external_site_id: external_site_id.into(),
            site_name: None,
            external_device_id: external_device_id.into(),
            device_name: None,
            model_type: None,
            ip_address: None,
            vendor: None,
            is_primary_host: false,
            raw_status: None,
            raw_wan1_status: None,
            raw_wan2_status: None,
            observed_at: Utc::now(),
            raw_payload: None,
        }
    }

    pub fn with_status(mut self, raw: impl Into<String>) -> Self {
        self.raw_status = Some(raw.into());
        self
    }

    pub fn with_wan(mut self, wan1: Option<&str>, wan2: Option<&str>) -> Self {
        self.raw_wan1_status = wan1.map(str::to_owned);
        self.raw_wan2_status = wan2.map(str::to_owned);
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary_host = true;
        self
    }

    pub fn at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = observed_at;
        self
    }
}
