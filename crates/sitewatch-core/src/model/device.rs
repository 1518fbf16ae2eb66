// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use strum::{Display, EnumIter};

use super::ids::{DeviceId, SiteId};
use super::status::HealthStatus;

/// One of the two independent WAN uplinks a gateway reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WanLink {
    #[strum(to_string = "WAN 1")]
    Wan1,
    #[strum(to_string = "WAN 2")]
    Wan2,
}

impl WanLink {
    /// The sibling link.
    pub fn other(self) -> Self {
        match self {
            Self::Wan1 => Self::Wan2,
            Self::Wan2 => Self::Wan1,
        }
    }

    /// "Primary" / "Secondary", as used in event messages.
    pub fn role(self) -> &'static str {
        match self {
            Self::Wan1 => "Primary",
            Self::Wan2 => "Secondary",
        }
    }
}

/// A monitored device, owned by exactly one [`Site`](super::Site).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    pub external_device_id: String,
    pub site_id: SiteId,
    pub name: Option<String>,
    pub model_type: Option<String>,
    pub ip_address: Option<IpAddr>,
    pub vendor: String,

    /// Status string exactly as the vendor reported it.
    pub raw_status: Option<String>,
    /// Cached normalization of `raw_status`.
    pub normalized_status: HealthStatus,

    /// Marks the device that stands for its site in host-centric views.
    pub is_primary_host: bool,

    pub wan1_status: HealthStatus,
    pub wan2_status: HealthStatus,

    /// Time of the last successful status observation.
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl Device {
    /// Display name, falling back to the vendor identifier.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.external_device_id)
    }

    pub fn wan_status(&self, link: WanLink) -> HealthStatus {
        match link {
            WanLink::Wan1 => self.wan1_status,
            WanLink::Wan2 => self.wan2_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: Option<&str>) -> Device {
        Device {
            id: DeviceId::new(),
            external_device_id: "clinica-duo-udm-pro".into(),
            site_id: SiteId::new(),
            name: name.map(str::to_owned),
            model_type: None,
            ip_address: None,
            vendor: "unifi".into(),
            raw_status: None,
            normalized_status: HealthStatus::Unknown,
            is_primary_host: false,
            wan1_status: HealthStatus::Online,
            wan2_status: HealthStatus::Offline,
            last_seen_at: None,
        }
    }

    #[test]
    fn display_name_falls_back_to_external_id() {
        assert_eq!(device(None).display_name(), "clinica-duo-udm-pro");
        assert_eq!(device(Some("  ")).display_name(), "clinica-duo-udm-pro");
        assert_eq!(device(Some("UDM Pro")).display_name(), "UDM Pro");
    }

    #[test]
    fn wan_links_pair_up() {
        let d = device(None);
        assert_eq!(d.wan_status(WanLink::Wan1), HealthStatus::Online);
        assert_eq!(d.wan_status(WanLink::Wan1.other()), HealthStatus::Offline);
        assert_eq!(WanLink::Wan2.to_string(), "WAN 2");
    }
}
