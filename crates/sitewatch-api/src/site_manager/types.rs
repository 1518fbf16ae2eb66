// Site Manager API response types.
//
// Field names follow the camelCase wire format. Everything the API may
// omit is optional; unknown fields are kept in `extra` so consumers can
// pick up vendor additions without a client release.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope returned by `GET /v1/devices`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesResponse {
    #[serde(default)]
    pub data: Vec<HostDevices>,
    #[serde(default)]
    pub http_status_code: Option<u16>,
    #[serde(default)]
    pub trace_id: Option<String>,
    /// Opaque pagination cursor; absent on the last page.
    #[serde(default)]
    pub next_token: Option<String>,
}

/// One console (host) and the devices adopted under it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDevices {
    pub host_id: String,
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub devices: Vec<SiteManagerDevice>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A device as reported by the Site Manager API.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteManagerDevice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub shortname: Option<String>,
    #[serde(default, alias = "ipAddress")]
    pub ip: Option<String>,
    #[serde(default)]
    pub product_line: Option<String>,
    /// Raw vendor status ("online", "offline", "degraded", ...).
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub is_console: bool,
    #[serde(default)]
    pub is_managed: bool,
    #[serde(default)]
    pub startup_time: Option<String>,
    #[serde(default)]
    pub adoption_time: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SiteManagerDevice {
    /// Stable identifier: the device id, falling back to its MAC.
    pub fn identifier(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.mac.as_deref().filter(|s| !s.trim().is_empty()))
    }

    /// Read an optional string field that is not part of the typed model.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn device_accepts_ip_address_alias() {
        let device: SiteManagerDevice = serde_json::from_value(json!({
            "id": "dev-1",
            "ipAddress": "192.168.0.16",
            "status": "online"
        }))
        .unwrap();
        assert_eq!(device.ip.as_deref(), Some("192.168.0.16"));
        assert_eq!(device.status.as_deref(), Some("online"));
    }

    #[test]
    fn identifier_falls_back_to_mac() {
        let device = SiteManagerDevice {
            id: Some("  ".into()),
            mac: Some("aa:bb:cc:dd:ee:ff".into()),
            ..SiteManagerDevice::default()
        };
        assert_eq!(device.identifier(), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn unknown_fields_land_in_extra() {
        let device: SiteManagerDevice = serde_json::from_value(json!({
            "id": "dev-1",
            "wan1Status": "online",
            "firmwareStatus": "upToDate"
        }))
        .unwrap();
        assert_eq!(device.extra_str("wan1Status"), Some("online"));
        assert_eq!(device.extra_str("wan2Status"), None);
    }
}
