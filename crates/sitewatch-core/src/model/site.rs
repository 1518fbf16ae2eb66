// ── Site domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::SiteId;
use super::status::HealthStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: SiteId,
    /// Identifier assigned by the vendor API (the Site Manager host id).
    pub external_site_id: String,
    /// Human-friendly display name.
    pub name: String,
    pub is_active: bool,
    /// Cached rollup of every device in the site. Rebuilt from the devices
    /// on each write; never treated as a source of truth.
    pub normalized_status: HealthStatus,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    pub fn new(external_site_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: SiteId::new(),
            external_site_id: external_site_id.into(),
            name: name.into(),
            is_active: true,
            normalized_status: HealthStatus::Unknown,
            updated_at: Utc::now(),
        }
    }
}
