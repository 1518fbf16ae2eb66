// ── Device event domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::device::WanLink;
use super::ids::{DeviceId, EventId, SiteId};
use super::status::HealthStatus;

/// Severity tag of a [`DeviceEvent`]. Fixed by the event kind, see
/// [`crate::classify`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Manually triggered alert used to verify the notification path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum TestAlertKind {
    #[strum(to_string = "host-offline")]
    HostOffline,
    #[strum(to_string = "wan1-down")]
    Wan1Down,
    #[strum(to_string = "wan2-down")]
    Wan2Down,
}

impl TestAlertKind {
    /// Marker used in test-alert titles, e.g. `HOST_OFFLINE_TEST`.
    pub fn code(self) -> &'static str {
        match self {
            Self::HostOffline => "HOST_OFFLINE_TEST",
            Self::Wan1Down => "WAN1_DOWN_TEST",
            Self::Wan2Down => "WAN2_DOWN_TEST",
        }
    }

    /// Human label of the condition being simulated.
    pub fn label(self) -> &'static str {
        match self {
            Self::HostOffline => "Host Offline",
            Self::Wan1Down => "WAN 1 Down",
            Self::Wan2Down => "WAN 2 Down",
        }
    }
}

/// What happened. A closed set: every variant has exactly one severity
/// in the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The device's own normalized status moved from `from` to `to`.
    StatusChange {
        from: HealthStatus,
        to: HealthStatus,
    },
    /// One WAN link changed; `other` is the sibling link's status at the
    /// same observation.
    WanStatusChange {
        link: WanLink,
        from: HealthStatus,
        to: HealthStatus,
        other: HealthStatus,
    },
    /// Manually triggered test alert.
    TestAlert { alert: TestAlertKind },
    /// Routine confirmation that a device was synchronized.
    Sync,
}

impl EventKind {
    /// Wire tag stored as the event type.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::StatusChange { .. } => "status_change",
            Self::WanStatusChange { .. } => "wan_status_change",
            Self::TestAlert { .. } => "test_alert",
            Self::Sync => "sync",
        }
    }
}

/// An event as produced by the classifier, before the repository has
/// assigned it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeviceEvent {
    pub device_id: DeviceId,
    pub site_id: SiteId,
    pub kind: EventKind,
    pub severity: Severity,
    pub title: String,
    pub message: Option<String>,
    /// Opaque payload kept for diagnostic replay.
    pub raw_payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Immutable, append-only record of something that happened to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEvent {
    pub id: EventId,
    pub device_id: DeviceId,
    pub site_id: SiteId,
    pub kind: EventKind,
    pub severity: Severity,
    pub title: String,
    pub message: Option<String>,
    pub raw_payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl DeviceEvent {
    /// Seal a classified event with its repository-assigned id.
    pub fn from_new(id: EventId, event: NewDeviceEvent) -> Self {
        Self {
            id,
            device_id: event.device_id,
            site_id: event.site_id,
            kind: event.kind,
            severity: event.severity,
            title: event.title,
            message: event.message,
            raw_payload: event.raw_payload,
            created_at: event.created_at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.tag()
    }
}
