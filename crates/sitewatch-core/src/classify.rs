// ── Event classification ──
//
// Severity is a fixed lookup on the event kind:
//
// | kind                 | condition                     | severity |
// |----------------------|-------------------------------|----------|
// | status change        | to OFFLINE                    | CRITICAL |
// |                      | to UNSTABLE / UNKNOWN         | WARNING  |
// |                      | to ONLINE                     | INFO     |
// | WAN status change    | to ONLINE                     | INFO     |
// |                      | down, sibling link ONLINE     | WARNING  |
// |                      | down, sibling link not ONLINE | CRITICAL |
// | test alert           | host offline                  | CRITICAL |
// |                      | WAN 1 / WAN 2 down            | WARNING  |
// | sync                 |                               | INFO     |

use chrono::{DateTime, Utc};

use crate::model::{
    Device, EventKind, HealthStatus, NewDeviceEvent, Severity, Site, TestAlertKind, WanLink,
};

/// Severity of an event kind.
pub fn severity(kind: &EventKind) -> Severity {
    match *kind {
        EventKind::StatusChange { to, .. } => match to {
            HealthStatus::Offline => Severity::Critical,
            HealthStatus::Unstable | HealthStatus::Unknown => Severity::Warning,
            HealthStatus::Online => Severity::Info,
        },
        EventKind::WanStatusChange { to, other, .. } => {
            if to.is_online() {
                Severity::Info
            } else if other.is_online() {
                Severity::Warning
            } else {
                Severity::Critical
            }
        }
        EventKind::TestAlert { alert } => match alert {
            TestAlertKind::HostOffline => Severity::Critical,
            TestAlertKind::Wan1Down | TestAlertKind::Wan2Down => Severity::Warning,
        },
        EventKind::Sync => Severity::Info,
    }
}

/// Compare two states of the same device and list the transitions worth
/// an event. A first-ever observation (`previous == None`) and
/// self-transitions produce nothing.
pub fn detect_transitions(previous: Option<&Device>, current: &Device) -> Vec<EventKind> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let mut kinds = Vec::new();

    if previous.normalized_status != current.normalized_status {
        kinds.push(EventKind::StatusChange {
            from: previous.normalized_status,
            to: current.normalized_status,
        });
    }

    for link in [WanLink::Wan1, WanLink::Wan2] {
        let from = previous.wan_status(link);
        let to = current.wan_status(link);
        if from != to {
            kinds.push(EventKind::WanStatusChange {
                link,
                from,
                to,
                other: current.wan_status(link.other()),
            });
        }
    }

    kinds
}

/// Build a classified event for `device`, ready to append.
pub fn classify(
    kind: EventKind,
    device: &Device,
    site: &Site,
    at: DateTime<Utc>,
) -> NewDeviceEvent {
    NewDeviceEvent {
        device_id: device.id,
        site_id: site.id,
        kind,
        severity: severity(&kind),
        title: title(&kind),
        message: Some(message(&kind, device, site)),
        raw_payload: None,
        created_at: at,
    }
}

fn title(kind: &EventKind) -> String {
    match *kind {
        EventKind::StatusChange { to, .. } => format!("Device status changed to {to}"),
        EventKind::WanStatusChange { link, to, .. } => match to {
            HealthStatus::Online => format!("{link} link restored"),
            HealthStatus::Offline => format!("{link} link down"),
            HealthStatus::Unstable => format!("{link} link unstable"),
            HealthStatus::Unknown => format!("{link} link status unknown"),
        },
        EventKind::TestAlert { alert } => format!("Test Alert: {}", alert.code()),
        EventKind::Sync => "Host synchronized successfully".into(),
    }
}

fn message(kind: &EventKind, device: &Device, site: &Site) -> String {
    let name = device.display_name();
    match *kind {
        EventKind::StatusChange { from, to } => {
            format!("Device {name} at {} changed from {from} to {to}", site.name)
        }
        EventKind::WanStatusChange {
            link, to, other, ..
        } => {
            let sibling = link.other().role();
            if to.is_online() {
                format!("{} WAN link is back ONLINE for {name}.", link.role())
            } else if other.is_online() {
                format!(
                    "{} WAN link is DOWN for {name}. {sibling} WAN remains ONLINE.",
                    link.role()
                )
            } else {
                format!(
                    "{} WAN link is DOWN for {name}. {sibling} WAN is {other}.",
                    link.role()
                )
            }
        }
        EventKind::TestAlert { alert } => format!(
            "Manual test alert ({}) triggered for {} - {name}",
            alert.label(),
            site.name
        ),
        EventKind::Sync => format!(
            "Status and health metrics updated from {} API.",
            vendor_label(&device.vendor)
        ),
    }
}

fn vendor_label(vendor: &str) -> &str {
    if vendor.eq_ignore_ascii_case("unifi") {
        "UniFi"
    } else {
        vendor
    }
}
