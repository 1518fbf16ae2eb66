// ── Host / site rollup ──
//
// Combines many normalized statuses into one overall status. The rule is
// pessimistic: a host is ONLINE only when every device with a known
// status is ONLINE, and any healthy/unhealthy mix reads as UNSTABLE.
// Unknown devices are ignored as long as at least one device is known.

use crate::model::{HealthStatus, StatusCounts};

/// Overall status for a tally of device statuses.
pub fn rollup(counts: &StatusCounts) -> HealthStatus {
    let StatusCounts {
        online,
        offline,
        unstable,
        unknown,
    } = *counts;

    if counts.known() == 0 && unknown > 0 {
        HealthStatus::Unknown
    } else if online > 0 && offline == 0 && unstable == 0 {
        HealthStatus::Online
    } else if offline > 0 && online == 0 && unstable == 0 {
        HealthStatus::Offline
    } else if (online > 0 && offline > 0) || unstable > 0 {
        HealthStatus::Unstable
    } else {
        HealthStatus::Unknown
    }
}

/// Overall status for an arbitrary collection of statuses.
pub fn rollup_statuses<I>(statuses: I) -> HealthStatus
where
    I: IntoIterator<Item = HealthStatus>,
{
    rollup(&StatusCounts::tally(statuses))
}

/// WAN-only variant: a device's own status combined with its two links.
pub fn wan_rollup(device: HealthStatus, wan1: HealthStatus, wan2: HealthStatus) -> HealthStatus {
    rollup_statuses([device, wan1, wan2])
}
