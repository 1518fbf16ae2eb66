// ── Fleet statistics ──

use serde::{Deserialize, Serialize};

use crate::model::{HealthStatus, HostSummary, StatusCounts};

/// Host counts by overall status, for the dashboard summary.
///
/// `total == online + offline + unstable + unknown` by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStats {
    pub total_hosts: usize,
    pub online: usize,
    pub offline: usize,
    pub unstable: usize,
    pub unknown: usize,
}

impl FleetStats {
    /// Tally the overall status of each host.
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        Self::from(StatusCounts::tally(statuses))
    }

    pub fn from_hosts(hosts: &[HostSummary]) -> Self {
        Self::from_statuses(hosts.iter().map(|h| h.overall_status))
    }

    pub fn count(&self, status: HealthStatus) -> usize {
        match status {
            HealthStatus::Online => self.online,
            HealthStatus::Offline => self.offline,
            HealthStatus::Unstable => self.unstable,
            HealthStatus::Unknown => self.unknown,
        }
    }

    /// Share of hosts that are fully online, in percent (0 when empty).
    pub fn online_percent(&self) -> u8 {
        if self.total_hosts == 0 {
            return 0;
        }
        let pct = (self.online * 100 + self.total_hosts / 2) / self.total_hosts;
        u8::try_from(pct).unwrap_or(100)
    }
}

impl From<StatusCounts> for FleetStats {
    fn from(c: StatusCounts) -> Self {
        Self {
            total_hosts: c.total(),
            online: c.online,
            offline: c.offline,
            unstable: c.unstable,
            unknown: c.unknown,
        }
    }
}
