// ── Filter predicates ──
//
// Shared by every presentation surface so hosts and events are narrowed
// the same way everywhere. Pure, no state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{DeviceEvent, HealthStatus, HostSummary, Severity};

/// Host list filter on overall status. Parses `ALL` or a status name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(HealthStatus),
}

impl StatusFilter {
    pub fn matches(&self, host: &HostSummary) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => host.overall_status == *status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<HealthStatus>()
            .map(Self::Only)
            .map_err(|_| FilterParseError {
                field: "status",
                value: s.to_owned(),
                expected: "ALL, ONLINE, OFFLINE, UNSTABLE, UNKNOWN",
            })
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(status) => write!(f, "{status}"),
        }
    }
}

/// Event feed filter on severity. Parses `ALL` or a severity name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeverityFilter {
    #[default]
    All,
    Only(Severity),
}

impl SeverityFilter {
    pub fn matches(&self, event: &DeviceEvent) -> bool {
        match self {
            Self::All => true,
            Self::Only(severity) => event.severity == *severity,
        }
    }
}

impl FromStr for SeverityFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<Severity>()
            .map(Self::Only)
            .map_err(|_| FilterParseError {
                field: "severity",
                value: s.to_owned(),
                expected: "ALL, CRITICAL, WARNING, INFO",
            })
    }
}

impl fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(severity) => write!(f, "{severity}"),
        }
    }
}

/// A filter string that names no known value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field} filter '{value}' (expected one of: {expected})")]
pub struct FilterParseError {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Keep the hosts matching `filter`, preserving order.
pub fn filter_hosts<I>(hosts: I, filter: StatusFilter) -> Vec<HostSummary>
where
    I: IntoIterator<Item = HostSummary>,
{
    hosts.into_iter().filter(|h| filter.matches(h)).collect()
}
