// ── Health taxonomy ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Normalized health of a device, WAN link, host, or site.
///
/// This is the only status vocabulary the engine reasons about. Raw
/// vendor strings are mapped onto it by [`crate::normalize`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum HealthStatus {
    Online,
    Offline,
    Unstable,
    #[default]
    Unknown,
}

impl HealthStatus {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// Whether the status carries information (anything but `Unknown`).
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Per-status tally of a multiset of [`HealthStatus`] values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub online: usize,
    pub offline: usize,
    pub unstable: usize,
    pub unknown: usize,
}

impl StatusCounts {
    /// Count each status in `statuses`.
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        statuses.into_iter().fold(Self::default(), |mut acc, s| {
            acc.record(s);
            acc
        })
    }

    pub fn record(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Online => self.online += 1,
            HealthStatus::Offline => self.offline += 1,
            HealthStatus::Unstable => self.unstable += 1,
            HealthStatus::Unknown => self.unknown += 1,
        }
    }

    /// Number of entries with a known status.
    pub fn known(&self) -> usize {
        self.online + self.offline + self.unstable
    }

    pub fn total(&self) -> usize {
        self.known() + self.unknown
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn serializes_screaming_case() {
        let json = serde_json::to_string(&HealthStatus::Unstable).unwrap();
        assert_eq!(json, "\"UNSTABLE\"");
        assert_eq!(HealthStatus::Offline.to_string(), "OFFLINE");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("online".parse::<HealthStatus>().unwrap(), HealthStatus::Online);
        assert_eq!("Unknown".parse::<HealthStatus>().unwrap(), HealthStatus::Unknown);
        assert!("degraded".parse::<HealthStatus>().is_err());
    }

    #[test]
    fn tally_counts_every_entry() {
        let counts = StatusCounts::tally(HealthStatus::iter().chain([HealthStatus::Online]));
        assert_eq!(counts.online, 2);
        assert_eq!(counts.offline, 1);
        assert_eq!(counts.unstable, 1);
        assert_eq!(counts.unknown, 1);
        assert_eq!(counts.known(), 4);
        assert_eq!(counts.total(), 5);
    }
}
