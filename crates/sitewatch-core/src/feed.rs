// ── Event feed queries ──

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::filter::SeverityFilter;
use crate::model::{DeviceEvent, DeviceId};

/// Hard cap on events returned by a single feed query.
pub const FEED_PAGE_SIZE: usize = 50;

/// Feed query: severity filter, primary-host restriction, page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    pub severity: SeverityFilter,
    /// Only events whose device is a primary host.
    pub primary_only: bool,
    /// Requested page size, capped at `FEED_PAGE_SIZE`. Zero yields an
    /// empty page.
    pub limit: usize,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            severity: SeverityFilter::All,
            primary_only: false,
            limit: FEED_PAGE_SIZE,
        }
    }
}

impl EventQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit.min(FEED_PAGE_SIZE)
    }

    pub fn matches(&self, event: &DeviceEvent, is_primary_host: bool) -> bool {
        self.severity.matches(event) && (!self.primary_only || is_primary_host)
    }
}

/// Feed order: newest first, later insertion first on equal timestamps.
pub fn newest_first(a: &DeviceEvent, b: &DeviceEvent) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Run `query` over `events`.
///
/// `is_primary` answers whether a device is currently a primary host.
pub fn select<'a, I, F>(events: I, query: &EventQuery, is_primary: F) -> Vec<DeviceEvent>
where
    I: IntoIterator<Item = &'a DeviceEvent>,
    F: Fn(&DeviceId) -> bool,
{
    let mut matched: Vec<DeviceEvent> = events
        .into_iter()
        .filter(|e| query.matches(e, is_primary(&e.device_id)))
        .cloned()
        .collect();
    matched.sort_by(newest_first);
    matched.truncate(query.effective_limit());
    matched
}
