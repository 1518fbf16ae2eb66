//! Device health engine between `sitewatch-api` and its consumers (CLI,
//! dashboards).
//!
//! - **Normalization** ([`normalize`]) maps free-form vendor status strings
//!   onto the four-value [`HealthStatus`] taxonomy.
//!
//! - **Aggregation** ([`aggregate`], [`stats`]) rolls device statuses up to
//!   a per-host overall status and tallies fleet-wide counts.
//!
//! - **Classification** ([`classify`]) turns status transitions into
//!   severity-tagged [`DeviceEvent`]s using a closed lookup table.
//!
//! - **[`HealthEngine`]** runs the write path (observation in, rollups and
//!   events out) and serves the host list and event feed. Storage sits
//!   behind the [`HealthRepository`] trait: [`MemoryStore`] for a single
//!   process, [`FileStore`] for state kept in a JSON file between runs.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod filter;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod notify;
pub mod seed;
pub mod stats;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{EngineConfig, PrimaryHostPolicy, SiteManagerConfig};
pub use engine::{ApplyOutcome, HealthEngine, Rejection, SyncReport, TestAlertOutcome};
pub use error::{CoreError, CoreResult};
pub use feed::{EventQuery, FEED_PAGE_SIZE};
pub use filter::{SeverityFilter, StatusFilter};
pub use notify::{Delivery, Notifier, TracingNotifier};
pub use stats::FleetStats;
pub use store::{FileStore, HealthRepository, MemoryStore};

pub use model::{
    Device, DeviceEvent, DeviceId, EventEntry, EventId, EventKind, HealthStatus, HostSummary,
    NewDeviceEvent, Observation, Severity, Site, SiteId, TestAlertKind, WanLink,
};
