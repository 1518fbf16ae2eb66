// ── Domain model ──
//
// Sites own devices, devices own events. Everything a consumer (CLI,
// dashboard) sees is expressed in these types; vendor response shapes
// stay in `sitewatch-api`.

pub mod device;
pub mod event;
pub mod ids;
pub mod observation;
pub mod site;
pub mod status;
pub mod view;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::{Device, WanLink};
pub use event::{DeviceEvent, EventKind, NewDeviceEvent, Severity, TestAlertKind};
pub use ids::{DeviceId, EventId, SiteId};
pub use observation::Observation;
pub use site::Site;
pub use status::{HealthStatus, StatusCounts};
pub use view::{EventEntry, HostSummary};
