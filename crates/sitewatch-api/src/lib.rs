//! Async client for the UniFi Site Manager API (`api.ui.com`).
//!
//! The Site Manager API reports every console ("host") an account owns,
//! together with the devices adopted under it and their raw vendor status.
//! This crate only speaks HTTP and JSON; normalization and health rollups
//! live in `sitewatch-core`.

pub mod error;
pub mod site_manager;
pub mod transport;

pub use error::Error;
pub use site_manager::{HostDevices, SiteManagerClient, SiteManagerDevice};
pub use transport::{TlsMode, TransportConfig};
