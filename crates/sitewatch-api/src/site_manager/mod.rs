mod client;
mod types;

pub use client::{DEFAULT_BASE_URL, SiteManagerClient};
pub use types::{DevicesResponse, HostDevices, SiteManagerDevice};
