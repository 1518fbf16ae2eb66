// ── Runtime engine configuration ──
//
// These types describe how the engine behaves and how to reach the
// Site Manager API. They never touch disk; the CLI builds them from the
// on-disk profile and hands them in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use sitewatch_api::{SiteManagerClient, TlsMode, TransportConfig};

use crate::error::CoreResult;

use crate::feed::FEED_PAGE_SIZE;

/// What to do when an observation marks a second device of a site as its
/// primary host.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PrimaryHostPolicy {
    /// Keep the existing primary, store the newcomer as a regular device
    /// and log a warning.
    #[default]
    Flag,
    /// Reject the observation with `CoreError::PrimaryHostConflict`.
    Reject,
}

/// Behavioral knobs of [`HealthEngine`](crate::HealthEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Default page size for event feed queries. Never above
    /// [`FEED_PAGE_SIZE`].
    pub feed_page_size: usize,
    /// Append an INFO `sync` event for every applied observation.
    pub emit_sync_events: bool,
    pub primary_host_policy: PrimaryHostPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feed_page_size: FEED_PAGE_SIZE,
            emit_sync_events: false,
            primary_host_policy: PrimaryHostPolicy::default(),
        }
    }
}

/// Connection settings for the Site Manager API.
#[derive(Debug, Clone)]
pub struct SiteManagerConfig {
    pub url: Url,
    pub api_key: SecretString,
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl SiteManagerConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }

    /// Build an authenticated client. No request is made.
    pub fn client(&self) -> CoreResult<SiteManagerClient> {
        Ok(SiteManagerClient::from_api_key(
            self.url.as_str(),
            &self.api_key,
            &self.transport(),
        )?)
    }
}
