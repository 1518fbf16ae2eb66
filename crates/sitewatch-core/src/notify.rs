// ── Alert notification ──

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CoreResult;
use crate::model::{DeviceEvent, Severity};

/// Outcome of handing an alert to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "delivery", rename_all = "snake_case")]
pub enum Delivery {
    /// No outbound channel exists; the alert was only logged.
    Simulated,
}

impl Delivery {
    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated)
    }
}

/// Sends alerts somewhere a human will see them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &DeviceEvent, site_name: &str) -> CoreResult<Delivery>;
}

/// Logs alerts through `tracing` and reports them as simulated.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier {
    /// Recipient the alert would have gone to, for the log line.
    pub recipient: Option<String>,
}

impl TracingNotifier {
    pub fn new(recipient: Option<String>) -> Self {
        Self { recipient }
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, event: &DeviceEvent, site_name: &str) -> CoreResult<Delivery> {
        let recipient = self.recipient.as_deref().unwrap_or("<unconfigured>");
        match event.severity {
            Severity::Critical => warn!(
                site = site_name,
                recipient,
                title = %event.title,
                severity = %event.severity,
                "alert (simulated send)"
            ),
            Severity::Warning | Severity::Info => info!(
                site = site_name,
                recipient,
                title = %event.title,
                severity = %event.severity,
                "alert (simulated send)"
            ),
        }
        Ok(Delivery::Simulated)
    }
}
