//! Credential and reachability check.

use serde::Serialize;

use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionReport {
    url: String,
    hosts: usize,
    devices: usize,
}

pub async fn handle(session: &Session) -> Result<(), CliError> {
    let client = session.require_client("test-connection")?;
    let hosts = client
        .list_devices()
        .await
        .map_err(sitewatch_core::CoreError::from)?;
    let report = ConnectionReport {
        url: client.base_url().to_string(),
        hosts: hosts.len(),
        devices: hosts.iter().map(|h| h.devices.len()).sum(),
    };
    let out = output::render_single(
        session.format,
        &report,
        |r| {
            format!(
                "✓ Connected to {}\n  {} hosts, {} devices visible to this key",
                r.url, r.hosts, r.devices
            )
        },
        |r| r.url.clone(),
    );
    session.print(&out);
    Ok(())
}
