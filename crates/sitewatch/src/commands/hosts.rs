//! Host list handler.

use chrono::Utc;
use tabled::Tabled;

use sitewatch_core::HostSummary;

use crate::cli::HostsArgs;
use crate::error::CliError;
use crate::output;

use super::Session;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "WAN 1")]
    wan1: String,
    #[tabled(rename = "WAN 2")]
    wan2: String,
    #[tabled(rename = "WAN Health")]
    wan_health: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

fn row(h: &HostSummary, color: bool) -> HostRow {
    let now = Utc::now();
    HostRow {
        host: h.host_name.clone(),
        site: h.site_name.clone(),
        ip: h.ip_address.map_or_else(|| "-".into(), |ip| ip.to_string()),
        status: output::paint_status(h.overall_status, color),
        wan1: output::paint_status(h.wan1_status, color),
        wan2: output::paint_status(h.wan2_status, color),
        wan_health: output::paint_status(h.wan_health, color),
        last_seen: output::time_ago(h.last_seen_at, now),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: &HostsArgs) -> Result<(), CliError> {
    session.refresh().await?;
    let hosts = session.engine.hosts(args.status).await?;
    let out = output::render_list(
        session.format,
        &hosts,
        |h| row(h, session.color),
        |h| h.id.to_string(),
    );
    session.print(&out);
    Ok(())
}
