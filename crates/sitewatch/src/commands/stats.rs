//! Fleet summary handler.

use sitewatch_core::FleetStats;

use crate::error::CliError;
use crate::output;

use super::Session;

fn detail(s: &FleetStats) -> String {
    [
        format!("Hosts:    {}", s.total_hosts),
        format!("Online:   {} ({}%)", s.online, s.online_percent()),
        format!("Offline:  {}", s.offline),
        format!("Unstable: {}", s.unstable),
        format!("Unknown:  {}", s.unknown),
    ]
    .join("\n")
}

pub async fn handle(session: &Session) -> Result<(), CliError> {
    session.refresh().await?;
    let stats = session.engine.fleet_stats().await?;
    let out = output::render_single(session.format, &stats, detail, |s| {
        format!(
            "{} {} {} {} {}",
            s.total_hosts, s.online, s.offline, s.unstable, s.unknown
        )
    });
    session.print(&out);
    Ok(())
}
