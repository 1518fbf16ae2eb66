//! Continuous polling handler.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use sitewatch_core::{DeviceEvent, SyncReport};

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::Session;

/// Lower bound on the poll interval.
const MIN_INTERVAL: Duration = Duration::from_secs(10);

fn event_line(e: &DeviceEvent, format: OutputFormat, color: bool) -> String {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            serde_json::to_string(e).unwrap_or_else(|err| format!("serialization failed: {err}"))
        }
        OutputFormat::Plain => e.id.to_string(),
        OutputFormat::Table | OutputFormat::Yaml => {
            let mut line = format!(
                "{} {} {}",
                e.created_at.format("%H:%M:%S"),
                output::paint_severity(e.severity, color),
                e.title
            );
            if let Some(ref msg) = e.message {
                line.push_str(" - ");
                line.push_str(msg);
            }
            line
        }
    }
}

fn print_report(session: &Session, report: &SyncReport) {
    for e in &report.events {
        session.print(&event_line(e, session.format, session.color));
    }
}

pub async fn handle(session: &Session, args: &WatchArgs) -> Result<(), CliError> {
    session.require_client("watch")?;
    let every = args
        .interval
        .unwrap_or_else(|| Duration::from_secs(session.config.defaults.poll_interval))
        .max(MIN_INTERVAL);

    // The first poll establishes the baseline and must succeed.
    let baseline = session.refresh().await?;
    let stats = session.engine.fleet_stats().await?;
    if !session.quiet {
        eprintln!(
            "Watching {} hosts ({} online), polling every {}. Ctrl-C to stop.",
            stats.total_hosts,
            stats.online,
            humantime::format_duration(every)
        );
    }
    print_report(session, &baseline);

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match session.refresh().await {
                    Ok(report) => print_report(session, &report),
                    Err(e) => warn!(error = %e, at = %Utc::now(), "poll failed, retrying next tick"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping watch");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sitewatch_core::{DeviceId, EventId, EventKind, Severity, SiteId};

    fn event() -> DeviceEvent {
        DeviceEvent {
            id: EventId::new(7),
            device_id: DeviceId::new(),
            site_id: SiteId::new(),
            kind: EventKind::Sync,
            severity: Severity::Info,
            title: "Synced".into(),
            message: Some("edge-1".into()),
            raw_payload: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn lines_follow_output_format() {
        let e = event();
        assert_eq!(event_line(&e, OutputFormat::Plain, false), "7");
        let text = event_line(&e, OutputFormat::Table, false);
        assert!(text.ends_with("INFO Synced - edge-1"));
        let json: serde_json::Value =
            serde_json::from_str(&event_line(&e, OutputFormat::JsonCompact, false)).unwrap();
        assert_eq!(json["severity"], "INFO");
    }
}
