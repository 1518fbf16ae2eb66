//! Event feed handler.

use tabled::Tabled;

use sitewatch_core::EventEntry;

use crate::cli::EventsArgs;
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Event")]
    title: String,
}

fn row(e: &EventEntry, color: bool) -> EventRow {
    let marker = if e.is_primary_host { " *" } else { "" };
    EventRow {
        time: e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        severity: output::paint_severity(e.severity, color),
        site: e.site_name.clone(),
        device: format!("{}{marker}", e.device_name),
        title: match e.message {
            Some(ref msg) => format!("{}\n{msg}", e.title),
            None => e.title.clone(),
        },
    }
}

pub async fn handle(session: &Session, args: &EventsArgs) -> Result<(), CliError> {
    session.refresh().await?;
    let mut query = session.engine.event_query(args.severity, args.primary_only);
    if let Some(limit) = args.limit {
        query.limit = limit;
    }
    let events = session.engine.events(&query).await?;
    let out = output::render_list(
        session.format,
        &events,
        |e| row(e, session.color),
        |e| e.id.to_string(),
    );
    session.print(&out);
    Ok(())
}
