//! Manual test alert handler.

use sitewatch_core::{Delivery, TestAlertOutcome};

use crate::cli::AlertArgs;
use crate::error::CliError;
use crate::output;

use super::Session;

fn detail(o: &TestAlertOutcome) -> String {
    let delivery = match o.delivery {
        Delivery::Simulated => "simulated (logged only)",
    };
    let mut lines = vec![
        format!("Site:     {}", o.site_name),
        format!("Host:     {}", o.host_name),
        format!("Event:    #{} {}", o.event.id, o.event.title),
        format!("Severity: {}", o.event.severity),
    ];
    if let Some(ref msg) = o.event.message {
        lines.push(format!("Message:  {msg}"));
    }
    lines.push(format!("Delivery: {delivery}"));
    lines.join("\n")
}

pub async fn handle(session: &Session, args: &AlertArgs) -> Result<(), CliError> {
    session.refresh().await?;
    let outcome = session
        .engine
        .trigger_test_alert(&args.site, args.kind)
        .await?;
    if session.is_demo() {
        tracing::debug!(event = %outcome.event.id, "test alert recorded in demo store only");
    }
    let out = output::render_single(session.format, &outcome, detail, |o| {
        o.event.id.to_string()
    });
    session.print(&out);
    Ok(())
}
