//! One-shot sync handler.

use std::fmt::Write;

use sitewatch_core::SyncReport;

use crate::error::CliError;
use crate::output;

use super::Session;

fn detail(report: &SyncReport) -> String {
    let mut out = format!(
        "Applied {} observations ({} new devices), {} rejected, {} events",
        report.applied,
        report.created,
        report.rejected.len(),
        report.events.len()
    );
    for r in &report.rejected {
        let _ = write!(
            out,
            "\n  rejected {}/{}: {}",
            r.external_site_id, r.external_device_id, r.reason
        );
    }
    for e in &report.events {
        let _ = write!(out, "\n  [{}] {}", e.severity, e.title);
    }
    out
}

pub async fn handle(session: &Session) -> Result<(), CliError> {
    session.require_client("sync")?;
    let report = session.refresh().await?;
    let out = output::render_single(session.format, &report, detail, |r| {
        format!("{} {} {}", r.applied, r.rejected.len(), r.events.len())
    });
    session.print(&out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitewatch_core::Rejection;

    #[test]
    fn detail_lists_rejections() {
        let report = SyncReport {
            applied: 3,
            created: 1,
            rejected: vec![Rejection {
                external_site_id: "host-1".into(),
                external_device_id: String::new(),
                reason: "device identifier is required".into(),
            }],
            events: Vec::new(),
        };
        let text = detail(&report);
        assert!(text.starts_with("Applied 3 observations (1 new devices), 1 rejected, 0 events"));
        assert!(text.contains("rejected host-1/: device identifier is required"));
    }
}
