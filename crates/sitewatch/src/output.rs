//! Rendering for `--output`.
//!
//! Structured formats serialize the domain values as-is so scripts see the
//! same field names the JSON API would. Tables are built from per-command
//! row types.

use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use sitewatch_core::{HealthStatus, Severity};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// `auto` colors only an interactive stdout, and honors `NO_COLOR`.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Status label, colored by how urgent it is.
pub fn paint_status(status: HealthStatus, color: bool) -> String {
    let label = status.to_string();
    if !color {
        return label;
    }
    match status {
        HealthStatus::Online => label.green().to_string(),
        HealthStatus::Offline => label.red().bold().to_string(),
        HealthStatus::Unstable => label.yellow().to_string(),
        HealthStatus::Unknown => label.dimmed().to_string(),
    }
}

pub fn paint_severity(severity: Severity, color: bool) -> String {
    let label = severity.to_string();
    if !color {
        return label;
    }
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::Warning => label.yellow().to_string(),
        Severity::Info => label.cyan().to_string(),
    }
}

/// Relative age of a timestamp, e.g. `4m ago`. Seconds are dropped past
/// the first minute.
pub fn time_ago(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = ts else {
        return "never".into();
    };
    let Ok(age) = (now - ts).to_std() else {
        return "just now".into();
    };
    let secs = age.as_secs();
    let rounded = if secs >= 60 { secs - secs % 60 } else { secs };
    if rounded == 0 {
        return "just now".into();
    }
    format!(
        "{} ago",
        humantime::format_duration(std::time::Duration::from_secs(rounded))
    )
}

// ── Lists and single values ─────────────────────────────────────────

/// `to_row` feeds the table view; `id_fn` gives the one-per-line value
/// for `plain`.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Like [`render_list`] for one value. `detail_fn` supplies the
/// human-readable block shown instead of a table.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Writes to stdout unless `--quiet` is set. A closed pipe is ignored.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Encoders ────────────────────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return "(none)".into();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

// Serialization failures surface as text rather than aborting the command.
fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: String,
    }

    #[test]
    fn plain_lists_one_id_per_line() {
        let items = [Item { name: "a" }, Item { name: "b" }];
        let out = render_list(
            OutputFormat::Plain,
            &items,
            |i| Row {
                name: i.name.into(),
            },
            |i| i.name.into(),
        );
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn table_has_header_and_empty_marker() {
        let items = [Item { name: "edge" }];
        let out = render_list(
            OutputFormat::Table,
            &items,
            |i| Row {
                name: i.name.into(),
            },
            |i| i.name.into(),
        );
        assert!(out.contains("Name"));
        assert!(out.contains("edge"));

        let empty: [Item; 0] = [];
        let out = render_list(
            OutputFormat::Table,
            &empty,
            |i| Row {
                name: i.name.into(),
            },
            |i| i.name.into(),
        );
        assert_eq!(out, "(none)");
    }

    #[test]
    fn time_ago_is_coarse() {
        let now = Utc::now();
        assert_eq!(time_ago(None, now), "never");
        assert_eq!(time_ago(Some(now), now), "just now");
        assert_eq!(
            time_ago(Some(now - chrono::Duration::seconds(45)), now),
            "45s ago"
        );
        assert_eq!(
            time_ago(Some(now - chrono::Duration::seconds(125)), now),
            "2m ago"
        );
        assert_eq!(
            time_ago(Some(now + chrono::Duration::seconds(30)), now),
            "just now"
        );
    }

    #[test]
    fn uncolored_status_is_plain_label() {
        assert_eq!(paint_status(HealthStatus::Unstable, false), "UNSTABLE");
        assert_eq!(paint_severity(Severity::Critical, false), "CRITICAL");
    }
}
