//! Command-line surface of `sitewatch`.

use clap::{Args, Parser, Subcommand, ValueEnum};

use sitewatch_core::{SeverityFilter, StatusFilter, TestAlertKind};

/// sitewatch -- fleet health for UniFi sites
#[derive(Debug, Parser)]
#[command(
    name = "sitewatch",
    version,
    about = "Monitor UniFi site health from the command line",
    long_about = "Polls the UniFi Site Manager API, normalizes device status into\n\
        ONLINE / OFFLINE / UNSTABLE / UNKNOWN, rolls it up per host, and\n\
        classifies status changes into a severity-tagged event feed.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Flags shared by every subcommand ────────────────────────────────

#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOpts {
    /// Named profile from the config file
    #[arg(long, short = 'p', env = "SITEWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Site Manager API URL (overrides profile)
    #[arg(long, env = "SITEWATCH_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Site Manager API key
    #[arg(long, env = "SITEWATCH_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Use the built-in demo fleet instead of the Site Manager API
    #[arg(long, global = true)]
    pub demo: bool,

    /// Output format
    #[arg(long, short = 'o', env = "SITEWATCH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Colorize status and severity labels
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Print nothing on success
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept any TLS certificate
    #[arg(long, short = 'k', env = "SITEWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Give up on a Site Manager request after this many seconds
    #[arg(long, env = "SITEWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Presentation ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Pretty-printed JSON
    Json,
    /// JSON on a single line
    JsonCompact,
    /// YAML
    Yaml,
    /// One identifier per line
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal
    Auto,
    /// Color even when piped
    Always,
    /// No ANSI escapes
    Never,
}

// ── Subcommands ─────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List primary hosts with their rolled-up status
    #[command(alias = "h")]
    Hosts(HostsArgs),

    /// Fleet summary counts by status
    Stats,

    /// Show the event feed, newest first
    #[command(alias = "ev")]
    Events(EventsArgs),

    /// Poll the Site Manager API once and apply the result
    Sync,

    /// Poll the Site Manager API repeatedly until interrupted
    Watch(WatchArgs),

    /// Trigger a manual test alert for a site
    Alert(AlertArgs),

    /// Check Site Manager API credentials and reachability
    TestConnection,

    /// Manage configuration
    Config(ConfigArgs),

    /// Print a shell completion script
    Completions(CompletionsArgs),
}

// ── Hosts / Events ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HostsArgs {
    /// Filter by overall status (ALL, ONLINE, OFFLINE, UNSTABLE, UNKNOWN)
    #[arg(long, short = 's', default_value = "ALL")]
    pub status: StatusFilter,
}

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Filter by severity (ALL, CRITICAL, WARNING, INFO)
    #[arg(long, short = 's', default_value = "ALL")]
    pub severity: SeverityFilter,

    /// Only events from primary hosts
    #[arg(long)]
    pub primary_only: bool,

    /// Max events to show (1 to the feed page size)
    #[arg(long, short = 'l', value_parser = parse_limit)]
    pub limit: Option<usize>,
}

fn parse_limit(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Time between polls (e.g. "30s", "5m"); defaults to the configured interval
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    pub interval: Option<std::time::Duration>,
}

// ── Alert ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AlertArgs {
    /// Site name, external id, or internal id
    pub site: String,

    /// Condition to simulate
    #[arg(long, short = 't', default_value = "host-offline", value_parser = parse_alert_kind)]
    pub kind: TestAlertKind,
}

fn parse_alert_kind(value: &str) -> Result<TestAlertKind, String> {
    value
        .parse()
        .map_err(|_| format!("expected one of: host-offline, wan1-down, wan2-down (got '{value}')"))
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup of a first profile
    Init,

    /// Print the effective configuration with secrets masked
    Show,

    /// Print the config file path
    Path,

    /// List profile names, marking the default with *
    Profiles,

    /// Make a profile the default
    Use {
        /// Existing profile name
        name: String,
    },

    /// Store the active profile's API key in the system keyring
    SetKey,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filters_parse_from_flags() {
        let cli = Cli::parse_from(["sitewatch", "--demo", "hosts", "--status", "offline"]);
        let Command::Hosts(args) = cli.command else {
            panic!("expected hosts command");
        };
        assert!(cli.global.demo);
        assert_eq!(
            args.status,
            StatusFilter::Only(sitewatch_core::HealthStatus::Offline)
        );
    }

    #[test]
    fn alert_kind_parses() {
        let cli = Cli::parse_from(["sitewatch", "alert", "ABGI BH", "--kind", "wan2-down"]);
        let Command::Alert(args) = cli.command else {
            panic!("expected alert command");
        };
        assert_eq!(args.kind, TestAlertKind::Wan2Down);
        assert_eq!(args.site, "ABGI BH");
    }
}
