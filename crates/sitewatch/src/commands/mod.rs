//! Command dispatch: bridges CLI args -> engine calls -> output formatting.

pub mod alert;
pub mod config_cmd;
pub mod connection;
pub mod events;
pub mod hosts;
pub mod stats;
pub mod sync;
pub mod watch;

use std::sync::Arc;

use tracing::{debug, info};

use sitewatch_api::SiteManagerClient;
use sitewatch_core::{
    FileStore, HealthEngine, HealthRepository, MemoryStore, SyncReport, TracingNotifier,
    ingest::sync_from_site_manager, seed,
};

use crate::cli::{ColorMode, Command, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Everything a data command needs: the engine, where its data comes
/// from, and the resolved presentation settings.
pub struct Session {
    pub engine: HealthEngine,
    /// `None` in demo mode.
    pub client: Option<SiteManagerClient>,
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Session {
    /// Build the engine. Demo mode runs over a seeded in-memory store; live
    /// mode loads the profile's state file and configures a Site Manager
    /// client without calling it yet.
    pub async fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = config::load_config()?;
        let profile_name = config::active_profile_name(global, &config);
        let recipient = config
            .profiles
            .get(&profile_name)
            .and_then(|p| p.alert_email_to.clone());

        let (repo, client): (Arc<dyn HealthRepository>, Option<SiteManagerClient>) = if global.demo {
            let store = MemoryStore::new();
            let summary = seed::load_demo(&store).await?;
            debug!(
                sites = summary.sites,
                devices = summary.devices,
                events = summary.events,
                "loaded demo fleet"
            );
            let repo: Arc<dyn HealthRepository> = Arc::new(store);
            (repo, None)
        } else {
            let sm = config::resolve_site_manager(global, &config)?;
            debug!(url = %sm.url, profile = %profile_name, "using Site Manager API");
            let client = sm.client()?;
            let store = FileStore::open(config::state_path(&profile_name)).await?;
            debug!(state = %store.path().display(), "opened state file");
            let repo: Arc<dyn HealthRepository> = Arc::new(store);
            (repo, Some(client))
        };

        let engine = HealthEngine::new(
            repo,
            Arc::new(TracingNotifier::new(recipient)),
            config.defaults.engine_config(),
        );

        Ok(Self {
            engine,
            client,
            format: resolve_format(global, &config),
            color: output::should_color(resolve_color(global, &config)),
            quiet: global.quiet,
            config,
        })
    }

    pub fn is_demo(&self) -> bool {
        self.client.is_none()
    }

    /// The Site Manager client, or a usage error naming `command` in demo
    /// mode.
    pub fn require_client(&self, command: &str) -> Result<&SiteManagerClient, CliError> {
        self.client.as_ref().ok_or_else(|| CliError::Validation {
            field: "--demo".into(),
            reason: format!("`{command}` talks to the Site Manager API and cannot run in demo mode"),
        })
    }

    /// Pull a fresh listing from the Site Manager API. A no-op in demo mode.
    pub async fn refresh(&self) -> Result<SyncReport, CliError> {
        let Some(ref client) = self.client else {
            return Ok(SyncReport::default());
        };
        let report = sync_from_site_manager(&self.engine, client).await?;
        info!(
            applied = report.applied,
            rejected = report.rejected.len(),
            events = report.events.len(),
            "refreshed from Site Manager"
        );
        Ok(report)
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.quiet);
    }
}

fn resolve_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    use clap::ValueEnum;
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

fn resolve_color(global: &GlobalOpts, config: &Config) -> ColorMode {
    use clap::ValueEnum;
    global.color.unwrap_or_else(|| {
        ColorMode::from_str(&config.defaults.color, true).unwrap_or(ColorMode::Auto)
    })
}

/// Dispatch a data command to its handler.
pub async fn dispatch(cmd: Command, session: &Session) -> Result<(), CliError> {
    match cmd {
        Command::Hosts(args) => hosts::handle(session, &args).await,
        Command::Stats => stats::handle(session).await,
        Command::Events(args) => events::handle(session, &args).await,
        Command::Sync => sync::handle(session).await,
        Command::Watch(args) => watch::handle(session, &args).await,
        Command::Alert(args) => alert::handle(session, &args).await,
        Command::TestConnection => connection::handle(session).await,
        // Config and Completions are handled before a session is opened
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not run against a session".into(),
        )),
    }
}
