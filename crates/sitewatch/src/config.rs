//! CLI configuration: a thin wrapper around `sitewatch_config`.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--api-url, --api-key, --insecure, ...).

use std::time::Duration;

use secrecy::SecretString;

use sitewatch_api::TlsMode;
use sitewatch_core::SiteManagerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use sitewatch_config::{
    Config, Defaults, KEYRING_SERVICE, Profile, config_path, load_config, save_config, state_path,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Build the Site Manager connection settings from the active profile and
/// global flags. Flags take priority over profile values; with no profile
/// on disk, flags and env vars alone must supply the key.
pub fn resolve_site_manager(
    global: &GlobalOpts,
    config: &Config,
) -> Result<SiteManagerConfig, CliError> {
    let profile_name = active_profile_name(global, config);
    let fallback = Profile::default();
    let profile = match config.profiles.get(&profile_name) {
        Some(p) => p,
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
            });
        }
        None => &fallback,
    };

    let api_key = resolve_api_key_with_flag(profile, &profile_name, global)?;
    let mut sm =
        sitewatch_config::profile_to_site_manager_config(profile, &config.defaults, api_key)?;

    if let Some(ref url_str) = global.api_url {
        sm.url = url_str.parse().map_err(|_| CliError::Validation {
            field: "api-url".into(),
            reason: format!("invalid URL: {url_str}"),
        })?;
    }
    if global.insecure {
        sm.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        sm.timeout = Duration::from_secs(secs);
    }
    Ok(sm)
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Resolve API key with CLI flag override, then fall through to shared resolution.
fn resolve_api_key_with_flag(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<SecretString, CliError> {
    if let Some(ref key) = global.api_key {
        return Ok(SecretString::from(key.clone()));
    }
    Ok(sitewatch_config::resolve_api_key(profile, profile_name)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use secrecy::ExposeSecret;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["sitewatch"];
        argv.extend_from_slice(args);
        argv.push("stats");
        Cli::parse_from(argv).global
    }

    #[test]
    fn flags_override_profile() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "noc".into(),
            Profile {
                api_key: Some("from-profile".into()),
                timeout: Some(10),
                ..Profile::default()
            },
        );
        let g = global(&[
            "--profile",
            "noc",
            "--api-key",
            "from-flag",
            "--api-url",
            "https://sm.example.test",
            "--timeout",
            "3",
            "--insecure",
        ]);

        let sm = resolve_site_manager(&g, &cfg).unwrap();
        assert_eq!(sm.api_key.expose_secret(), "from-flag");
        assert_eq!(sm.url.host_str(), Some("sm.example.test"));
        assert_eq!(sm.timeout, Duration::from_secs(3));
        assert!(matches!(sm.tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn unknown_explicit_profile_is_not_found() {
        let g = global(&["--profile", "ghost", "--api-key", "k"]);
        let err = resolve_site_manager(&g, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { .. }));
    }

    #[test]
    fn flag_key_works_without_profile() {
        let g = global(&["--api-key", "k"]);
        let sm = resolve_site_manager(&g, &Config::default()).unwrap();
        assert_eq!(sm.url.host_str(), Some("api.ui.com"));
        assert_eq!(sm.timeout, Duration::from_secs(30));
    }
}
