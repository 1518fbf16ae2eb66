//! Shared configuration for sitewatch.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to the runtime `sitewatch_core` config types. The core
//! never reads files; the CLI loads a [`Config`] here and hands the
//! derived values in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sitewatch_api::TlsMode;
use sitewatch_core::{EngineConfig, FEED_PAGE_SIZE, PrimaryHostPolicy, SiteManagerConfig};

/// Keyring service name for stored API keys.
pub const KEYRING_SERVICE: &str = "sitewatch";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SITEWATCH_CONFIG";

/// Environment variable that overrides where monitoring state is kept.
pub const DATA_DIR_ENV: &str = "SITEWATCH_DATA_DIR";

/// Prefix of the environment overlay, e.g. `SITEWATCH_DEFAULTS__TIMEOUT`.
const ENV_PREFIX: &str = "SITEWATCH_";


#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("cannot render configuration as TOML: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("cannot read configuration: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── File layout ────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named Site Manager profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, else the configured
    /// default, else `"default"`.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Event feed page size. Values above the engine cap are clamped.
    #[serde(default = "default_feed_page_size")]
    pub feed_page_size: usize,

    /// Append an INFO sync event for every applied observation.
    #[serde(default)]
    pub emit_sync_events: bool,

    /// Seconds between polls in `watch` mode.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// What to do with a second primary host in one site.
    #[serde(default)]
    pub primary_host_policy: PrimaryHostPolicy,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            feed_page_size: default_feed_page_size(),
            emit_sync_events: false,
            poll_interval: default_poll_interval(),
            primary_host_policy: PrimaryHostPolicy::default(),
        }
    }
}

impl Defaults {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            feed_page_size: self.feed_page_size.clamp(1, FEED_PAGE_SIZE),
            emit_sync_events: self.emit_sync_events,
            primary_host_policy: self.primary_host_policy,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_feed_page_size() -> usize {
    FEED_PAGE_SIZE
}
fn default_poll_interval() -> u64 {
    60
}

/// A named Site Manager profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Site Manager API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept any TLS certificate (intercepting proxies only).
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Where alert notifications would be sent.
    pub alert_email_to: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            api_key_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            alert_email_to: None,
        }
    }
}

fn default_api_url() -> String {
    sitewatch_api::site_manager::DEFAULT_BASE_URL.into()
}

// ── Locating the file ──────────────────────────────────────────────

/// `$SITEWATCH_CONFIG` if set, else `config.toml` in the platform config
/// directory (`~/.config/sitewatch` when that cannot be determined).
pub fn config_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(explicit);
    }
    let dir = ProjectDirs::from("com", "sitewatch", "sitewatch").map_or_else(
        || {
            let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
            home.join(".config").join("sitewatch")
        },
        |dirs| dirs.config_dir().to_path_buf(),
    );
    dir.join("config.toml")
}

/// `$SITEWATCH_DATA_DIR` if set, else the platform data directory
/// (`~/.local/share/sitewatch` when that cannot be determined).
pub fn data_dir() -> PathBuf {
    if let Some(explicit) = std::env::var_os(DATA_DIR_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(explicit);
    }
    ProjectDirs::from("com", "sitewatch", "sitewatch").map_or_else(
        || {
            let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
            home.join(".local").join("share").join("sitewatch")
        },
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

/// State file for one profile. Profiles point at different accounts, so
/// each keeps its own device history and event log.
pub fn state_path(profile_name: &str) -> PathBuf {
    let stem: String = profile_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    data_dir().join(format!("state-{stem}.json"))
}

// ── Reading and writing ────────────────────────────────────────────

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Built-in defaults, then the TOML file at `path` (absent is fine), then
/// `SITEWATCH_*` variables with `__` as the nesting separator.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?)
}

/// Write `cfg` to [`config_path`] and return where it went.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(cfg)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, rendered)?;
    Ok(())
}

// ── API key lookup ─────────────────────────────────────────────────

fn key_from_env(profile: &Profile) -> Option<String> {
    profile
        .api_key_env
        .as_deref()
        .and_then(|var| std::env::var(var).ok())
}

fn key_from_keyring(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
        .and_then(|entry| entry.get_password())
        .ok()
}

/// First hit wins: the variable named by `api_key_env`, the system keyring
/// entry `<profile>/api-key`, then a plaintext `api_key`.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    key_from_env(profile)
        .or_else(|| key_from_keyring(profile_name))
        .or_else(|| profile.api_key.clone())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// TLS mode for a profile: `insecure` wins, then a custom CA, else the
/// system store.
pub fn tls_mode(profile: &Profile) -> TlsMode {
    match (profile.insecure, &profile.ca_cert) {
        (Some(true), _) => TlsMode::DangerAcceptInvalid,
        (_, Some(pem)) => TlsMode::CustomCa(pem.clone()),
        _ => TlsMode::System,
    }
}

/// Build a `SiteManagerConfig` from a profile, with an already-resolved key.
pub fn profile_to_site_manager_config(
    profile: &Profile,
    defaults: &Defaults,
    api_key: SecretString,
) -> Result<SiteManagerConfig, ConfigError> {
    let url: url::Url = profile
        .api_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", profile.api_url),
        })?;

    Ok(SiteManagerConfig {
        url,
        api_key,
        tls: tls_mode(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_match_engine_defaults() {
        let defaults = Defaults::default();
        assert_eq!(defaults.engine_config(), EngineConfig::default());
        assert_eq!(defaults.poll_interval, 60);
    }

    #[test]
    fn page_size_is_clamped_into_engine_range() {
        let defaults = Defaults {
            feed_page_size: 500,
            ..Defaults::default()
        };
        assert_eq!(defaults.engine_config().feed_page_size, FEED_PAGE_SIZE);
        let defaults = Defaults {
            feed_page_size: 0,
            ..Defaults::default()
        };
        assert_eq!(defaults.engine_config().feed_page_size, 1);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults, Defaults::default());
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.defaults.emit_sync_events = true;
        cfg.defaults.primary_host_policy = PrimaryHostPolicy::Reject;
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_key_env: Some("SITEWATCH_TEST_KEY".into()),
                alert_email_to: Some("noc@example.com".into()),
                ..Profile::default()
            },
        );
        save_config_to(&path, &cfg).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.defaults, cfg.defaults);
        assert_eq!(loaded.profile("default").unwrap(), cfg.profile("default").unwrap());
        assert!(matches!(
            loaded.profile("missing"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn hand_written_toml_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "noc"

[defaults]
output = "json"
primary_host_policy = "reject"

[profiles.noc]
api_key = "plain-key"
timeout = 5
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.profile_name(None), "noc");
        assert_eq!(cfg.profile_name(Some("other")), "other");
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.primary_host_policy, PrimaryHostPolicy::Reject);

        let profile = cfg.profile("noc").unwrap();
        assert_eq!(profile.api_url, "https://api.ui.com");

        let sm = profile_to_site_manager_config(
            profile,
            &cfg.defaults,
            SecretString::from("k".to_owned()),
        )
        .unwrap();
        assert_eq!(sm.timeout, Duration::from_secs(5));
        assert!(matches!(sm.tls, TlsMode::System));
    }

    #[test]
    fn plaintext_key_is_the_last_resort() {
        let profile = Profile {
            api_key: Some("plain-key".into()),
            ..Profile::default()
        };
        // Keyring lookups fail for an unused profile name on CI machines.
        let key = resolve_api_key(&profile, "sitewatch-test-unused-profile").unwrap();
        assert_eq!(key.expose_secret(), "plain-key");

        let err = resolve_api_key(&Profile::default(), "sitewatch-test-unused-profile");
        assert!(matches!(err, Err(ConfigError::NoCredentials { .. })));
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let profile = Profile {
            api_url: "not a url".into(),
            ..Profile::default()
        };
        let err = profile_to_site_manager_config(
            &profile,
            &Defaults::default(),
            SecretString::from("k".to_owned()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn insecure_beats_custom_ca() {
        let profile = Profile {
            insecure: Some(true),
            ca_cert: Some("/tmp/ca.pem".into()),
            ..Profile::default()
        };
        assert!(matches!(tls_mode(&profile), TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn state_file_name_is_path_safe() {
        let path = state_path("noc/eu west");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("state-noc_eu_west.json")
        );
    }
}
