// ── Core error types ──
//
// User-facing errors from sitewatch-core. Consumers never see HTTP status
// codes or JSON parse failures directly; `From<sitewatch_api::Error>`
// translates them. Variants fall into two classes: validation failures
// (bad input, nothing persisted) and dependency failures (store or vendor
// API unavailable, the caller may retry).

use sitewatch_api::Error as ApiError;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation errors ────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error(
        "Site {site} already has primary host {existing}; refusing to mark {incoming} as primary"
    )]
    PrimaryHostConflict {
        site: String,
        existing: String,
        incoming: String,
    },

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Site not found: {identifier}")]
    SiteNotFound { identifier: String },

    // ── Dependency errors ────────────────────────────────────────────
    #[error("Repository unavailable: {message}")]
    Dependency { message: String },

    #[error("Cannot connect to Site Manager at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Site Manager request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// Vendor error code, if the body carried one.
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Bad input. The write was rejected before anything was persisted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::PrimaryHostConflict { .. }
        )
    }

    /// A collaborator (store, vendor API) failed. Retrying may help.
    pub fn is_dependency(&self) -> bool {
        matches!(
            self,
            Self::Dependency { .. }
                | Self::ConnectionFailed { .. }
                | Self::AuthenticationFailed { .. }
                | Self::Timeout { .. }
                | Self::Api { .. }
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

// ── Site Manager failures ───────────────────────────────────────────

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        let summary = err.to_string();
        match err {
            ApiError::InvalidApiKey => Self::AuthenticationFailed { message: summary },
            ApiError::Authentication { message } => Self::AuthenticationFailed { message },
            ApiError::Transport(e) if e.is_timeout() => Self::Timeout { timeout_secs: 0 },
            ApiError::Transport(e) if e.is_connect() => Self::ConnectionFailed {
                url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            ApiError::Transport(e) => Self::Api {
                message: summary,
                code: None,
                status: e.status().map(|s| s.as_u16()),
            },
            ApiError::InvalidUrl(_) => Self::Config { message: summary },
            ApiError::Tls(_) => Self::ConnectionFailed {
                url: String::new(),
                reason: summary,
            },
            ApiError::RateLimited { .. } => Self::Api {
                message: summary,
                code: Some("rate_limited".into()),
                status: Some(429),
            },
            ApiError::SiteManager {
                message,
                code,
                status,
            } => Self::Api {
                message,
                code,
                status: Some(status),
            },
            ApiError::Deserialization { .. } => Self::Api {
                message: summary,
                code: None,
                status: None,
            },
        }
    }
}
