use thiserror::Error;

/// Failures talking to UniFi Site Manager.
///
/// `sitewatch-core` folds all of these into its dependency-class errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Site Manager answered 401 for the configured key.
    #[error("Site Manager rejected the API key")]
    InvalidApiKey,

    /// The key contains bytes that cannot go into an `X-API-Key` header.
    #[error("unusable API key: {message}")]
    Authentication { message: String },

    #[error("request to Site Manager failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("bad Site Manager URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// CA bundle could not be loaded or the client could not be built.
    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// HTTP 429. `retry_after_secs` comes from the `Retry-After` header.
    #[error("Site Manager is throttling requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Any other non-2xx answer.
    #[error("Site Manager returned HTTP {status}: {message}")]
    SiteManager {
        message: String,
        code: Option<String>,
        status: u16,
    },

    /// 2xx answer whose body did not match the expected shape. The raw body
    /// is kept for debugging.
    #[error("unexpected Site Manager payload: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// True for throttling, timeouts, refused connections and 5xx answers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::SiteManager { status, .. } => *status >= 500,
            Self::InvalidApiKey
            | Self::Authentication { .. }
            | Self::InvalidUrl(_)
            | Self::Tls(_)
            | Self::Deserialization { .. } => false,
        }
    }
}
