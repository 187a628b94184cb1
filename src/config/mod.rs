//! Client configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

use crate::auth::store::default_credential_path;
use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// How long before expiry a background refresh is scheduled.
pub const DEFAULT_REFRESH_SKEW: Duration = Duration::from_secs(60);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Paths of the authentication endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub login: String,
    pub register: String,
    pub refresh: String,
    pub logout: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            refresh: "/auth/refresh".to_string(),
            logout: "/auth/logout".to_string(),
        }
    }
}

impl AuthEndpoints {
    /// Login, register and refresh: sent without a bearer token.
    pub fn is_anonymous(&self, path: &str) -> bool {
        let path = normalize_path(path);
        [&self.login, &self.register, &self.refresh]
            .into_iter()
            .any(|endpoint| normalize_path(endpoint) == path)
    }

    /// Endpoints whose 401 is returned as-is instead of entering the refresh flow.
    pub fn skips_refresh(&self, path: &str) -> bool {
        self.is_anonymous(path) || normalize_path(&self.logout) == normalize_path(path)
    }
}

/// Canonical form for endpoint comparison: no query or fragment, one leading
/// slash, no trailing slash.
fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

/// Configuration for [`ApiClient`](crate::client::ApiClient).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use jobmatch_client::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://jobs.example.com/api")
///     .refresh_skew(Duration::from_secs(120))
///     .build();
/// assert_eq!(config.url("/jobs"), "https://jobs.example.com/api/jobs");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(default = DEFAULT_REFRESH_SKEW)]
    pub refresh_skew: Duration,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    #[builder(into, default = default_credential_path())]
    pub token_path: PathBuf,
    #[builder(default)]
    pub endpoints: AuthEndpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Load from environment variables, after reading `.env` if present.
    ///
    /// Recognised: `JOBMATCH_API_URL`, `JOBMATCH_TOKEN_FILE`,
    /// `JOBMATCH_REFRESH_SKEW_SECS`, `JOBMATCH_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup("JOBMATCH_API_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(path) = lookup("JOBMATCH_TOKEN_FILE").filter(|v| !v.trim().is_empty()) {
            config.token_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("JOBMATCH_REFRESH_SKEW_SECS") {
            config.refresh_skew = parse_secs("JOBMATCH_REFRESH_SKEW_SECS", &raw)?;
        }
        if let Some(raw) = lookup("JOBMATCH_TIMEOUT_SECS") {
            config.timeout = parse_secs("JOBMATCH_TIMEOUT_SECS", &raw)?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Absolute URL for a path relative to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

fn parse_secs(var: &str, raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ClientError::Configuration(format!("{var} must be a whole number of seconds, got {raw:?}")))
}
