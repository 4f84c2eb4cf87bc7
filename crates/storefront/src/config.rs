//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `RANGE_API_BASE_URL` - Range API origin (default: <https://range-lvzt.onrender.com>)
//! - `RANGE_STATE_DIR` - Directory for the persisted session file (default: `.range`)
//! - `RANGE_CATALOG_CACHE_TTL_SECS` - Catalog response cache TTL (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default Range API origin.
pub const DEFAULT_API_BASE_URL: &str = "https://range-lvzt.onrender.com";

/// Default directory for the persisted session file.
pub const DEFAULT_STATE_DIR: &str = ".range";

/// Default catalog cache TTL, matching the one-minute revalidation of the web client.
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 60;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Range API connection settings
    pub api: ApiConfig,
    /// Directory holding durable session state; `None` keeps everything in memory
    pub state_dir: Option<PathBuf>,
    /// How long catalog responses stay cached
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Range API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API origin, without a trailing slash in requests
    pub base_url: Url,
}

impl StorefrontConfig {
    /// Configuration for an API at `base_url` with in-memory session state.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api: ApiConfig {
                base_url: parse_base_url("RANGE_API_BASE_URL", base_url)?,
            },
            state_dir: None,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Use `dir` for the persisted session file.
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("RANGE_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let base_url = parse_base_url("RANGE_API_BASE_URL", &base_url)?;

        let state_dir = lookup("RANGE_STATE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATE_DIR.to_string());

        let ttl_secs = match lookup("RANGE_CATALOG_CACHE_TTL_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("RANGE_CATALOG_CACHE_TTL_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_CATALOG_CACHE_TTL_SECS,
        };

        Ok(Self {
            api: ApiConfig { base_url },
            state_dir: Some(PathBuf::from(state_dir)),
            catalog_cache_ttl: Duration::from_secs(ttl_secs),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Parse and check an API origin.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "URL must have a host".to_string(),
        ));
    }

    Ok(url)
}
