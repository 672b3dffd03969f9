//! Configuration for the Lectern API service.

use std::time::Duration;

use lectern_access_core::AccessConfig;

/// Allowed range for `LOOKUP_TIMEOUT_SECS`
const LOOKUP_TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 3..=30;

/// Allowed range for `DEMO_WINDOW_HOURS` (up to a year)
const DEMO_WINDOW_HOURS_RANGE: std::ops::RangeInclusive<u64> = 1..=24 * 365;

/// Allowed range for `PLAY_TOKEN_TTL_SECS` (up to a day)
const PLAY_TOKEN_TTL_RANGE: std::ops::RangeInclusive<u64> = 1..=24 * 60 * 60;

/// Lectern API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Access core configuration
    pub access: AccessConfig,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
    /// Where the media proxy fetches content from
    pub storage: StorageBuckets,
}

/// Object storage buckets handed to the media proxy with play tokens
#[derive(Debug, Clone, Default)]
pub struct StorageBuckets {
    pub recordings: Option<String>,
    pub materials: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_source(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Database
        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        // Server
        let http_port = var("HTTP_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Secrets
        let jwt_secret = var("AUTH_JWT_SECRET").ok_or(ConfigError::Missing("AUTH_JWT_SECRET"))?;
        let capability_secret = var("CAPABILITY_TOKEN_SECRET")
            .ok_or(ConfigError::Missing("CAPABILITY_TOKEN_SECRET"))?;

        // Windows and timeouts
        let demo_window_hours: u64 = parse_or(&var, "DEMO_WINDOW_HOURS", 24)?;
        if !DEMO_WINDOW_HOURS_RANGE.contains(&demo_window_hours) {
            return Err(ConfigError::Invalid("DEMO_WINDOW_HOURS"));
        }
        let play_token_ttl_secs: u64 = parse_or(&var, "PLAY_TOKEN_TTL_SECS", 300)?;
        if !PLAY_TOKEN_TTL_RANGE.contains(&play_token_ttl_secs) {
            return Err(ConfigError::Invalid("PLAY_TOKEN_TTL_SECS"));
        }
        let lookup_timeout_secs: u64 = parse_or(&var, "LOOKUP_TIMEOUT_SECS", 10)?;
        if !LOOKUP_TIMEOUT_RANGE.contains(&lookup_timeout_secs) {
            return Err(ConfigError::Invalid("LOOKUP_TIMEOUT_SECS"));
        }
        let request_timeout_secs: u64 = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;

        // Metrics
        let metrics_enabled = var("METRICS_ENABLED")
            .unwrap_or_else(|| "true".to_string())
            .parse()
            .unwrap_or(true);

        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("AUTH_JWT_SECRET"));
        }
        let mut access = AccessConfig::try_new(jwt_secret, capability_secret)
            .map_err(|_| ConfigError::Invalid("CAPABILITY_TOKEN_SECRET"))?
            .with_demo_window(Duration::from_secs(demo_window_hours * 60 * 60))
            .with_play_token_ttl(Duration::from_secs(play_token_ttl_secs))
            .with_lookup_timeout(Duration::from_secs(lookup_timeout_secs));
        if let Some(issuer) = var("AUTH_JWT_ISSUER").filter(|s| !s.is_empty()) {
            access = access.with_issuer(issuer);
        }

        Ok(Self {
            http_port,
            database_url,
            access,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            storage: StorageBuckets {
                recordings: var("STORAGE_RECORDINGS_BUCKET"),
                materials: var("STORAGE_MATERIALS_BUCKET"),
            },
        })
    }
}

fn parse_or(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
