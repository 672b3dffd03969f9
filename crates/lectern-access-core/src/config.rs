//! Configuration types for the access service

use std::time::Duration;

use lectern_types::DEFAULT_DEMO_WINDOW_HOURS;

use crate::crypto::HmacKey;
use crate::AccessError;

/// Audience the hosted auth service puts on user access tokens
pub const DEFAULT_JWT_AUDIENCE: &str = "authenticated";

/// Access service configuration
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// HS256 secret shared with the hosted auth service
    pub jwt_secret: String,
    /// Expected `iss` claim, when the auth service sets one
    pub jwt_issuer: Option<String>,
    /// Expected `aud` claim
    pub jwt_audience: String,
    /// HMAC secret for guest demo and play tokens (at least 32 bytes)
    pub capability_secret: String,
    /// Length of a demo window
    pub demo_window: Duration,
    /// Lifetime of a play token
    pub play_token_ttl: Duration,
    /// Upper bound on the entitlement reads behind one decision
    pub lookup_timeout: Duration,
    /// How long a resolved role is cached
    pub role_cache_ttl: Duration,
}

impl AccessConfig {
    /// Create a config with default windows, validating the capability secret
    pub fn try_new(
        jwt_secret: impl Into<String>,
        capability_secret: impl Into<String>,
    ) -> Result<Self, AccessError> {
        let jwt_secret = jwt_secret.into();
        let capability_secret = capability_secret.into();

        if jwt_secret.is_empty() {
            return Err(AccessError::Configuration(
                "JWT secret must not be empty".to_string(),
            ));
        }
        HmacKey::new(&capability_secret)
            .map_err(|e| AccessError::Configuration(e.to_string()))?;

        Ok(Self {
            jwt_secret,
            jwt_issuer: None,
            jwt_audience: DEFAULT_JWT_AUDIENCE.to_string(),
            capability_secret,
            demo_window: Duration::from_secs(DEFAULT_DEMO_WINDOW_HOURS as u64 * 60 * 60),
            play_token_ttl: Duration::from_secs(5 * 60),
            lookup_timeout: Duration::from_secs(10),
            role_cache_ttl: Duration::from_secs(60),
        })
    }

    /// Set the expected issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.jwt_issuer = Some(issuer.into());
        self
    }

    /// Set the demo window
    pub fn with_demo_window(mut self, window: Duration) -> Self {
        self.demo_window = window;
        self
    }

    /// Set the play token lifetime
    pub fn with_play_token_ttl(mut self, ttl: Duration) -> Self {
        self.play_token_ttl = ttl;
        self
    }

    /// Set the entitlement lookup timeout
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the role cache duration
    pub fn with_role_cache_ttl(mut self, ttl: Duration) -> Self {
        self.role_cache_ttl = ttl;
        self
    }

    /// Demo window as a chrono duration
    pub fn demo_window_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.demo_window)
            .unwrap_or_else(|_| chrono::Duration::hours(DEFAULT_DEMO_WINDOW_HOURS))
    }

    /// Play token lifetime as a chrono duration
    pub fn play_token_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.play_token_ttl).unwrap_or_else(|_| chrono::Duration::minutes(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_defaults() {
        let config = AccessConfig::try_new("jwt", SECRET).unwrap();
        assert_eq!(config.demo_window_chrono(), chrono::Duration::hours(24));
        assert_eq!(config.play_token_ttl_chrono(), chrono::Duration::minutes(5));
        assert_eq!(config.jwt_audience, "authenticated");
        assert!(config.jwt_issuer.is_none());
    }

    #[test]
    fn test_short_capability_secret_rejected() {
        let err = AccessConfig::try_new("jwt", "short").unwrap_err();
        assert!(matches!(err, AccessError::Configuration(_)));
    }

    #[test]
    fn test_empty_jwt_secret_rejected() {
        assert!(AccessConfig::try_new("", SECRET).is_err());
    }
}
