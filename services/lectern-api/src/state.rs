//! Application state

use std::sync::Arc;

use lectern_access_core::{AccessService, AuthTokenValidator};
use lectern_db::DbPool;

use crate::config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Entitlement decisions, demos and admin operations
    pub access: Arc<AccessService>,
    /// Hosted auth token validation
    pub tokens: Arc<AuthTokenValidator>,
    /// Database pool (readiness checks)
    pub pool: DbPool,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(access: AccessService, pool: DbPool, config: Config) -> Self {
        Self {
            tokens: Arc::new(AuthTokenValidator::new(&config.access)),
            access: Arc::new(access),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
