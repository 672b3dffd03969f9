//! Access errors

use thiserror::Error;

use lectern_types::{DenialReason, InvalidTransition};

use crate::capability_token::TokenError;

/// Access service errors
#[derive(Error, Debug)]
pub enum AccessError {
    /// Invalid bearer token (malformed, bad signature, wrong audience)
    #[error("invalid token")]
    InvalidToken,

    /// Bearer token has expired
    #[error("token expired")]
    TokenExpired,

    /// Capability token rejected
    #[error("invalid capability: {0}")]
    Capability(#[from] TokenError),

    /// Caller lacks the capability for this operation
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Entitlement check denied the resource
    #[error("access denied: {0}")]
    Denied(DenialReason),

    /// Referenced record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Student already has full access to the course
    #[error("already entitled to this course")]
    AlreadyEntitled,

    /// Subscription status change not allowed
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// Concurrent modification
    #[error("conflict: {0}")]
    Conflict(String),

    /// Field validation failed
    #[error("validation failed: {0}")]
    Validation(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AccessError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidToken | Self::TokenExpired | Self::Capability(_) => 401,
            Self::Denied(DenialReason::Unavailable) => 503,
            Self::Forbidden(_) | Self::Denied(_) => 403,
            Self::NotFound(_) => 404,
            Self::AlreadyEntitled | Self::InvalidTransition(_) | Self::Conflict(_) => 409,
            Self::Validation(_) => 422,
            Self::Database(_) | Self::Configuration(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Capability(TokenError::Expired) => "CAPABILITY_EXPIRED",
            Self::Capability(_) => "INVALID_CAPABILITY",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Denied(DenialReason::SignUpRequired) => "SIGN_UP_REQUIRED",
            Self::Denied(DenialReason::UpgradeRequired) => "UPGRADE_REQUIRED",
            Self::Denied(DenialReason::DemoNotStarted) => "DEMO_NOT_STARTED",
            Self::Denied(DenialReason::DemoExpired) => "DEMO_EXPIRED",
            Self::Denied(DenialReason::ResourceLocked) => "RESOURCE_LOCKED",
            Self::Denied(DenialReason::Unavailable) => "ACCESS_UNAVAILABLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyEntitled => "ALREADY_ENTITLED",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::Conflict(_) => "CONFLICT",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

impl From<lectern_db::DbError> for AccessError {
    fn from(err: lectern_db::DbError) -> Self {
        match err {
            lectern_db::DbError::NotFound => Self::NotFound("record"),
            lectern_db::DbError::Conflict(msg) => Self::Conflict(msg),
            other => {
                tracing::error!("Database error: {}", other);
                Self::Database(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AccessError::InvalidToken.status_code(), 401);
        assert_eq!(AccessError::Denied(DenialReason::DemoExpired).status_code(), 403);
        assert_eq!(AccessError::Denied(DenialReason::Unavailable).status_code(), 503);
        assert_eq!(AccessError::NotFound("course").status_code(), 404);
        assert_eq!(AccessError::AlreadyEntitled.status_code(), 409);
        assert_eq!(AccessError::Validation("title".into()).status_code(), 422);
    }

    #[test]
    fn test_db_error_mapping() {
        let err = AccessError::from(lectern_db::DbError::NotFound);
        assert!(matches!(err, AccessError::NotFound(_)));

        let err = AccessError::from(lectern_db::DbError::Conflict("stale".into()));
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn test_denial_codes() {
        assert_eq!(
            AccessError::Denied(DenialReason::ResourceLocked).error_code(),
            "RESOURCE_LOCKED"
        );
        assert_eq!(
            AccessError::Denied(DenialReason::DemoExpired).to_string(),
            "access denied: Demo Expired"
        );
    }
}
