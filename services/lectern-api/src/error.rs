//! Error types for the Lectern API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use lectern_access_core::AccessError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Access(#[from] AccessError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Access(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Access(e) => e.error_code(),
        }
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Access(AccessError::Database(_) | AccessError::Configuration(_))
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Internal details stay in the logs
        let message = if self.is_internal() {
            tracing::error!(error = ?self, "Internal API error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_types::DenialReason;

    #[test]
    fn test_access_errors_keep_their_status() {
        let err = ApiError::from(AccessError::Denied(DenialReason::DemoExpired));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "DEMO_EXPIRED");

        let err = ApiError::from(AccessError::NotFound("course"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: "DEMO_EXPIRED".to_string(),
                message: "access denied: demo expired".to_string(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": { "code": "DEMO_EXPIRED", "message": "access denied: demo expired" }
            })
        );
    }

    #[test]
    fn test_database_errors_are_internal() {
        let err = ApiError::from(AccessError::Database("pool timed out".into()));
        assert!(err.is_internal());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!ApiError::BadRequest("x".into()).is_internal());
    }
}
