//! Liveness and readiness checks

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub ready: bool,
    pub database_reachable: bool,
    pub schema_version: Option<i64>,
    pub expected_schema_version: Option<i64>,
}

/// GET /health
pub async fn health() -> Json<Liveness> {
    Json(Liveness {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ready
///
/// Ready once the database answers and carries every bundled migration.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let readiness = match lectern_db::schema_status(&state.pool).await {
        Ok(schema) => {
            if !schema.is_current() {
                tracing::warn!(
                    applied = ?schema.applied,
                    expected = ?schema.expected,
                    "Database schema is behind this build"
                );
            }
            Readiness {
                ready: schema.is_current(),
                database_reachable: true,
                schema_version: schema.applied,
                expected_schema_version: schema.expected,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Readiness check could not read schema state");
            Readiness {
                ready: false,
                database_reachable: false,
                schema_version: None,
                expected_schema_version: None,
            }
        }
    };

    let status = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(readiness))
}
