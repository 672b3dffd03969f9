//! Demo access handlers for students and guests

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::time::Instant;

use lectern_access_core::{AccessError, DemoStart, DemoStatus};
use lectern_types::CourseId;

use super::shared::{parse_access_type, parse_id, record_op_duration};
use crate::error::ApiResult;
use crate::extractors::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoRequest {
    pub course_id: String,
    pub access_type: String,
}

/// POST /api/demo-access
///
/// Students get a stored grant; guests get a signed token to send back in
/// `X-Guest-Demo`.
pub async fn start_demo(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<DemoRequest>,
) -> ApiResult<(StatusCode, Json<DemoStart>)> {
    let start = Instant::now();

    let course_id: CourseId = parse_id(&req.course_id, "courseId")?;
    let access_type = parse_access_type(&req.access_type)?;

    let result = match &caller {
        Caller::User(user) if user.role.is_staff() => Err(AccessError::AlreadyEntitled),
        Caller::User(user) => {
            state
                .access
                .start_demo(user.user_id, course_id, access_type)
                .await
        }
        Caller::Guest { token, .. } => {
            state
                .access
                .start_guest_demo(token.as_deref(), course_id, access_type)
                .await
        }
    };
    record_op_duration("start_demo", start, result.is_ok());

    let started = result?;
    let status = if started.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(started)))
}

/// GET /api/demo-access
pub async fn demo_status(
    State(state): State<AppState>,
    caller: Caller,
    Query(req): Query<DemoRequest>,
) -> ApiResult<Json<DemoStatus>> {
    let start = Instant::now();

    let course_id: CourseId = parse_id(&req.course_id, "courseId")?;
    let access_type = parse_access_type(&req.access_type)?;

    let result = state
        .access
        .demo_status(&caller.subject(), course_id, access_type)
        .await;
    record_op_duration("demo_status", start, result.is_ok());

    Ok(Json(result?))
}
