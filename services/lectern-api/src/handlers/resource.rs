//! Course resource handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::time::Instant;

use lectern_types::{Capability, CourseId, CourseResource};

use super::access::AccessQuery;
use super::shared::{parse_access_type, parse_id, record_op_duration};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResourceRequest {
    pub access_type: String,
    pub title: String,
}

/// GET /api/courses/{course_id}/resources
pub async fn list_resources(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<AccessQuery>,
) -> ApiResult<Json<Vec<CourseResource>>> {
    let start = Instant::now();

    let course_id: CourseId = parse_id(&course_id, "courseId")?;
    let access_type = parse_access_type(&query.access_type)?;

    let result = state.access.list_resources(course_id, access_type).await;
    record_op_duration("list_resources", start, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/courses/{course_id}/resources
pub async fn add_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
    Json(req): Json<AddResourceRequest>,
) -> ApiResult<(StatusCode, Json<CourseResource>)> {
    let start = Instant::now();
    user.require(Capability::ManageResources)?;

    let course_id: CourseId = parse_id(&course_id, "courseId")?;
    let access_type = parse_access_type(&req.access_type)?;

    let result = state
        .access
        .add_resource(course_id, access_type, &req.title)
        .await;
    record_op_duration("add_resource", start, result.is_ok());

    Ok((StatusCode::CREATED, Json(result?)))
}
