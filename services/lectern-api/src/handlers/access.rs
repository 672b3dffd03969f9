//! Entitlement and play handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use lectern_access_core::PlayClaims;
use lectern_types::{AccessDecision, AccessType, CourseId, ResourceId};

use super::shared::{parse_access_type, parse_id, record_op_duration};
use crate::error::ApiResult;
use crate::extractors::Caller;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    #[serde(rename = "accessType", alias = "access_type")]
    pub access_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub resource_id: ResourceId,
    pub access_type: AccessType,
    pub title: String,
    /// Bucket the media proxy should fetch from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    pub decision: AccessDecision,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/courses/{course_id}/access
pub async fn get_access(
    State(state): State<AppState>,
    caller: Caller,
    Path(course_id): Path<String>,
    Query(query): Query<AccessQuery>,
) -> ApiResult<Json<AccessDecision>> {
    let start = Instant::now();

    let course_id: CourseId = parse_id(&course_id, "courseId")?;
    let access_type = parse_access_type(&query.access_type)?;

    let decision = state
        .access
        .check_access(&caller.subject(), course_id, access_type)
        .await;

    record_op_duration("get_access", start, true);
    Ok(Json(decision))
}

/// POST /api/courses/{course_id}/resources/{resource_id}/play
pub async fn play_resource(
    State(state): State<AppState>,
    caller: Caller,
    Path((course_id, resource_id)): Path<(String, String)>,
) -> ApiResult<Json<PlayResponse>> {
    let start = Instant::now();

    let course_id: CourseId = parse_id(&course_id, "courseId")?;
    let resource_id: ResourceId = parse_id(&resource_id, "resourceId")?;

    let result = state
        .access
        .authorize_resource(&caller.subject(), course_id, resource_id)
        .await;
    record_op_duration("play_resource", start, result.is_ok());
    let grant = result?;

    let storage = &state.config.storage;
    let bucket = match grant.resource.access_type {
        AccessType::LectureRecording => storage.recordings.clone(),
        AccessType::LiveClass => storage.materials.clone(),
    };

    Ok(Json(PlayResponse {
        token: grant.token,
        expires_at: grant.expires_at,
        resource_id: grant.resource.id,
        access_type: grant.resource.access_type,
        title: grant.resource.title,
        bucket,
        decision: grant.decision,
    }))
}

/// GET /api/play/verify
pub async fn verify_play(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<Json<PlayClaims>> {
    let start = Instant::now();

    let result = state.access.verify_play_token(&query.token);
    record_op_duration("verify_play", start, result.is_ok());

    Ok(Json(result?))
}
