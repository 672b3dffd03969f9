//! Admin handlers: demo grants, enrollments and roles

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use lectern_access_core::DemoStart;
use lectern_types::{
    Capability, CourseId, DemoGrant, DemoGrantId, Enrollment, ResourceId, Role, UserId,
};

use super::shared::{
    parse_access_type, parse_enrollment_kind, parse_id, parse_role, record_op_duration,
};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantDemoRequest {
    pub user_id: String,
    pub course_id: String,
    pub access_type: String,
    pub resource_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseQuery {
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinResourceRequest {
    pub resource_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub user_id: String,
    pub course_id: String,
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub user_id: UserId,
    pub role: Role,
}

// ============================================================================
// Demo grants
// ============================================================================

/// POST /api/admin/demo/grant
pub async fn grant_demo(
    State(state): State<AppState>,
    admin: AuthUser,
    Json(req): Json<GrantDemoRequest>,
) -> ApiResult<(StatusCode, Json<DemoStart>)> {
    let start = Instant::now();
    admin.require(Capability::ManageDemoGrants)?;

    let user_id: UserId = parse_id(&req.user_id, "userId")?;
    let course_id: CourseId = parse_id(&req.course_id, "courseId")?;
    let access_type = parse_access_type(&req.access_type)?;
    let resource_id = req
        .resource_id
        .as_deref()
        .map(|raw| parse_id::<ResourceId>(raw, "resourceId"))
        .transpose()?;
    if resource_id.is_some() {
        admin.require(Capability::PinDemoResource)?;
    }

    let result = state
        .access
        .grant_demo(user_id, course_id, access_type, resource_id)
        .await;
    record_op_duration("grant_demo", start, result.is_ok());
    let granted = result?;

    tracing::info!(admin_id = %admin.user_id, user_id = %user_id, course_id = %course_id, "Demo granted by admin");
    let status = if granted.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(granted)))
}

/// GET /api/admin/demo/grants
pub async fn list_demo_grants(
    State(state): State<AppState>,
    admin: AuthUser,
    Query(query): Query<CourseQuery>,
) -> ApiResult<Json<Vec<DemoGrant>>> {
    let start = Instant::now();
    admin.require(Capability::ManageDemoGrants)?;

    let course_id: CourseId = parse_id(&query.course_id, "courseId")?;

    let result = state.access.list_demo_grants(course_id).await;
    record_op_duration("list_demo_grants", start, result.is_ok());

    Ok(Json(result?))
}

/// DELETE /api/admin/demo/grants/{id}
pub async fn revoke_demo(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(grant_id): Path<String>,
) -> ApiResult<StatusCode> {
    let start = Instant::now();
    admin.require(Capability::ManageDemoGrants)?;

    let grant_id: DemoGrantId = parse_id(&grant_id, "grantId")?;

    let result = state.access.revoke_demo(grant_id).await;
    record_op_duration("revoke_demo", start, result.is_ok());
    result?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/admin/demo/grants/{id}/resource
pub async fn pin_demo_resource(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(grant_id): Path<String>,
    Json(req): Json<PinResourceRequest>,
) -> ApiResult<Json<DemoGrant>> {
    let start = Instant::now();
    admin.require(Capability::PinDemoResource)?;

    let grant_id: DemoGrantId = parse_id(&grant_id, "grantId")?;
    let resource_id: ResourceId = parse_id(&req.resource_id, "resourceId")?;

    let result = state.access.pin_demo_resource(grant_id, resource_id).await;
    record_op_duration("pin_demo_resource", start, result.is_ok());

    Ok(Json(result?))
}

// ============================================================================
// Enrollments and roles
// ============================================================================

/// POST /api/admin/enrollments
pub async fn enroll(
    State(state): State<AppState>,
    admin: AuthUser,
    Json(req): Json<EnrollRequest>,
) -> ApiResult<(StatusCode, Json<Enrollment>)> {
    let start = Instant::now();
    admin.require(Capability::ManageEnrollments)?;

    let user_id: UserId = parse_id(&req.user_id, "userId")?;
    let course_id: CourseId = parse_id(&req.course_id, "courseId")?;
    let kind = parse_enrollment_kind(&req.kind)?;

    let result = state.access.enroll(user_id, course_id, kind).await;
    record_op_duration("enroll", start, result.is_ok());

    Ok((StatusCode::CREATED, Json(result?)))
}

/// PUT /api/admin/users/{id}/role
pub async fn set_role(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(user_id): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let start = Instant::now();
    admin.require(Capability::ManageEnrollments)?;

    let user_id: UserId = parse_id(&user_id, "userId")?;
    let role = parse_role(&req.role)?;

    let result = state
        .access
        .set_role(admin.capabilities, user_id, role)
        .await;
    record_op_duration("set_role", start, result.is_ok());
    result?;

    tracing::info!(admin_id = %admin.user_id, user_id = %user_id, role = %role, "Role updated by admin");
    Ok(Json(RoleResponse { user_id, role }))
}
