//! Subscription handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::time::Instant;

use lectern_types::{Capability, CourseId, Subscription, SubscriptionId};

use super::shared::{parse_id, parse_plan, record_op_duration};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub course_id: String,
    pub plan: String,
}

/// POST /api/subscriptions
pub async fn request_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let start = Instant::now();

    let course_id: CourseId = parse_id(&req.course_id, "courseId")?;
    let plan = parse_plan(&req.plan)?;

    let result = state
        .access
        .request_subscription(user.user_id, course_id, plan)
        .await;
    record_op_duration("request_subscription", start, result.is_ok());
    let sub = result?;

    metrics::counter!("lectern_checkouts_created_total", "plan" => plan.as_str()).increment(1);
    Ok((StatusCode::CREATED, Json(sub)))
}

/// GET /api/subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Subscription>>> {
    let start = Instant::now();

    let result = state.access.list_subscriptions(user.user_id).await;
    record_op_duration("list_subscriptions", start, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/admin/subscriptions/{id}/approve
pub async fn approve_subscription(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    let start = Instant::now();
    admin.require(Capability::ApproveSubscriptions)?;
    let id: SubscriptionId = parse_id(&id, "subscriptionId")?;

    let result = state.access.approve_subscription(id).await;
    record_op_duration("approve_subscription", start, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/admin/subscriptions/{id}/reject
pub async fn reject_subscription(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    let start = Instant::now();
    admin.require(Capability::ApproveSubscriptions)?;
    let id: SubscriptionId = parse_id(&id, "subscriptionId")?;

    let result = state.access.reject_subscription(id).await;
    record_op_duration("reject_subscription", start, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/admin/subscriptions/{id}/expire
pub async fn expire_subscription(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    let start = Instant::now();
    admin.require(Capability::ApproveSubscriptions)?;
    let id: SubscriptionId = parse_id(&id, "subscriptionId")?;

    let result = state.access.expire_subscription(id).await;
    record_op_duration("expire_subscription", start, result.is_ok());

    Ok(Json(result?))
}
