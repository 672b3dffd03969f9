//! Lectern API
//!
//! HTTP service gating access to course recordings and live classes.
//!
//! ## Access Endpoints
//!
//! - `GET /api/courses/{course_id}/access` - Evaluate entitlement
//! - `POST /api/courses/{course_id}/resources/{resource_id}/play` - Issue play token
//! - `GET /api/play/verify` - Verify play token (media proxy)
//! - `GET|POST /api/courses/{course_id}/resources` - List/add resources
//!
//! ## Demo Endpoints
//!
//! - `POST /api/demo-access` - Start demo (student or guest)
//! - `GET /api/demo-access` - Demo status
//!
//! ## Admin Endpoints
//!
//! - `POST /api/admin/demo/grant` - Grant demo
//! - `GET /api/admin/demo/grants` - List grants for a course
//! - `DELETE /api/admin/demo/grants/{id}` - Revoke grant
//! - `PUT /api/admin/demo/grants/{id}/resource` - Pin demo resource
//! - `POST /api/admin/enrollments` - Enroll student
//! - `PUT /api/admin/users/{id}/role` - Change role
//! - `POST /api/admin/subscriptions/{id}/{approve,reject,expire}`
//!
//! ## Subscription Endpoints
//!
//! - `GET|POST /api/subscriptions`
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod state;

use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{health, ready};
use crate::state::AppState;

pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let access_routes = Router::new()
        .route("/courses/{course_id}/access", get(handlers::get_access))
        .route(
            "/courses/{course_id}/resources",
            get(handlers::list_resources).post(handlers::add_resource),
        )
        .route(
            "/courses/{course_id}/resources/{resource_id}/play",
            post(handlers::play_resource),
        )
        .route("/play/verify", get(handlers::verify_play))
        .route(
            "/demo-access",
            get(handlers::demo_status).post(handlers::start_demo),
        )
        .route(
            "/subscriptions",
            get(handlers::list_subscriptions).post(handlers::request_subscription),
        );

    let admin_routes = Router::new()
        .route("/demo/grant", post(handlers::grant_demo))
        .route("/demo/grants", get(handlers::list_demo_grants))
        .route("/demo/grants/{id}", delete(handlers::revoke_demo))
        .route("/demo/grants/{id}/resource", put(handlers::pin_demo_resource))
        .route("/enrollments", post(handlers::enroll))
        .route("/users/{id}/role", put(handlers::set_role))
        .route(
            "/subscriptions/{id}/approve",
            post(handlers::approve_subscription),
        )
        .route(
            "/subscriptions/{id}/reject",
            post(handlers::reject_subscription),
        )
        .route(
            "/subscriptions/{id}/expire",
            post(handlers::expire_subscription),
        );

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Outermost first
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api", access_routes.nest("/admin", admin_routes))
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}
