//! Axum extractors for callers
//!
//! Users authenticate with a hosted auth bearer token; their role is
//! resolved into a [`CapabilitySet`] once per request. Guests may carry a
//! signed demo token in the `X-Guest-Demo` header.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;

use lectern_access_core::{require_capability, AccessError, GuestDemoClaims, Subject};
use lectern_types::{Capability, CapabilitySet, Role, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying a guest demo token
pub const GUEST_DEMO_HEADER: &str = "x-guest-demo";

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: Option<String>,
    pub role: Role,
    pub capabilities: CapabilitySet,
}

impl AuthUser {
    /// Fail unless the user holds `cap`
    pub fn require(&self, cap: Capability) -> Result<(), ApiError> {
        require_capability(self.capabilities, cap).map_err(|e| {
            tracing::debug!(user_id = %self.user_id, role = %self.role, ?cap, "Capability check failed");
            ApiError::from(e)
        })
    }

    pub fn subject(&self) -> Subject {
        Subject::user(self.user_id, self.role)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts)?.ok_or(ApiError::MissingToken)?;
        authenticate(&app_state, token).await
    }
}

async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let verified = state.tokens.validate(token)?;
    let role = state.access.resolve_role(&verified).await?;

    Ok(AuthUser {
        user_id: verified.user_id,
        email: verified.email,
        role,
        capabilities: CapabilitySet::for_role(role),
    })
}

/// A user, or a guest with an optional verified demo token
#[derive(Debug, Clone)]
pub enum Caller {
    User(AuthUser),
    Guest {
        /// Raw token as sent, handed back when a demo is resumed
        token: Option<String>,
        demo: Option<GuestDemoClaims>,
    },
}

impl Caller {
    pub fn subject(&self) -> Subject {
        match self {
            Self::User(user) => user.subject(),
            Self::Guest { demo, .. } => Subject::guest(demo.clone()),
        }
    }
}

impl<S> FromRequestParts<S> for Caller
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // A bearer token always wins; a bad one is an error, not a guest
        if let Some(token) = bearer_token(parts)? {
            return Ok(Self::User(authenticate(&app_state, token).await?));
        }

        let Some(raw) = parts.headers.get(GUEST_DEMO_HEADER) else {
            return Ok(Self::Guest {
                token: None,
                demo: None,
            });
        };
        let raw = raw
            .to_str()
            .map_err(|_| ApiError::BadRequest("Invalid X-Guest-Demo header encoding".into()))?;

        let claims = app_state
            .access
            .signer()
            .verify_guest_demo(raw)
            .map_err(AccessError::from)?;

        Ok(Self::Guest {
            token: Some(raw.to_string()),
            demo: Some(claims),
        })
    }
}

/// Bearer token from the Authorization header, if one was sent
fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::BadRequest("Invalid Authorization header encoding".into()))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(ApiError::Access(AccessError::InvalidToken)),
    }
}
