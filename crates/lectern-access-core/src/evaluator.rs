//! Entitlement evaluation
//!
//! A pure decision over a subject, an entitlement snapshot and the
//! course's resources of one access type. The clock is passed in.
//!
//! Precedence, first match wins:
//! 1. staff role
//! 2. paid enrollment
//! 3. active subscription
//! 4. demo enrollment with a grant for the access type
//! 5. guest with signed demo claims for the course and access type
//! 6. denied

use chrono::{DateTime, Utc};

use lectern_types::{
    AccessDecision, AccessTier, AccessType, CourseId, CourseResource, DenialReason,
    EnrollmentKind, EntitlementSnapshot, ResourceId, Role, UserId,
};

use crate::capability_token::GuestDemoClaims;

/// Who is asking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// Authenticated caller
    User { user_id: UserId, role: Role },
    /// Unauthenticated caller, with verified demo claims if a token was sent
    Guest { demo: Option<GuestDemoClaims> },
}

impl Subject {
    pub fn user(user_id: UserId, role: Role) -> Self {
        Self::User { user_id, role }
    }

    pub fn guest(demo: Option<GuestDemoClaims>) -> Self {
        Self::Guest { demo }
    }

    /// Denial for a subject nothing matched
    fn locked_reason(&self) -> DenialReason {
        match self {
            Self::User { .. } => DenialReason::UpgradeRequired,
            Self::Guest { .. } => DenialReason::SignUpRequired,
        }
    }
}

/// Decide what `subject` may open in `course_id` for `access_type`.
///
/// `resources` must be the course's resources of `access_type`; their
/// order does not matter.
pub fn evaluate(
    subject: &Subject,
    snapshot: &EntitlementSnapshot,
    course_id: CourseId,
    access_type: AccessType,
    resources: &[CourseResource],
    now: DateTime<Utc>,
) -> AccessDecision {
    match subject {
        Subject::User { role, .. } if role.is_staff() => AccessDecision::full(
            course_id,
            access_type,
            AccessTier::Staff,
            ids(resources),
        ),
        Subject::User { .. } => evaluate_student(snapshot, course_id, access_type, resources, now),
        Subject::Guest { demo: Some(claims) } if claims.covers(course_id, access_type) => {
            if claims.is_expired(now) {
                return AccessDecision::denied(course_id, access_type, DenialReason::DemoExpired)
                    .expired_at(claims.expires_at);
            }
            let unlocked = claims
                .resource_id
                .filter(|id| resources.iter().any(|r| r.id == *id));
            AccessDecision::single(
                course_id,
                access_type,
                AccessTier::GuestDemo,
                unlocked,
                claims.expires_at,
                now,
            )
        }
        Subject::Guest { .. } => {
            AccessDecision::denied(course_id, access_type, subject.locked_reason())
        }
    }
}

fn evaluate_student(
    snapshot: &EntitlementSnapshot,
    course_id: CourseId,
    access_type: AccessType,
    resources: &[CourseResource],
    now: DateTime<Utc>,
) -> AccessDecision {
    let enrollment = snapshot
        .enrollment
        .as_ref()
        .filter(|e| e.course_id == course_id);

    if enrollment.is_some_and(|e| e.is_paid()) {
        return AccessDecision::full(course_id, access_type, AccessTier::Paid, ids(resources));
    }

    let subscribed = snapshot
        .subscription
        .as_ref()
        .is_some_and(|s| s.course_id == course_id && s.is_active(now));
    if subscribed {
        return AccessDecision::full(
            course_id,
            access_type,
            AccessTier::Subscription,
            ids(resources),
        );
    }

    if !enrollment.is_some_and(|e| e.kind == EnrollmentKind::Demo) {
        return AccessDecision::denied(course_id, access_type, DenialReason::UpgradeRequired);
    }

    let grant = snapshot
        .demo_grant
        .as_ref()
        .filter(|g| g.course_id == course_id && g.access_type == access_type);

    match grant {
        None => AccessDecision::denied(course_id, access_type, DenialReason::DemoNotStarted)
            .clearing_demo_state(),
        Some(grant) if grant.is_expired(now) => {
            AccessDecision::denied(course_id, access_type, DenialReason::DemoExpired)
                .expired_at(grant.expires_at)
        }
        Some(grant) => AccessDecision::single(
            course_id,
            access_type,
            AccessTier::Demo,
            pick_demo_resource(grant.resource_id, resources),
            grant.expires_at,
            now,
        ),
    }
}

/// The resource a demo unlocks: the pinned one when it is still among
/// `resources`, otherwise the oldest by `(created_at, id)`.
pub fn pick_demo_resource(
    pinned: Option<ResourceId>,
    resources: &[CourseResource],
) -> Option<ResourceId> {
    pinned
        .filter(|id| resources.iter().any(|r| r.id == *id))
        .or_else(|| {
            resources
                .iter()
                .min_by_key(|r| (r.created_at, r.id))
                .map(|r| r.id)
        })
}

fn ids(resources: &[CourseResource]) -> Vec<ResourceId> {
    resources.iter().map(|r| r.id).collect()
}
