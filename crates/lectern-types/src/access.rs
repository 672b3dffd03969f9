//! Access decision types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccessType, CourseId, DemoGrant, Enrollment, ResourceId, Subscription};

/// Enrollment, subscription and demo grant for one (student, course,
/// access type), read together so a decision never mixes two points in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementSnapshot {
    pub enrollment: Option<Enrollment>,
    /// Best subscription candidate: active rows first, latest expiry first
    pub subscription: Option<Subscription>,
    /// Grant matching the requested access type
    pub demo_grant: Option<DemoGrant>,
}

/// Which rule granted access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    /// Teacher, admin or superadmin
    Staff,
    /// Paid enrollment
    Paid,
    /// Active subscription
    Subscription,
    /// Authenticated student on a demo grant (one resource)
    Demo,
    /// Unauthenticated visitor on a signed guest token (one resource)
    GuestDemo,
    /// Nothing matched
    Locked,
}

impl AccessTier {
    /// Get the tier name (used as a metrics label)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Paid => "paid",
            Self::Subscription => "subscription",
            Self::Demo => "demo",
            Self::GuestDemo => "guest_demo",
            Self::Locked => "locked",
        }
    }

    /// Whether the tier unlocks every resource of the course
    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Staff | Self::Paid | Self::Subscription)
    }
}

impl std::fmt::Display for AccessTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why access was denied; tells the client what to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Guest without a demo: redirect to sign-up
    SignUpRequired,
    /// Student without entitlement: show the upgrade prompt
    UpgradeRequired,
    /// Demo enrollment exists but no grant for this access type
    DemoNotStarted,
    /// Demo window has closed
    DemoExpired,
    /// Resource is not the one unlocked by the demo
    ResourceLocked,
    /// Entitlement data could not be loaded
    Unavailable,
}

impl DenialReason {
    /// Message suitable for display
    pub const fn message(&self) -> &'static str {
        match self {
            Self::SignUpRequired => "Sign up to start a free demo",
            Self::UpgradeRequired => "Subscribe to unlock this course",
            Self::DemoNotStarted => "Start a demo to preview this course",
            Self::DemoExpired => "Demo Expired",
            Self::ResourceLocked => "This item is locked in demo mode",
            Self::Unavailable => "Access could not be verified, try again later",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Remaining demo time, serialized as whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Countdown(i64);

impl Countdown {
    /// Countdown from `now` until `expires_at`, clamped at zero
    pub fn until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self((expires_at - now).num_seconds().max(0))
    }

    /// Remaining whole seconds
    pub const fn remaining_secs(&self) -> i64 {
        self.0
    }

    /// Remaining time as a duration
    pub fn as_duration(&self) -> Duration {
        Duration::seconds(self.0)
    }

    /// Whether the countdown has reached zero
    pub const fn is_elapsed(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Countdown {
    /// `HH:MM:SS`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.0;
        write!(f, "{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Outcome of evaluating a subject's entitlement to a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub course_id: CourseId,
    pub access_type: AccessType,
    pub allowed: bool,
    pub tier: AccessTier,
    /// The single resource a demo tier unlocks
    pub unlocked_resource: Option<ResourceId>,
    /// Every resource of `access_type` the subject may open
    pub accessible: Vec<ResourceId>,
    pub expires_at: Option<DateTime<Utc>>,
    pub countdown: Option<Countdown>,
    pub denial: Option<DenialReason>,
    /// Client should drop any cached demo unlock for this course
    pub clear_demo_state: bool,
}

impl AccessDecision {
    /// Full access to every listed resource
    pub fn full(
        course_id: CourseId,
        access_type: AccessType,
        tier: AccessTier,
        resources: Vec<ResourceId>,
    ) -> Self {
        Self {
            course_id,
            access_type,
            allowed: true,
            tier,
            unlocked_resource: None,
            accessible: resources,
            expires_at: None,
            countdown: None,
            denial: None,
            clear_demo_state: tier == AccessTier::Paid,
        }
    }

    /// Access limited to at most one resource until `expires_at`
    pub fn single(
        course_id: CourseId,
        access_type: AccessType,
        tier: AccessTier,
        resource: Option<ResourceId>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            course_id,
            access_type,
            allowed: true,
            tier,
            unlocked_resource: resource,
            accessible: resource.into_iter().collect(),
            expires_at: Some(expires_at),
            countdown: Some(Countdown::until(expires_at, now)),
            denial: None,
            clear_demo_state: false,
        }
    }

    /// No access
    pub fn denied(course_id: CourseId, access_type: AccessType, reason: DenialReason) -> Self {
        Self {
            course_id,
            access_type,
            allowed: false,
            tier: AccessTier::Locked,
            unlocked_resource: None,
            accessible: Vec::new(),
            expires_at: None,
            countdown: None,
            denial: Some(reason),
            clear_demo_state: false,
        }
    }

    /// Ask the client to drop cached demo state
    #[must_use]
    pub fn clearing_demo_state(mut self) -> Self {
        self.clear_demo_state = true;
        self
    }

    /// Record when the (now expired) window closed
    #[must_use]
    pub fn expired_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self.countdown = Some(Countdown(0));
        self
    }

    /// Whether `resource` may be played or booked under this decision
    pub fn can_access(&self, resource: ResourceId) -> bool {
        self.allowed && self.accessible.contains(&resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_display() {
        let now = Utc::now();
        let countdown = Countdown::until(now + Duration::seconds(23 * 3600 + 61), now);
        assert_eq!(countdown.to_string(), "23:01:01");
        assert_eq!(countdown.remaining_secs(), 82_861);
    }

    #[test]
    fn test_countdown_clamps() {
        let now = Utc::now();
        let countdown = Countdown::until(now - Duration::minutes(5), now);
        assert!(countdown.is_elapsed());
        assert_eq!(countdown.to_string(), "00:00:00");
    }

    #[test]
    fn test_single_access() {
        let now = Utc::now();
        let unlocked = ResourceId::new();
        let decision = AccessDecision::single(
            CourseId::new(),
            AccessType::LectureRecording,
            AccessTier::Demo,
            Some(unlocked),
            now + Duration::hours(2),
            now,
        );

        assert!(decision.can_access(unlocked));
        assert!(!decision.can_access(ResourceId::new()));
        assert_eq!(decision.countdown.unwrap().as_duration(), Duration::hours(2));
    }

    #[test]
    fn test_denied_locks_everything() {
        let decision = AccessDecision::denied(
            CourseId::new(),
            AccessType::LiveClass,
            DenialReason::UpgradeRequired,
        );
        assert!(!decision.allowed);
        assert_eq!(decision.tier, AccessTier::Locked);
        assert!(decision.accessible.is_empty());
    }

    #[test]
    fn test_paid_clears_demo_state() {
        let decision = AccessDecision::full(
            CourseId::new(),
            AccessType::LectureRecording,
            AccessTier::Paid,
            vec![],
        );
        assert!(decision.clear_demo_state);
        assert!(decision.countdown.is_none());
    }
}
