//! Demo (trial) access grants

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccessType, CourseId, ResourceId, UserId};

uuid_id!(
    /// Unique demo grant identifier
    DemoGrantId
);

/// Default length of a demo window, in hours
pub const DEFAULT_DEMO_WINDOW_HOURS: i64 = 24;

/// Default length of a demo window
pub fn default_demo_window() -> Duration {
    Duration::hours(DEFAULT_DEMO_WINDOW_HOURS)
}

/// Whether a time-boxed grant has run out.
///
/// The interval is closed on the expired side: at exactly `expires_at`
/// access is already gone.
#[inline]
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}

/// Time-boxed, single-resource trial granted to an authenticated student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoGrant {
    pub id: DemoGrantId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub access_type: AccessType,
    /// Resource pinned by an admin; `None` means "oldest of its type"
    pub resource_id: Option<ResourceId>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DemoGrant {
    /// Check if the grant has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.expires_at, now)
    }

    /// Time left before expiry, clamped at zero
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(granted_at: DateTime<Utc>) -> DemoGrant {
        DemoGrant {
            id: DemoGrantId::new(),
            user_id: UserId::new(),
            course_id: CourseId::new(),
            access_type: AccessType::LectureRecording,
            resource_id: None,
            granted_at,
            expires_at: granted_at + default_demo_window(),
        }
    }

    #[test]
    fn test_expiry_boundary_is_closed() {
        let t = Utc::now();
        let g = grant(t);
        assert!(!g.is_expired(t));
        assert!(!g.is_expired(g.expires_at - Duration::seconds(1)));
        assert!(g.is_expired(g.expires_at));
        assert!(g.is_expired(g.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_remaining_clamps_to_zero() {
        let t = Utc::now();
        let g = grant(t);
        assert_eq!(g.remaining(t + Duration::hours(1)), Duration::hours(23));
        assert_eq!(g.remaining(t + Duration::hours(30)), Duration::zero());
    }
}
