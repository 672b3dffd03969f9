//! Subscription types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{CourseId, InvalidTransition, ParseEnumError, UserId};

uuid_id!(
    /// Unique subscription identifier
    SubscriptionId
);

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Approved and (until `expires_at`) granting access
    Active,
    /// Checkout submitted, waiting for an admin to verify payment
    PendingApproval,
    /// Ended by an admin
    Expired,
    /// Payment could not be verified
    Rejected,
}

impl SubscriptionStatus {
    /// Get the status as stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingApproval => "pending_approval",
            Self::Expired => "expired",
            Self::Rejected => "rejected",
        }
    }

    /// Admin-driven transitions; there is no automatic renewal.
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingApproval, Self::Active)
                | (Self::PendingApproval, Self::Rejected)
                | (Self::Active, Self::Expired)
        )
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "pending_approval" | "pending" => Ok(Self::PendingApproval),
            "expired" => Ok(Self::Expired),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseEnumError::new("subscription status", s)),
        }
    }
}

/// Billing plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// 30 days
    Monthly,
    /// 90 days
    Quarterly,
    /// 365 days
    Yearly,
}

impl Plan {
    /// Get the plan name as stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Length of the access period granted on approval
    pub fn duration(&self) -> Duration {
        match self {
            Self::Monthly => Duration::days(30),
            Self::Quarterly => Duration::days(90),
            Self::Yearly => Duration::days(365),
        }
    }

    /// List price in cents
    pub const fn price_cents(&self) -> i64 {
        match self {
            Self::Monthly => 1_999,
            Self::Quarterly => 4_999,
            Self::Yearly => 14_999,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" | "month" => Ok(Self::Monthly),
            "quarterly" | "quarter" => Ok(Self::Quarterly),
            "yearly" | "annual" | "year" => Ok(Self::Yearly),
            _ => Err(ParseEnumError::new("plan", s)),
        }
    }
}

/// Student subscription to a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    /// Set on approval
    pub starts_at: Option<DateTime<Utc>>,
    /// Set on approval
    pub expires_at: Option<DateTime<Utc>>,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Active means status == active AND now < expires_at
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active
            && self.expires_at.is_some_and(|end| now < end)
    }

    /// Validate a status change
    pub fn check_transition(&self, next: SubscriptionStatus) -> Result<(), InvalidTransition> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: SubscriptionStatus, expires_at: Option<DateTime<Utc>>) -> Subscription {
        Subscription {
            id: SubscriptionId::new(),
            student_id: UserId::new(),
            course_id: CourseId::new(),
            plan: Plan::Monthly,
            status,
            starts_at: None,
            expires_at,
            price_cents: Plan::Monthly.price_cents(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_active_requires_status_and_window() {
        let now = Utc::now();
        let later = Some(now + Duration::days(1));

        assert!(subscription(SubscriptionStatus::Active, later).is_active(now));
        assert!(!subscription(SubscriptionStatus::Active, Some(now)).is_active(now));
        assert!(!subscription(SubscriptionStatus::Active, None).is_active(now));
        assert!(!subscription(SubscriptionStatus::PendingApproval, later).is_active(now));
        assert!(!subscription(SubscriptionStatus::Expired, later).is_active(now));
    }

    #[test]
    fn test_transitions() {
        use SubscriptionStatus::*;

        assert!(PendingApproval.can_transition_to(Active));
        assert!(PendingApproval.can_transition_to(Rejected));
        assert!(Active.can_transition_to(Expired));

        assert!(!Active.can_transition_to(PendingApproval));
        assert!(!Rejected.can_transition_to(Active));
        assert!(!Expired.can_transition_to(Active));
        assert!(!PendingApproval.can_transition_to(Expired));

        let err = subscription(Rejected, None).check_transition(Active).unwrap_err();
        assert_eq!(err.to_string(), "cannot move subscription from rejected to active");
    }

    #[test]
    fn test_plan_parse_and_duration() {
        assert_eq!("annual".parse::<Plan>().unwrap(), Plan::Yearly);
        assert_eq!(Plan::Quarterly.duration(), Duration::days(90));
        assert!("weekly".parse::<Plan>().is_err());
    }
}
