//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Enum columns are stored as text and parsed on conversion.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use lectern_types::{
    CourseResource, DemoGrant, Enrollment, EntitlementSnapshot, Role, Subscription,
};

use crate::error::DbResult;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course row from the database
#[derive(Debug, Clone, FromRow)]
pub struct CourseRow {
    pub id: Uuid,
    pub title: String,
    pub teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Course resource row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub access_type: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Enrollment row from the database
#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// Demo grant row from the database
#[derive(Debug, Clone, FromRow)]
pub struct DemoGrantRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub access_type: String,
    pub resource_id: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub plan: String,
    pub status: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Rows read together for one entitlement decision
#[derive(Debug, Clone, Default)]
pub struct SnapshotRows {
    pub enrollment: Option<EnrollmentRow>,
    pub subscription: Option<SubscriptionRow>,
    pub demo_grant: Option<DemoGrantRow>,
}

// Conversion implementations from Row types to lectern-types domain types

impl UserRow {
    /// Parse the stored role; unknown values fall back to student
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|_| {
            tracing::warn!(user_id = %self.id, role = %self.role, "Unknown role, treating as student");
            Role::Student
        })
    }
}

impl TryFrom<ResourceRow> for CourseResource {
    type Error = crate::DbError;

    fn try_from(row: ResourceRow) -> DbResult<Self> {
        Ok(Self {
            id: row.id.into(),
            course_id: row.course_id.into(),
            access_type: row.access_type.parse()?,
            title: row.title,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = crate::DbError;

    fn try_from(row: EnrollmentRow) -> DbResult<Self> {
        Ok(Self {
            id: row.id.into(),
            student_id: row.student_id.into(),
            course_id: row.course_id.into(),
            kind: row.kind.parse()?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DemoGrantRow> for DemoGrant {
    type Error = crate::DbError;

    fn try_from(row: DemoGrantRow) -> DbResult<Self> {
        Ok(Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            course_id: row.course_id.into(),
            access_type: row.access_type.parse()?,
            resource_id: row.resource_id.map(Into::into),
            granted_at: row.granted_at,
            expires_at: row.expires_at,
        })
    }
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = crate::DbError;

    fn try_from(row: SubscriptionRow) -> DbResult<Self> {
        Ok(Self {
            id: row.id.into(),
            student_id: row.student_id.into(),
            course_id: row.course_id.into(),
            plan: row.plan.parse()?,
            status: row.status.parse()?,
            starts_at: row.starts_at,
            expires_at: row.expires_at,
            price_cents: row.price_cents,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<SnapshotRows> for EntitlementSnapshot {
    type Error = crate::DbError;

    fn try_from(rows: SnapshotRows) -> DbResult<Self> {
        Ok(Self {
            enrollment: rows.enrollment.map(TryInto::try_into).transpose()?,
            subscription: rows.subscription.map(TryInto::try_into).transpose()?,
            demo_grant: rows.demo_grant.map(TryInto::try_into).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_types::{AccessType, EnrollmentKind, SubscriptionStatus};

    #[test]
    fn test_unknown_role_is_student() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            role: "owner".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(row.role(), Role::Student);
    }

    #[test]
    fn test_snapshot_conversion() {
        let student = Uuid::new_v4();
        let course = Uuid::new_v4();
        let now = Utc::now();

        let rows = SnapshotRows {
            enrollment: Some(EnrollmentRow {
                id: Uuid::new_v4(),
                student_id: student,
                course_id: course,
                kind: "demo".to_string(),
                created_at: now,
            }),
            subscription: Some(SubscriptionRow {
                id: Uuid::new_v4(),
                student_id: student,
                course_id: course,
                plan: "monthly".to_string(),
                status: "pending_approval".to_string(),
                starts_at: None,
                expires_at: None,
                price_cents: 1_999,
                created_at: now,
            }),
            demo_grant: Some(DemoGrantRow {
                id: Uuid::new_v4(),
                user_id: student,
                course_id: course,
                access_type: "live_class".to_string(),
                resource_id: None,
                granted_at: now,
                expires_at: now + chrono::Duration::hours(24),
            }),
        };

        let inputs = EntitlementSnapshot::try_from(rows).unwrap();
        assert_eq!(inputs.enrollment.unwrap().kind, EnrollmentKind::Demo);
        assert_eq!(
            inputs.subscription.unwrap().status,
            SubscriptionStatus::PendingApproval
        );
        assert_eq!(inputs.demo_grant.unwrap().access_type, AccessType::LiveClass);
    }

    #[test]
    fn test_bad_enum_is_decode_error() {
        let row = EnrollmentRow {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            kind: "free".to_string(),
            created_at: Utc::now(),
        };
        let err = Enrollment::try_from(row).unwrap_err();
        assert!(matches!(err, crate::DbError::Decode(_)));
    }
}
