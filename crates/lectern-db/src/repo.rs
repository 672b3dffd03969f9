//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use lectern_types::{AccessType, EnrollmentKind, Plan, SubscriptionStatus};

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Insert the user on first sight, refreshing the email otherwise.
    /// An existing role is never changed.
    async fn ensure(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Update a user's role
    async fn update_role(&self, id: Uuid, role: &str) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub email: String,
}

/// Course and course resource repository trait
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Find a course by ID
    async fn find_course(&self, id: Uuid) -> DbResult<Option<CourseRow>>;

    /// Find a resource by ID
    async fn find_resource(&self, id: Uuid) -> DbResult<Option<ResourceRow>>;

    /// List a course's resources of one type, oldest first
    async fn list_resources(&self, course_id: Uuid, access_type: &str)
        -> DbResult<Vec<ResourceRow>>;

    /// Add a resource to a course
    async fn create_resource(&self, resource: CreateResource) -> DbResult<ResourceRow>;
}

/// Create resource input
#[derive(Debug, Clone)]
pub struct CreateResource {
    pub id: Uuid,
    pub course_id: Uuid,
    pub access_type: AccessType,
    pub title: String,
}

/// Enrollment repository trait
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Find a student's enrollment in a course
    async fn find(&self, student_id: Uuid, course_id: Uuid) -> DbResult<Option<EnrollmentRow>>;

    /// Record an enrollment.
    ///
    /// A paid enrollment upgrades an existing demo enrollment in place and
    /// deletes the student's demo grants for the course in the same
    /// transaction. A demo enrollment never downgrades a paid one.
    async fn enroll(&self, enrollment: CreateEnrollment) -> DbResult<EnrollmentRow>;
}

/// Create enrollment input
#[derive(Debug, Clone)]
pub struct CreateEnrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub kind: EnrollmentKind,
}

/// Demo grant repository trait
#[async_trait]
pub trait DemoGrantRepository: Send + Sync {
    /// Find a grant by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DemoGrantRow>>;

    /// Find the grant for (user, course, access type)
    async fn find_for(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        access_type: &str,
    ) -> DbResult<Option<DemoGrantRow>>;

    /// List all grants for a course, newest first
    async fn list_by_course(&self, course_id: Uuid) -> DbResult<Vec<DemoGrantRow>>;

    /// Start a demo: ensure a demo enrollment exists and insert the grant,
    /// both in one transaction.
    ///
    /// Returns the stored grant and whether it was created by this call. An
    /// existing grant for the same (user, course, access type) is returned
    /// unchanged.
    async fn start(&self, grant: CreateDemoGrant) -> DbResult<(DemoGrantRow, bool)>;

    /// Pin the resource a grant unlocks
    async fn set_resource(&self, id: Uuid, resource_id: Uuid) -> DbResult<DemoGrantRow>;

    /// Hard-delete a grant; returns false if nothing was deleted
    async fn delete(&self, id: Uuid) -> DbResult<bool>;
}

/// Create demo grant input
#[derive(Debug, Clone)]
pub struct CreateDemoGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub access_type: AccessType,
    pub resource_id: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// List a student's subscriptions, newest first
    async fn list_by_student(&self, student_id: Uuid) -> DbResult<Vec<SubscriptionRow>>;

    /// Create a new subscription (status `pending_approval`)
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Move a subscription from `from` to `to`.
    ///
    /// Fails with `DbError::Conflict` if the stored status is no longer
    /// `from`, so two admins acting at once cannot both win.
    async fn transition(&self, change: StatusChange) -> DbResult<SubscriptionRow>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub plan: Plan,
    pub price_cents: i64,
}

/// Subscription status change input
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub id: Uuid,
    pub from: SubscriptionStatus,
    pub to: SubscriptionStatus,
    /// Replaces the stored period when set
    pub period: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Entitlement snapshot repository trait
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Read enrollment, best subscription and demo grant for one decision
    /// in a single read-only transaction.
    async fn load_snapshot(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        access_type: &str,
    ) -> DbResult<SnapshotRows>;
}
