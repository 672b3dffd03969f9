//! Mock repositories for testing
//!
//! One in-memory store implements every repository trait so that the
//! snapshot read sees the rows the other repositories wrote.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use lectern_access_core::AccessStores;
use lectern_db::{
    CourseRepository, CourseRow, CreateDemoGrant, CreateEnrollment, CreateResource,
    CreateSubscription, CreateUser, DbError, DbResult, DemoGrantRepository, DemoGrantRow,
    EnrollmentRepository, EnrollmentRow, ResourceRow, SnapshotRepository, SnapshotRows,
    StatusChange, SubscriptionRepository, SubscriptionRow, UserRepository, UserRow,
};
use lectern_types::{AccessType, EnrollmentKind, Role};

/// In-memory store backing all repositories
#[derive(Default, Clone)]
pub struct MockStore {
    users: Arc<DashMap<Uuid, UserRow>>,
    courses: Arc<DashMap<Uuid, CourseRow>>,
    resources: Arc<DashMap<Uuid, ResourceRow>>,
    /// Keyed by (student_id, course_id)
    enrollments: Arc<DashMap<(Uuid, Uuid), EnrollmentRow>>,
    demo_grants: Arc<DashMap<Uuid, DemoGrantRow>>,
    subscriptions: Arc<DashMap<Uuid, SubscriptionRow>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores for an access service, all backed by this store
    pub fn stores(&self) -> AccessStores {
        let store = Arc::new(self.clone());
        AccessStores {
            users: store.clone(),
            courses: store.clone(),
            enrollments: store.clone(),
            demo_grants: store.clone(),
            subscriptions: store.clone(),
            snapshots: store,
        }
    }

    /// Insert a user with the given role
    pub fn insert_user(&self, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        self.users.insert(
            id,
            UserRow {
                id,
                email: format!("user-{id}@example.com"),
                role: role.as_str().to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
        id
    }

    /// Insert a course
    pub fn insert_course(&self, title: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.courses.insert(
            id,
            CourseRow {
                id,
                title: title.to_string(),
                teacher_id: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    /// Insert a resource with an explicit creation time
    pub fn insert_resource(
        &self,
        course_id: Uuid,
        access_type: AccessType,
        title: &str,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.resources.insert(
            id,
            ResourceRow {
                id,
                course_id,
                access_type: access_type.as_str().to_string(),
                title: title.to_string(),
                created_at,
            },
        );
        id
    }

    /// Number of demo grants stored
    #[allow(dead_code)]
    pub fn demo_grant_count(&self) -> usize {
        self.demo_grants.len()
    }

    /// Stored role of a user
    #[allow(dead_code)]
    pub fn role_of(&self, id: Uuid) -> Option<String> {
        self.users.get(&id).map(|u| u.role.clone())
    }

    fn grant_for(&self, user_id: Uuid, course_id: Uuid, access_type: &str) -> Option<DemoGrantRow> {
        self.demo_grants
            .iter()
            .find(|g| g.user_id == user_id && g.course_id == course_id && g.access_type == access_type)
            .map(|g| g.value().clone())
    }
}

#[async_trait]
impl UserRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn ensure(&self, user: CreateUser) -> DbResult<UserRow> {
        let now = Utc::now();
        let mut entry = self.users.entry(user.id).or_insert_with(|| UserRow {
            id: user.id,
            email: user.email.clone(),
            role: "student".to_string(),
            created_at: now,
            updated_at: now,
        });
        entry.email = user.email;
        Ok(entry.value().clone())
    }

    async fn update_role(&self, id: Uuid, role: &str) -> DbResult<()> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.role = role.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for MockStore {
    async fn find_course(&self, id: Uuid) -> DbResult<Option<CourseRow>> {
        Ok(self.courses.get(&id).map(|r| r.value().clone()))
    }

    async fn find_resource(&self, id: Uuid) -> DbResult<Option<ResourceRow>> {
        Ok(self.resources.get(&id).map(|r| r.value().clone()))
    }

    async fn list_resources(&self, course_id: Uuid, access_type: &str) -> DbResult<Vec<ResourceRow>> {
        let mut rows: Vec<ResourceRow> = self
            .resources
            .iter()
            .filter(|r| r.course_id == course_id && r.access_type == access_type)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }

    async fn create_resource(&self, resource: CreateResource) -> DbResult<ResourceRow> {
        let row = ResourceRow {
            id: resource.id,
            course_id: resource.course_id,
            access_type: resource.access_type.as_str().to_string(),
            title: resource.title,
            created_at: Utc::now(),
        };
        self.resources.insert(row.id, row.clone());
        Ok(row)
    }
}

#[async_trait]
impl EnrollmentRepository for MockStore {
    async fn find(&self, student_id: Uuid, course_id: Uuid) -> DbResult<Option<EnrollmentRow>> {
        Ok(self
            .enrollments
            .get(&(student_id, course_id))
            .map(|r| r.value().clone()))
    }

    async fn enroll(&self, enrollment: CreateEnrollment) -> DbResult<EnrollmentRow> {
        let key = (enrollment.student_id, enrollment.course_id);
        let mut entry = self.enrollments.entry(key).or_insert_with(|| EnrollmentRow {
            id: enrollment.id,
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            kind: enrollment.kind.as_str().to_string(),
            created_at: Utc::now(),
        });
        if enrollment.kind == EnrollmentKind::Paid {
            entry.kind = "paid".to_string();
        }
        let row = entry.value().clone();
        drop(entry);

        if enrollment.kind == EnrollmentKind::Paid {
            self.demo_grants.retain(|_, g| {
                !(g.user_id == enrollment.student_id && g.course_id == enrollment.course_id)
            });
        }
        Ok(row)
    }
}

#[async_trait]
impl DemoGrantRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DemoGrantRow>> {
        Ok(self.demo_grants.get(&id).map(|r| r.value().clone()))
    }

    async fn find_for(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        access_type: &str,
    ) -> DbResult<Option<DemoGrantRow>> {
        Ok(self.grant_for(user_id, course_id, access_type))
    }

    async fn list_by_course(&self, course_id: Uuid) -> DbResult<Vec<DemoGrantRow>> {
        let mut rows: Vec<DemoGrantRow> = self
            .demo_grants
            .iter()
            .filter(|g| g.course_id == course_id)
            .map(|g| g.value().clone())
            .collect();
        rows.sort_by(|a, b| b.granted_at.cmp(&a.granted_at));
        Ok(rows)
    }

    async fn start(&self, grant: CreateDemoGrant) -> DbResult<(DemoGrantRow, bool)> {
        self.enrollments
            .entry((grant.user_id, grant.course_id))
            .or_insert_with(|| EnrollmentRow {
                id: Uuid::new_v4(),
                student_id: grant.user_id,
                course_id: grant.course_id,
                kind: "demo".to_string(),
                created_at: grant.granted_at,
            });

        let access_type = grant.access_type.as_str();
        if let Some(existing) = self.grant_for(grant.user_id, grant.course_id, access_type) {
            return Ok((existing, false));
        }

        let row = DemoGrantRow {
            id: grant.id,
            user_id: grant.user_id,
            course_id: grant.course_id,
            access_type: access_type.to_string(),
            resource_id: grant.resource_id,
            granted_at: grant.granted_at,
            expires_at: grant.expires_at,
        };
        self.demo_grants.insert(row.id, row.clone());
        Ok((row, true))
    }

    async fn set_resource(&self, id: Uuid, resource_id: Uuid) -> DbResult<DemoGrantRow> {
        let mut grant = self.demo_grants.get_mut(&id).ok_or(DbError::NotFound)?;
        grant.resource_id = Some(resource_id);
        Ok(grant.value().clone())
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        Ok(self.demo_grants.remove(&id).is_some())
    }
}

#[async_trait]
impl SubscriptionRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.subscriptions.get(&id).map(|r| r.value().clone()))
    }

    async fn list_by_student(&self, student_id: Uuid) -> DbResult<Vec<SubscriptionRow>> {
        let mut rows: Vec<SubscriptionRow> = self
            .subscriptions
            .iter()
            .filter(|s| s.student_id == student_id)
            .map(|s| s.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = SubscriptionRow {
            id: sub.id,
            student_id: sub.student_id,
            course_id: sub.course_id,
            plan: sub.plan.as_str().to_string(),
            status: "pending_approval".to_string(),
            starts_at: None,
            expires_at: None,
            price_cents: sub.price_cents,
            created_at: Utc::now(),
        };
        self.subscriptions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn transition(&self, change: StatusChange) -> DbResult<SubscriptionRow> {
        let mut sub = self
            .subscriptions
            .get_mut(&change.id)
            .ok_or(DbError::NotFound)?;
        if sub.status != change.from.as_str() {
            return Err(DbError::Conflict("subscription status changed".to_string()));
        }
        sub.status = change.to.as_str().to_string();
        if let Some((starts_at, expires_at)) = change.period {
            sub.starts_at = Some(starts_at);
            sub.expires_at = Some(expires_at);
        }
        Ok(sub.value().clone())
    }
}

#[async_trait]
impl SnapshotRepository for MockStore {
    async fn load_snapshot(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        access_type: &str,
    ) -> DbResult<SnapshotRows> {
        let mut subscriptions: Vec<SubscriptionRow> = self
            .subscriptions
            .iter()
            .filter(|s| s.student_id == student_id && s.course_id == course_id)
            .map(|s| s.value().clone())
            .collect();
        subscriptions.sort_by(|a, b| {
            (b.status == "active")
                .cmp(&(a.status == "active"))
                .then(b.expires_at.cmp(&a.expires_at))
                .then(b.created_at.cmp(&a.created_at))
        });

        Ok(SnapshotRows {
            enrollment: self
                .enrollments
                .get(&(student_id, course_id))
                .map(|r| r.value().clone()),
            subscription: subscriptions.into_iter().next(),
            demo_grant: self.grant_for(student_id, course_id, access_type),
        })
    }
}

/// Snapshot repository whose reads always fail
#[derive(Default, Clone)]
pub struct FailingSnapshots;

#[async_trait]
impl SnapshotRepository for FailingSnapshots {
    async fn load_snapshot(&self, _: Uuid, _: Uuid, _: &str) -> DbResult<SnapshotRows> {
        Err(DbError::Decode("connection reset".to_string()))
    }
}

/// Snapshot repository that never answers within a test's timeout
#[derive(Clone)]
pub struct StalledSnapshots(pub Duration);

#[async_trait]
impl SnapshotRepository for StalledSnapshots {
    async fn load_snapshot(&self, _: Uuid, _: Uuid, _: &str) -> DbResult<SnapshotRows> {
        tokio::time::sleep(self.0).await;
        Ok(SnapshotRows::default())
    }
}
