//! PostgreSQL repository implementations

mod course;
mod demo_grant;
mod enrollment;
mod snapshot;
mod subscription;
mod user;

pub use course::PgCourseRepository;
pub use demo_grant::PgDemoGrantRepository;
pub use enrollment::PgEnrollmentRepository;
pub use snapshot::PgSnapshotRepository;
pub use subscription::PgSubscriptionRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub courses: PgCourseRepository,
    pub enrollments: PgEnrollmentRepository,
    pub demo_grants: PgDemoGrantRepository,
    pub subscriptions: PgSubscriptionRepository,
    pub snapshots: PgSnapshotRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            courses: PgCourseRepository::new(pool.clone()),
            enrollments: PgEnrollmentRepository::new(pool.clone()),
            demo_grants: PgDemoGrantRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            snapshots: PgSnapshotRepository::new(pool),
        }
    }
}
