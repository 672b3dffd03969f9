//! PostgreSQL entitlement snapshot implementation
//!
//! The three lookups behind one access decision run inside a single
//! `REPEATABLE READ` read-only transaction, so an admin revoking a grant or
//! approving a subscription is seen either entirely or not at all.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{DemoGrantRow, EnrollmentRow, SnapshotRows, SubscriptionRow};
use crate::repo::SnapshotRepository;

/// PostgreSQL snapshot repository
#[derive(Clone)]
pub struct PgSnapshotRepository {
    pool: PgPool,
}

impl PgSnapshotRepository {
    /// Create a new snapshot repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotRepository for PgSnapshotRepository {
    async fn load_snapshot(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        access_type: &str,
    ) -> DbResult<SnapshotRows> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let enrollment = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT id, student_id, course_id, kind, created_at
            FROM enrollments
            WHERE student_id = $1 AND course_id = $2
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;

        let subscription = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, student_id, course_id, plan, status, starts_at, expires_at,
                   price_cents, created_at
            FROM subscriptions
            WHERE student_id = $1 AND course_id = $2
            ORDER BY (status = 'active') DESC, expires_at DESC NULLS LAST, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;

        let demo_grant = sqlx::query_as::<_, DemoGrantRow>(
            r#"
            SELECT id, user_id, course_id, access_type, resource_id, granted_at, expires_at
            FROM demo_grants
            WHERE user_id = $1 AND course_id = $2 AND access_type = $3
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(access_type)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SnapshotRows {
            enrollment,
            subscription,
            demo_grant,
        })
    }
}
