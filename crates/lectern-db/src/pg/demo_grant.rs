//! PostgreSQL demo grant repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::DemoGrantRow;
use crate::repo::{CreateDemoGrant, DemoGrantRepository};

/// PostgreSQL demo grant repository
#[derive(Clone)]
pub struct PgDemoGrantRepository {
    pool: PgPool,
}

impl PgDemoGrantRepository {
    /// Create a new demo grant repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DemoGrantRepository for PgDemoGrantRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DemoGrantRow>> {
        let grant = sqlx::query_as::<_, DemoGrantRow>(
            r#"
            SELECT id, user_id, course_id, access_type, resource_id, granted_at, expires_at
            FROM demo_grants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(grant)
    }

    async fn find_for(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        access_type: &str,
    ) -> DbResult<Option<DemoGrantRow>> {
        let grant = sqlx::query_as::<_, DemoGrantRow>(
            r#"
            SELECT id, user_id, course_id, access_type, resource_id, granted_at, expires_at
            FROM demo_grants
            WHERE user_id = $1 AND course_id = $2 AND access_type = $3
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(access_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(grant)
    }

    async fn list_by_course(&self, course_id: Uuid) -> DbResult<Vec<DemoGrantRow>> {
        let grants = sqlx::query_as::<_, DemoGrantRow>(
            r#"
            SELECT id, user_id, course_id, access_type, resource_id, granted_at, expires_at
            FROM demo_grants
            WHERE course_id = $1
            ORDER BY granted_at DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }

    async fn start(&self, grant: CreateDemoGrant) -> DbResult<(DemoGrantRow, bool)> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO enrollments (id, student_id, course_id, kind)
            VALUES ($1, $2, $3, 'demo')
            ON CONFLICT (student_id, course_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(grant.user_id)
        .bind(grant.course_id)
        .execute(&mut *tx)
        .await?;

        let inserted = sqlx::query_as::<_, DemoGrantRow>(
            r#"
            INSERT INTO demo_grants (id, user_id, course_id, access_type, resource_id,
                                     granted_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, course_id, access_type) DO NOTHING
            RETURNING id, user_id, course_id, access_type, resource_id, granted_at, expires_at
            "#,
        )
        .bind(grant.id)
        .bind(grant.user_id)
        .bind(grant.course_id)
        .bind(grant.access_type.as_str())
        .bind(grant.resource_id)
        .bind(grant.granted_at)
        .bind(grant.expires_at)
        .fetch_optional(&mut *tx)
        .await?;

        let result = match inserted {
            Some(row) => (row, true),
            None => {
                let existing = sqlx::query_as::<_, DemoGrantRow>(
                    r#"
                    SELECT id, user_id, course_id, access_type, resource_id, granted_at, expires_at
                    FROM demo_grants
                    WHERE user_id = $1 AND course_id = $2 AND access_type = $3
                    "#,
                )
                .bind(grant.user_id)
                .bind(grant.course_id)
                .bind(grant.access_type.as_str())
                .fetch_one(&mut *tx)
                .await?;
                (existing, false)
            }
        };

        tx.commit().await?;
        Ok(result)
    }

    async fn set_resource(&self, id: Uuid, resource_id: Uuid) -> DbResult<DemoGrantRow> {
        sqlx::query_as::<_, DemoGrantRow>(
            r#"
            UPDATE demo_grants SET resource_id = $1
            WHERE id = $2
            RETURNING id, user_id, course_id, access_type, resource_id, granted_at, expires_at
            "#,
        )
        .bind(resource_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM demo_grants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
