//! PostgreSQL enrollment repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use lectern_types::EnrollmentKind;

use crate::error::DbResult;
use crate::models::EnrollmentRow;
use crate::repo::{CreateEnrollment, EnrollmentRepository};

/// PostgreSQL enrollment repository
#[derive(Clone)]
pub struct PgEnrollmentRepository {
    pool: PgPool,
}

impl PgEnrollmentRepository {
    /// Create a new enrollment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for PgEnrollmentRepository {
    async fn find(&self, student_id: Uuid, course_id: Uuid) -> DbResult<Option<EnrollmentRow>> {
        let enrollment = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT id, student_id, course_id, kind, created_at
            FROM enrollments
            WHERE student_id = $1 AND course_id = $2
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    async fn enroll(&self, enrollment: CreateEnrollment) -> DbResult<EnrollmentRow> {
        let mut tx = self.pool.begin().await?;

        let row = match enrollment.kind {
            EnrollmentKind::Paid => {
                let row = sqlx::query_as::<_, EnrollmentRow>(
                    r#"
                    INSERT INTO enrollments (id, student_id, course_id, kind)
                    VALUES ($1, $2, $3, 'paid')
                    ON CONFLICT (student_id, course_id) DO UPDATE SET kind = 'paid'
                    RETURNING id, student_id, course_id, kind, created_at
                    "#,
                )
                .bind(enrollment.id)
                .bind(enrollment.student_id)
                .bind(enrollment.course_id)
                .fetch_one(&mut *tx)
                .await?;

                let cleared =
                    sqlx::query("DELETE FROM demo_grants WHERE user_id = $1 AND course_id = $2")
                        .bind(enrollment.student_id)
                        .bind(enrollment.course_id)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();

                if cleared > 0 {
                    tracing::debug!(
                        student_id = %enrollment.student_id,
                        course_id = %enrollment.course_id,
                        cleared,
                        "Cleared demo grants on paid enrollment"
                    );
                }

                row
            }
            // Existing rows (including paid ones) are returned untouched
            EnrollmentKind::Demo => {
                sqlx::query_as::<_, EnrollmentRow>(
                    r#"
                    INSERT INTO enrollments (id, student_id, course_id, kind)
                    VALUES ($1, $2, $3, 'demo')
                    ON CONFLICT (student_id, course_id) DO UPDATE SET kind = enrollments.kind
                    RETURNING id, student_id, course_id, kind, created_at
                    "#,
                )
                .bind(enrollment.id)
                .bind(enrollment.student_id)
                .bind(enrollment.course_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(row)
    }
}
