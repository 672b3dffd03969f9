//! PostgreSQL course and resource repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{CourseRow, ResourceRow};
use crate::repo::{CourseRepository, CreateResource};

/// PostgreSQL course repository
#[derive(Clone)]
pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    /// Create a new course repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    async fn find_course(&self, id: Uuid) -> DbResult<Option<CourseRow>> {
        let course = sqlx::query_as::<_, CourseRow>(
            "SELECT id, title, teacher_id, created_at FROM courses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    async fn find_resource(&self, id: Uuid) -> DbResult<Option<ResourceRow>> {
        let resource = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, course_id, access_type, title, created_at
            FROM course_resources
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(resource)
    }

    async fn list_resources(
        &self,
        course_id: Uuid,
        access_type: &str,
    ) -> DbResult<Vec<ResourceRow>> {
        let resources = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, course_id, access_type, title, created_at
            FROM course_resources
            WHERE course_id = $1 AND access_type = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(course_id)
        .bind(access_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(resources)
    }

    async fn create_resource(&self, resource: CreateResource) -> DbResult<ResourceRow> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            INSERT INTO course_resources (id, course_id, access_type, title)
            VALUES ($1, $2, $3, $4)
            RETURNING id, course_id, access_type, title, created_at
            "#,
        )
        .bind(resource.id)
        .bind(resource.course_id)
        .bind(resource.access_type.as_str())
        .bind(&resource.title)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
