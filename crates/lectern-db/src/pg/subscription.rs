//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::SubscriptionRow;
use crate::repo::{CreateSubscription, StatusChange, SubscriptionRepository};

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, student_id, course_id, plan, status, starts_at, expires_at,
                   price_cents, created_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn list_by_student(&self, student_id: Uuid) -> DbResult<Vec<SubscriptionRow>> {
        let subs = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, student_id, course_id, plan, status, starts_at, expires_at,
                   price_cents, created_at
            FROM subscriptions
            WHERE student_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (id, student_id, course_id, plan, price_cents)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, student_id, course_id, plan, status, starts_at, expires_at,
                      price_cents, created_at
            "#,
        )
        .bind(sub.id)
        .bind(sub.student_id)
        .bind(sub.course_id)
        .bind(sub.plan.as_str())
        .bind(sub.price_cents)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn transition(&self, change: StatusChange) -> DbResult<SubscriptionRow> {
        let (starts_at, expires_at) = change.period.unzip();

        let updated = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            UPDATE subscriptions
            SET status = $1,
                starts_at = COALESCE($2, starts_at),
                expires_at = COALESCE($3, expires_at)
            WHERE id = $4 AND status = $5
            RETURNING id, student_id, course_id, plan, status, starts_at, expires_at,
                      price_cents, created_at
            "#,
        )
        .bind(change.to.as_str())
        .bind(starts_at)
        .bind(expires_at)
        .bind(change.id)
        .bind(change.from.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => Ok(row),
            None if self.find_by_id(change.id).await?.is_some() => Err(DbError::Conflict(
                format!("subscription {} is no longer {}", change.id, change.from),
            )),
            None => Err(DbError::NotFound),
        }
    }
}
