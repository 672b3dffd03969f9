//! Database connection pool and schema migrations

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::DbResult;

/// Database connection pool type alias
pub type DbPool = PgPool;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a new database connection pool
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &DbPool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Applied versus bundled migration version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatus {
    /// Latest migration recorded as applied in the database
    pub applied: Option<i64>,
    /// Latest migration shipped with this build
    pub expected: Option<i64>,
}

impl SchemaStatus {
    /// Whether every bundled migration has been applied
    pub fn is_current(&self) -> bool {
        self.applied >= self.expected
    }
}

/// Read the schema version, which also proves the pool can reach the database
pub async fn schema_status(pool: &DbPool) -> DbResult<SchemaStatus> {
    let applied: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await?;

    Ok(SchemaStatus {
        applied,
        expected: MIGRATOR.iter().map(|m| m.version).max(),
    })
}
