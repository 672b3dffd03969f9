//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Concurrent update lost the race (row changed underneath us)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored value does not map to a domain type
    #[error("invalid stored value: {0}")]
    Decode(String),
}

/// Result type for repository operations
pub type DbResult<T> = Result<T, DbError>;

impl From<lectern_types::ParseEnumError> for DbError {
    fn from(err: lectern_types::ParseEnumError) -> Self {
        Self::Decode(err.to_string())
    }
}
