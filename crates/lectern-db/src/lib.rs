//! Lectern DB - Database abstractions
//!
//! SQLx-based database layer for Lectern.
//!
//! # Example
//!
//! ```rust,ignore
//! use lectern_db::{create_pool, Repositories, SnapshotRepository};
//!
//! let pool = create_pool("postgres://localhost/lectern").await?;
//! let repos = Repositories::new(pool);
//!
//! let snapshot = repos
//!     .snapshots
//!     .load_snapshot(user_id, course_id, AccessType::LectureRecording)
//!     .await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, run_migrations, schema_status, DbPool, SchemaStatus};
pub use repo::*;
