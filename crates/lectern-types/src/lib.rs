//! Lectern Types - Shared domain types
//!
//! This crate contains domain types used across Lectern crates:
//! - User identity, roles and capability sets
//! - Courses, resources, enrollments and subscriptions
//! - Demo (trial) grants and access decisions

#[macro_use]
mod id;

pub mod access;
pub mod capability;
pub mod course;
pub mod demo;
pub mod enrollment;
pub mod error;
pub mod subscription;
pub mod user;

pub use access::*;
pub use capability::*;
pub use course::*;
pub use demo::*;
pub use enrollment::*;
pub use error::*;
pub use subscription::*;
pub use user::*;
