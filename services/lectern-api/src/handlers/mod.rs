//! REST API handlers

pub mod access;
pub mod admin;
pub mod demo;
pub mod health;
pub mod resource;
pub mod shared;
pub mod subscription;

pub use access::*;
pub use admin::*;
pub use demo::*;
pub use health::*;
pub use resource::*;
pub use subscription::*;
