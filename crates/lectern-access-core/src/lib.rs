//! Lectern Access Core - Entitlement business logic
//!
//! Decides whether a student, staff member or guest may play a lecture
//! recording or book a live class, issues the signed capability tokens
//! that carry those decisions, and verifies the hosted auth service's
//! access tokens.

pub mod capability_token;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod evaluator;
pub mod service;
pub mod token;

pub use capability_token::*;
pub use clock::*;
pub use config::*;
pub use crypto::{constant_time_eq, HmacKey, HmacKeyError};
pub use error::*;
pub use evaluator::*;
pub use service::*;
pub use token::*;
