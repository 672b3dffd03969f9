//! Common error types

use thiserror::Error;

/// Error parsing one of the string-backed domain enums
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum failed to parse (e.g. "role")
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Rejected subscription status change
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot move subscription from {from} to {to}")]
pub struct InvalidTransition {
    pub from: crate::SubscriptionStatus,
    pub to: crate::SubscriptionStatus,
}
