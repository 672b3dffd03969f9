//! Shared handler utilities
//!
//! Parsing of path, query and body fields into domain types, plus the
//! metrics helper every handler uses.

use std::time::Instant;

use lectern_types::{AccessType, EnrollmentKind, Plan, Role};

use crate::error::ApiError;

// ============================================================================
// Input Parsing
// ============================================================================

/// Parse a UUID-backed identifier
pub fn parse_id<T: From<uuid::Uuid>>(raw: &str, field: &'static str) -> Result<T, ApiError> {
    uuid::Uuid::parse_str(raw.trim())
        .map(T::from)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {field}")))
}

pub fn parse_access_type(raw: &str) -> Result<AccessType, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid accessType: {raw}")))
}

pub fn parse_plan(raw: &str) -> Result<Plan, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid plan: {raw}")))
}

pub fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid role: {raw}")))
}

pub fn parse_enrollment_kind(raw: &str) -> Result<EnrollmentKind, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid enrollment kind: {raw}")))
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record handler duration with result label.
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "lectern_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_types::CourseId;

    #[test]
    fn test_parse_id() {
        let id = uuid::Uuid::new_v4();
        let parsed: CourseId = parse_id(&id.to_string(), "courseId").unwrap();
        assert_eq!(parsed.0, id);

        let err = parse_id::<CourseId>("not-a-uuid", "courseId").unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Invalid courseId");
    }

    #[test]
    fn test_parse_access_type() {
        assert_eq!(
            parse_access_type("lecture_recording").unwrap(),
            AccessType::LectureRecording
        );
        assert_eq!(parse_access_type(" live_class ").unwrap(), AccessType::LiveClass);
        assert!(parse_access_type("podcast").is_err());
    }

    #[test]
    fn test_parse_plan_and_role() {
        assert_eq!(parse_plan("yearly").unwrap(), Plan::Yearly);
        assert!(parse_plan("weekly").is_err());
        assert_eq!(parse_role("superadmin").unwrap(), Role::SuperAdmin);
        assert!(parse_role("owner").is_err());
        assert_eq!(parse_enrollment_kind("paid").unwrap(), EnrollmentKind::Paid);
    }
}
