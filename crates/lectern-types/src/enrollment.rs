//! Enrollment types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CourseId, ParseEnumError, UserId};

uuid_id!(
    /// Unique enrollment identifier
    EnrollmentId
);

/// How a student came to be enrolled in a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentKind {
    /// Full, paid enrollment
    Paid,
    /// Trial enrollment created when a demo starts
    Demo,
}

impl EnrollmentKind {
    /// Get the kind as stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Demo => "demo",
        }
    }
}

impl std::fmt::Display for EnrollmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnrollmentKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(Self::Paid),
            "demo" => Ok(Self::Demo),
            _ => Err(ParseEnumError::new("enrollment kind", s)),
        }
    }
}

/// Student enrollment in a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub kind: EnrollmentKind,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    /// Whether this is a paid enrollment
    pub fn is_paid(&self) -> bool {
        self.kind == EnrollmentKind::Paid
    }
}
