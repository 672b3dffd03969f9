//! Course and course resource types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

uuid_id!(
    /// Unique course identifier
    CourseId
);

uuid_id!(
    /// Unique identifier of a lecture recording or live class
    ResourceId
);

/// Kind of gated course resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Pre-recorded lecture video (played)
    LectureRecording,
    /// Scheduled live class (booked)
    LiveClass,
}

impl AccessType {
    /// Get the access type as stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LectureRecording => "lecture_recording",
            Self::LiveClass => "live_class",
        }
    }
}

impl std::fmt::Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lecture_recording" | "recording" => Ok(Self::LectureRecording),
            "live_class" => Ok(Self::LiveClass),
            _ => Err(ParseEnumError::new("access type", s)),
        }
    }
}

/// A gated resource belonging to a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseResource {
    pub id: ResourceId,
    pub course_id: CourseId,
    pub access_type: AccessType,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Sort resources oldest first, ties broken by id so the order is total.
pub fn sort_chronologically(resources: &mut [CourseResource]) {
    resources.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_access_type_parse() {
        assert_eq!(
            "lecture_recording".parse::<AccessType>().unwrap(),
            AccessType::LectureRecording
        );
        assert_eq!("live_class".parse::<AccessType>().unwrap(), AccessType::LiveClass);
        assert!("quiz".parse::<AccessType>().is_err());
    }

    #[test]
    fn test_access_type_serde() {
        let json = serde_json::to_string(&AccessType::LiveClass).unwrap();
        assert_eq!(json, "\"live_class\"");
    }

    #[test]
    fn test_sort_chronologically() {
        let course_id = CourseId::new();
        let now = Utc::now();
        let resource = |age_days: i64| CourseResource {
            id: ResourceId::new(),
            course_id,
            access_type: AccessType::LectureRecording,
            title: format!("{age_days} days old"),
            created_at: now - Duration::days(age_days),
        };

        let mut resources = vec![resource(1), resource(3), resource(2)];
        sort_chronologically(&mut resources);

        let titles: Vec<_> = resources.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["3 days old", "2 days old", "1 days old"]);
    }
}
