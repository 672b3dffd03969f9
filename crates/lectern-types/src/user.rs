//! User types

use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

uuid_id!(
    /// Unique user identifier (the hosted auth service's `sub`)
    UserId
);

uuid_id!(
    /// Identifier minted for an unauthenticated visitor's demo token
    GuestId
);

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Learner; content access goes through enrollment, subscription or demo
    #[default]
    Student,
    /// Course author
    Teacher,
    /// Administrator
    Admin,
    /// Super administrator, may override which resource a demo unlocks
    SuperAdmin,
}

impl Role {
    /// Get the role name as stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
            Self::SuperAdmin => "superadmin",
        }
    }

    /// Whether this role bypasses enrollment/subscription/demo checks
    pub const fn is_staff(&self) -> bool {
        !matches!(self, Self::Student)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "teacher" | "instructor" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            "superadmin" | "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::Student, Role::Teacher, Role::Admin, Role::SuperAdmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("SuperAdmin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_staff_roles() {
        assert!(!Role::Student.is_staff());
        assert!(Role::Teacher.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(Role::SuperAdmin.is_staff());
    }

    #[test]
    fn test_user_id_parse() {
        let id = UserId::new();
        assert_eq!(UserId::parse(&id.to_string()).unwrap(), id);
        assert!(UserId::parse("not-a-uuid").is_err());
    }
}
