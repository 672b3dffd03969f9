//! Capability sets resolved from a role
//!
//! Handlers ask "may this caller do X" through a [`CapabilitySet`] built
//! once per request, instead of comparing role strings.

use serde::{Deserialize, Serialize};

use crate::Role;

/// A single permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Bypass enrollment/subscription/demo gating
    ViewAllContent,
    /// Add lecture recordings and live classes
    ManageResources,
    /// Create enrollments and change user roles
    ManageEnrollments,
    /// Grant, list and revoke demo access
    ManageDemoGrants,
    /// Approve, reject and expire subscriptions
    ApproveSubscriptions,
    /// Override which resource a demo grant unlocks
    PinDemoResource,
    /// Appoint or demote superadmins
    ManageSuperadmins,
}

impl Capability {
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of capabilities held by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// An empty set (students and guests)
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Resolve the capabilities a role carries
    pub fn for_role(role: Role) -> Self {
        use Capability::*;

        let granted: &[Capability] = match role {
            Role::Student => &[],
            Role::Teacher => &[ViewAllContent, ManageResources],
            Role::Admin => &[
                ViewAllContent,
                ManageResources,
                ManageEnrollments,
                ManageDemoGrants,
                ApproveSubscriptions,
            ],
            Role::SuperAdmin => &[
                ViewAllContent,
                ManageResources,
                ManageEnrollments,
                ManageDemoGrants,
                ApproveSubscriptions,
                PinDemoResource,
                ManageSuperadmins,
            ],
        };

        granted.iter().fold(Self::empty(), |set, cap| set.with(*cap))
    }

    /// Add a capability
    #[must_use]
    pub const fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    /// Check if the set contains a capability
    pub const fn has(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Whether the set is empty
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<Role> for CapabilitySet {
    fn from(role: Role) -> Self {
        Self::for_role(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_has_nothing() {
        assert!(CapabilitySet::for_role(Role::Student).is_empty());
    }

    #[test]
    fn test_staff_view_all_content() {
        for role in [Role::Teacher, Role::Admin, Role::SuperAdmin] {
            assert!(CapabilitySet::for_role(role).has(Capability::ViewAllContent));
        }
    }

    #[test]
    fn test_only_superadmin_pins() {
        assert!(!CapabilitySet::for_role(Role::Admin).has(Capability::PinDemoResource));
        assert!(CapabilitySet::for_role(Role::SuperAdmin).has(Capability::PinDemoResource));
    }

    #[test]
    fn test_only_superadmin_manages_superadmins() {
        for role in [Role::Student, Role::Teacher, Role::Admin] {
            assert!(!CapabilitySet::for_role(role).has(Capability::ManageSuperadmins));
        }
        assert!(CapabilitySet::for_role(Role::SuperAdmin).has(Capability::ManageSuperadmins));
    }

    #[test]
    fn test_teacher_cannot_manage_demos() {
        let caps = CapabilitySet::for_role(Role::Teacher);
        assert!(caps.has(Capability::ManageResources));
        assert!(!caps.has(Capability::ManageDemoGrants));
        assert!(!caps.has(Capability::ApproveSubscriptions));
    }
}
