//! Admin capability model
//!
//! Capabilities are a closed set: stored rows hold capability names as text,
//! but everything in-process works on the [`Capability`] enum and the
//! [`PermissionSet`] bitmask over it. Unknown names are rejected at admin
//! creation time and skipped with a warning when loading stored rows.

use serde::{Deserialize, Serialize};

/// A named admin privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Manage marketplace accounts
    Users,
    /// Review and override car listings
    Cars,
    /// View service-provider accounts
    Providers,
    /// Approve/reject payments and manage coupons
    Payments,
    /// Manage promotional slider content
    Ads,
}

/// Every valid capability, in bit order.
pub const ALL_CAPABILITIES: [Capability; 5] = [
    Capability::Users,
    Capability::Cars,
    Capability::Providers,
    Capability::Payments,
    Capability::Ads,
];

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Users => "users",
            Capability::Cars => "cars",
            Capability::Providers => "providers",
            Capability::Payments => "payments",
            Capability::Ads => "ads",
        }
    }

    /// Parse a stored capability name; `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "users" => Some(Capability::Users),
            "cars" => Some(Capability::Cars),
            "providers" => Some(Capability::Providers),
            "payments" => Some(Capability::Payments),
            "ads" => Some(Capability::Ads),
            _ => None,
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Capability::Users => 1 << 0,
            Capability::Cars => 1 << 1,
            Capability::Providers => 1 << 2,
            Capability::Payments => 1 << 3,
            Capability::Ads => 1 << 4,
        }
    }
}

/// Admin roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "admin_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    Employee,
}

impl AdminRole {
    /// super_admin and admin bypass per-capability checks entirely.
    pub fn bypasses_permissions(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin | AdminRole::Admin)
    }
}

/// Bitmask over [`Capability`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionSet(u8);

impl PermissionSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Build a set from stored capability names, skipping unknown ones
    /// with a warning.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut set = Self::empty();
        for name in names {
            match Capability::parse(name.as_ref()) {
                Some(capability) => set.insert(capability),
                None => {
                    tracing::warn!(capability = name.as_ref(), "Skipping unknown capability")
                }
            }
        }
        set
    }

    /// Capability names in this set, in registry order.
    pub fn names(&self) -> Vec<&'static str> {
        ALL_CAPABILITIES
            .iter()
            .filter(|c| self.contains(**c))
            .map(|c| c.as_str())
            .collect()
    }

    /// The permission rule: super_admin/admin always pass, employees need
    /// the capability in their set.
    pub fn allows(&self, role: AdminRole, capability: Capability) -> bool {
        role.bypasses_permissions() || self.contains(capability)
    }
}

/// Validate capability names supplied at admin creation; returns the unknown
/// names so the caller can reject the request.
pub fn unknown_capabilities<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .iter()
        .filter(|n| Capability::parse(n.as_ref()).is_none())
        .map(|n| n.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_round_trip() {
        for capability in ALL_CAPABILITIES {
            assert_eq!(Capability::parse(capability.as_str()), Some(capability));
        }
        assert_eq!(Capability::parse("nonsense"), None);
    }

    #[test]
    fn test_permission_set_membership() {
        let mut set = PermissionSet::empty();
        assert!(!set.contains(Capability::Cars));

        set.insert(Capability::Cars);
        set.insert(Capability::Payments);

        assert!(set.contains(Capability::Cars));
        assert!(set.contains(Capability::Payments));
        assert!(!set.contains(Capability::Users));
        assert_eq!(set.names(), vec!["cars", "payments"]);
    }

    #[test]
    fn test_from_names_skips_unknown() {
        let set = PermissionSet::from_names(&["cars", "bogus", "payments"]);
        assert!(set.contains(Capability::Cars));
        assert!(set.contains(Capability::Payments));
        assert_eq!(set.names().len(), 2);
    }

    #[test]
    fn test_role_bypass() {
        let empty = PermissionSet::empty();

        assert!(empty.allows(AdminRole::SuperAdmin, Capability::Payments));
        assert!(empty.allows(AdminRole::Admin, Capability::Payments));
        assert!(!empty.allows(AdminRole::Employee, Capability::Payments));

        let mut set = PermissionSet::empty();
        set.insert(Capability::Payments);
        assert!(set.allows(AdminRole::Employee, Capability::Payments));
        assert!(!set.allows(AdminRole::Employee, Capability::Users));
    }

    #[test]
    fn test_unknown_capabilities() {
        let unknown = unknown_capabilities(&["cars", "invoices", "ads", "metrics"]);
        assert_eq!(unknown, vec!["invoices".to_string(), "metrics".to_string()]);

        assert!(unknown_capabilities(&["users", "payments"]).is_empty());
    }
}
