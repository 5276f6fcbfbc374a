//! Role identifiers.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PermissionError;

/// Tenant role a context acts under.
///
/// The predefined roles carry platform-reviewed permission sets.
/// [`RoleKey::Custom`] covers every tenant-defined role, which is why it is
/// barred from SECRET and TOP_SECRET data regardless of its permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleKey {
    Owner,
    OrgAdmin,
    HrAdmin,
    Manager,
    Compliance,
    Member,
    Custom,
}

impl RoleKey {
    pub const ALL: [RoleKey; 7] = [
        RoleKey::Owner,
        RoleKey::OrgAdmin,
        RoleKey::HrAdmin,
        RoleKey::Manager,
        RoleKey::Compliance,
        RoleKey::Member,
        RoleKey::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoleKey::Owner => "owner",
            RoleKey::OrgAdmin => "orgAdmin",
            RoleKey::HrAdmin => "hrAdmin",
            RoleKey::Manager => "manager",
            RoleKey::Compliance => "compliance",
            RoleKey::Member => "member",
            RoleKey::Custom => "custom",
        }
    }

    pub fn is_custom(self) -> bool {
        self == RoleKey::Custom
    }
}

impl Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKey {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleKey::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| PermissionError::UnknownRole(s.to_string()))
    }
}
