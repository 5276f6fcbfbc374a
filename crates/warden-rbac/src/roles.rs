//! Role tier rules.
//!
//! Roles fall in two tiers:
//! - Predefined: platform-reviewed roles (owner, orgAdmin, hrAdmin, manager,
//!   compliance, member)
//! - Custom: any tenant-defined role
//!
//! Only predefined roles may touch SECRET or TOP_SECRET data.

use serde::{Deserialize, Serialize};
use warden_types::{ClassificationLevel, RoleKey};

/// Review tier of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleTier {
    Predefined,
    Custom,
}

impl RoleTier {
    pub fn of(role: RoleKey) -> Self {
        if role.is_custom() {
            RoleTier::Custom
        } else {
            RoleTier::Predefined
        }
    }

    /// Highest classification a role of this tier may ever act on.
    pub fn clearance_ceiling(self) -> ClassificationLevel {
        match self {
            RoleTier::Predefined => ClassificationLevel::TopSecret,
            RoleTier::Custom => ClassificationLevel::OfficialSensitive,
        }
    }
}

/// Returns whether `role` may act on data classified at `level`.
///
/// # Examples
///
/// ```
/// use warden_rbac::roles::may_access_classification;
/// use warden_types::{ClassificationLevel, RoleKey};
///
/// assert!(may_access_classification(RoleKey::Manager, ClassificationLevel::TopSecret));
/// assert!(!may_access_classification(RoleKey::Custom, ClassificationLevel::Secret));
/// ```
pub fn may_access_classification(role: RoleKey, level: ClassificationLevel) -> bool {
    RoleTier::of(role).clearance_ceiling().clears(level)
}
