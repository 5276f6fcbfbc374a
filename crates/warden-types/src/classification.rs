//! Data classification tiers.
//!
//! Four ranked tiers, least to most sensitive:
//! `OFFICIAL < OFFICIAL_SENSITIVE < SECRET < TOP_SECRET`.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Sensitivity tier of a record, and clearance tier of a context.
///
/// The derived `Ord` follows the rank order, so `a >= b` reads as
/// "`a` clears `b`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationLevel {
    /// Baseline tier. Routine business data.
    Official,

    /// Official data whose loss would cause limited harm
    /// (personnel files, contracts).
    OfficialSensitive,

    /// Requires a predefined role and MFA for PII reads.
    Secret,

    /// Highest tier. MFA mandatory for every ABAC-authorized access,
    /// step-up re-authentication for breach-risk operations.
    TopSecret,
}

impl ClassificationLevel {
    /// All tiers in rank order.
    pub const ALL: [ClassificationLevel; 4] = [
        ClassificationLevel::Official,
        ClassificationLevel::OfficialSensitive,
        ClassificationLevel::Secret,
        ClassificationLevel::TopSecret,
    ];

    /// Numeric rank, 1 (OFFICIAL) through 4 (TOP_SECRET).
    pub fn rank(self) -> u8 {
        match self {
            ClassificationLevel::Official => 1,
            ClassificationLevel::OfficialSensitive => 2,
            ClassificationLevel::Secret => 3,
            ClassificationLevel::TopSecret => 4,
        }
    }

    /// Returns whether a holder of `self` clearance may touch data at `required`.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_types::ClassificationLevel;
    ///
    /// assert!(ClassificationLevel::Secret.clears(ClassificationLevel::Official));
    /// assert!(!ClassificationLevel::Official.clears(ClassificationLevel::Secret));
    /// ```
    pub fn clears(self, required: ClassificationLevel) -> bool {
        self.rank() >= required.rank()
    }

    /// SECRET and TOP_SECRET.
    pub fn is_elevated(self) -> bool {
        matches!(
            self,
            ClassificationLevel::Secret | ClassificationLevel::TopSecret
        )
    }

    /// Wire name, as used in policies and audit metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationLevel::Official => "OFFICIAL",
            ClassificationLevel::OfficialSensitive => "OFFICIAL_SENSITIVE",
            ClassificationLevel::Secret => "SECRET",
            ClassificationLevel::TopSecret => "TOP_SECRET",
        }
    }
}

impl Display for ClassificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
