//! Data residency zones.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Opaque geographic/regulatory tag.
///
/// Zones compare by exact identity only. There is deliberately no ordering:
/// no zone "contains" another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResidencyZone(String);

impl ResidencyZone {
    pub fn new(zone: impl Into<String>) -> Self {
        Self(zone.into())
    }

    pub fn uk_only() -> Self {
        Self::new("UK_ONLY")
    }

    pub fn uk_and_eea() -> Self {
        Self::new("UK_AND_EEA")
    }

    pub fn global_restricted() -> Self {
        Self::new("GLOBAL_RESTRICTED")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ResidencyZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResidencyZone {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
