//! Security event records.

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classification::ClassificationLevel;
use crate::ids::{OrgId, UserId};
use crate::residency::ResidencyZone;

/// Event severity, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One security-relevant occurrence, handed to a `SecurityEventSink`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEventLogInput {
    pub org_id: OrgId,
    pub user_id: Option<UserId>,
    /// Machine-readable event kind, e.g. `security.cross-tenant-access-attempt`.
    pub event_type: String,
    pub severity: Severity,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub data_classification: Option<ClassificationLevel>,
    pub data_residency: Option<ResidencyZone>,
    pub metadata: Map<String, Value>,
    pub occurred_at: DateTime<Utc>,
}

impl SecurityEventLogInput {
    pub fn new(
        org_id: OrgId,
        event_type: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            org_id,
            user_id: None,
            event_type: event_type.into(),
            severity,
            description: description.into(),
            ip_address: None,
            user_agent: None,
            resource_type: None,
            resource_id: None,
            data_classification: None,
            data_residency: None,
            metadata: Map::new(),
            occurred_at,
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_classification(mut self, level: Option<ClassificationLevel>) -> Self {
        self.data_classification = level;
        self
    }

    pub fn with_residency(mut self, zone: Option<ResidencyZone>) -> Self {
        self.data_residency = zone;
        self
    }

    /// Adds one metadata entry. Later keys overwrite earlier ones.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
