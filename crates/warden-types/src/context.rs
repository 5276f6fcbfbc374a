//! Request-scoped inputs to the kernel.
//!
//! An [`AuthorizationContext`] is produced once per inbound request by the
//! session resolver and is read-only from then on. Enrichment goes through
//! methods that return a new value.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classification::ClassificationLevel;
use crate::ids::{OrgId, UserId};
use crate::permission::{Action, PermissionMap, ResourceType};
use crate::residency::ResidencyZone;
use crate::role::RoleKey;

/// Free-form resource attributes forwarded to the policy decision point.
pub type AttributeBag = BTreeMap<String, Value>;

// ============================================================================
// Authorization context
// ============================================================================

/// Who is acting, under which clearance, from where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationContext {
    pub org_id: OrgId,
    pub user_id: UserId,
    pub role_key: RoleKey,
    /// Tenant-defined role name, when distinct from the base role.
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub permissions: PermissionMap,
    pub data_classification: ClassificationLevel,
    pub data_residency: ResidencyZone,
    #[serde(default)]
    pub mfa_verified: bool,
    #[serde(default)]
    pub pii_access_required: bool,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub session_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub audit_source: Option<String>,
}

impl AuthorizationContext {
    /// Creates a context with OFFICIAL clearance in the `UK_ONLY` zone and no permissions.
    pub fn new(org_id: OrgId, user_id: UserId, role_key: RoleKey) -> Self {
        Self {
            org_id,
            user_id,
            role_key,
            role_name: None,
            permissions: PermissionMap::new(),
            data_classification: ClassificationLevel::Official,
            data_residency: ResidencyZone::uk_only(),
            mfa_verified: false,
            pii_access_required: false,
            ip_address: None,
            user_agent: None,
            session_id: None,
            session_token: None,
            session_expires_at: None,
            last_activity_at: None,
            correlation_id: None,
            audit_source: None,
        }
    }

    pub fn with_role_name(mut self, name: impl Into<String>) -> Self {
        self.role_name = Some(name.into());
        self
    }

    pub fn with_permissions(mut self, permissions: PermissionMap) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_classification(mut self, level: ClassificationLevel) -> Self {
        self.data_classification = level;
        self
    }

    pub fn with_residency(mut self, zone: ResidencyZone) -> Self {
        self.data_residency = zone;
        self
    }

    pub fn with_mfa_verified(mut self, verified: bool) -> Self {
        self.mfa_verified = verified;
        self
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn with_session(
        mut self,
        token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.session_token = Some(token.into());
        self.session_expires_at = expires_at;
        self
    }

    pub fn with_last_activity(mut self, at: DateTime<Utc>) -> Self {
        self.last_activity_at = Some(at);
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_audit_source(mut self, source: impl Into<String>) -> Self {
        self.audit_source = Some(source.into());
        self
    }

    /// Returns a copy marked as requiring PII access. `self` is untouched.
    pub fn marked_for_pii_access(&self) -> Self {
        Self {
            pii_access_required: true,
            ..self.clone()
        }
    }

    /// Whether any resource grants a `pii:*` action.
    pub fn has_pii_scope(&self) -> bool {
        self.permissions.has_pii_scope()
    }
}

// ============================================================================
// Resource record
// ============================================================================

/// Governance metadata of the tenant-owned object being accessed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    #[serde(default)]
    pub org_id: Option<OrgId>,
    #[serde(default)]
    pub data_classification: Option<ClassificationLevel>,
    #[serde(default)]
    pub data_residency: Option<ResidencyZone>,
    #[serde(default)]
    pub pii_detected: Option<bool>,
}

impl ResourceRecord {
    pub fn owned_by(org_id: OrgId) -> Self {
        Self {
            org_id: Some(org_id),
            ..Self::default()
        }
    }

    pub fn with_classification(mut self, level: ClassificationLevel) -> Self {
        self.data_classification = Some(level);
        self
    }

    pub fn with_residency(mut self, zone: ResidencyZone) -> Self {
        self.data_residency = Some(zone);
        self
    }

    pub fn with_pii_detected(mut self, detected: bool) -> Self {
        self.pii_detected = Some(detected);
        self
    }
}

// ============================================================================
// Operation
// ============================================================================

/// Data operation a guard call is protecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Authorization request
// ============================================================================

/// What the caller wants to do, and under which extra requirements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizationRequest {
    pub action: Option<Action>,
    pub resource_type: Option<ResourceType>,
    pub resource_attributes: AttributeBag,
    pub required_permissions: PermissionMap,
    /// Disjunction: at least one profile must be fully held.
    pub required_any_permission_profiles: Vec<PermissionMap>,
    pub requires_mfa: bool,
    pub pii_access_required: bool,
    pub data_breach_risk: bool,
    pub expected_classification: Option<ClassificationLevel>,
    pub expected_residency: Option<ResidencyZone>,
    pub session_token: Option<String>,
    pub ip_address: Option<String>,
    pub authorization_reason: Option<String>,
}

impl AuthorizationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request targeting `action` on `resource_type`.
    pub fn for_action(action: Action, resource_type: ResourceType) -> Self {
        Self {
            action: Some(action),
            resource_type: Some(resource_type),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.resource_attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_required_permissions(mut self, required: PermissionMap) -> Self {
        self.required_permissions = required;
        self
    }

    pub fn with_any_profile(mut self, profile: PermissionMap) -> Self {
        self.required_any_permission_profiles.push(profile);
        self
    }

    pub fn with_requires_mfa(mut self, requires: bool) -> Self {
        self.requires_mfa = requires;
        self
    }

    pub fn with_pii_access_required(mut self, required: bool) -> Self {
        self.pii_access_required = required;
        self
    }

    pub fn with_data_breach_risk(mut self, risk: bool) -> Self {
        self.data_breach_risk = risk;
        self
    }

    pub fn with_expected_classification(mut self, level: ClassificationLevel) -> Self {
        self.expected_classification = Some(level);
        self
    }

    pub fn with_expected_residency(mut self, zone: ResidencyZone) -> Self {
        self.expected_residency = Some(zone);
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.authorization_reason = Some(reason.into());
        self
    }

    /// Whether a non-blank authorization reason was supplied.
    pub fn has_reason(&self) -> bool {
        self.authorization_reason
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ctx() -> AuthorizationContext {
        AuthorizationContext::new(
            OrgId::new(Uuid::from_u128(1)),
            UserId::new(Uuid::from_u128(2)),
            RoleKey::HrAdmin,
        )
    }

    #[test]
    fn marking_for_pii_returns_new_value() {
        let original = ctx();
        let marked = original.marked_for_pii_access();
        assert!(marked.pii_access_required);
        assert!(!original.pii_access_required);
        assert_eq!(marked.org_id, original.org_id);
    }

    #[test]
    fn blank_reason_does_not_count() {
        let req = AuthorizationRequest::new().with_reason("   ");
        assert!(!req.has_reason());
        assert!(AuthorizationRequest::new().with_reason("audit #42").has_reason());
    }

    #[test]
    fn context_deserializes_with_defaults() {
        let json = serde_json::json!({
            "orgId": Uuid::from_u128(1),
            "userId": Uuid::from_u128(2),
            "roleKey": "manager",
            "dataClassification": "SECRET",
            "dataResidency": "UK_ONLY",
            "permissions": { "absence": ["read", "approve"] }
        });
        let parsed: AuthorizationContext = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.role_key, RoleKey::Manager);
        assert_eq!(parsed.data_classification, ClassificationLevel::Secret);
        assert!(parsed.permissions.contains(ResourceType::Absence, Action::Approve));
        assert!(!parsed.mfa_verified);
        assert!(parsed.session_token.is_none());
    }

    #[test]
    fn record_without_org_deserializes() {
        let record: ResourceRecord = serde_json::from_str("{}").unwrap();
        assert!(record.org_id.is_none());
    }
}
