//! Attribute bags handed to the policy decision point.
//!
//! Two categories:
//! - **Subject attributes**: who is acting, from where, under which clearance
//! - **Resource attributes**: what is being touched and which requirements
//!   the request declared
//!
//! Keys the kernel writes into the resource bag, for policy authors:
//!
//! | Key | Value |
//! |-----|-------|
//! | `dataClassification`, `classification` | context clearance, e.g. `"SECRET"` |
//! | `dataResidency`, `residency` | context zone, e.g. `"UK_ONLY"` |
//! | `requiresMfa` | request flag |
//! | `piiAccessRequired` | request flag |
//! | `dataBreachRisk` | request flag |
//! | `expectedClassification` | request tier, when declared |
//! | `expectedResidency` | request zone, when declared |
//!
//! The short `classification` and `residency` spellings carry the same
//! values as their `data*` forms, so policies written against either keep
//! matching.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_types::{
    AttributeBag, AuthorizationContext, AuthorizationRequest, ClassificationLevel, OrgId,
    ResidencyZone, UserId,
};

// ============================================================================
// Subject
// ============================================================================

/// Attributes describing the acting subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttributes {
    pub org_id: OrgId,
    pub user_id: UserId,
    /// Base role token first, then the tenant role name when it differs.
    pub roles: Vec<String>,
    pub data_residency: ResidencyZone,
    pub data_classification: ClassificationLevel,
    pub mfa_verified: bool,
    pub requires_mfa: bool,
    pub pii_access_required: bool,
    pub data_breach_risk: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
}

impl SubjectAttributes {
    /// Builds the subject from the context and the request's requirement flags.
    pub fn from_request(context: &AuthorizationContext, request: &AuthorizationRequest) -> Self {
        let mut roles = vec![context.role_key.as_str().to_string()];
        if let Some(name) = context.role_name.as_deref()
            && !name.is_empty()
            && name != context.role_key.as_str()
        {
            roles.push(name.to_string());
        }

        Self {
            org_id: context.org_id,
            user_id: context.user_id,
            roles,
            data_residency: context.data_residency.clone(),
            data_classification: context.data_classification,
            mfa_verified: context.mfa_verified,
            requires_mfa: request.requires_mfa,
            pii_access_required: context.pii_access_required || request.pii_access_required,
            data_breach_risk: request.data_breach_risk,
            ip_address: request
                .ip_address
                .clone()
                .or_else(|| context.ip_address.clone()),
            user_agent: context.user_agent.clone(),
            session_id: context.session_id.clone(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

// ============================================================================
// Resource
// ============================================================================

pub const DATA_CLASSIFICATION: &str = "dataClassification";
pub const DATA_RESIDENCY: &str = "dataResidency";
/// Short alias of [`DATA_CLASSIFICATION`].
pub const CLASSIFICATION: &str = "classification";
/// Short alias of [`DATA_RESIDENCY`].
pub const RESIDENCY: &str = "residency";
pub const REQUIRES_MFA: &str = "requiresMfa";
pub const PII_ACCESS_REQUIRED: &str = "piiAccessRequired";
pub const DATA_BREACH_RISK: &str = "dataBreachRisk";
pub const EXPECTED_CLASSIFICATION: &str = "expectedClassification";
pub const EXPECTED_RESIDENCY: &str = "expectedResidency";

/// Builds the resource attribute bag.
///
/// Caller-supplied attributes go in first. Kernel-derived keys are written
/// last and win on collision.
pub fn resource_attributes(
    context: &AuthorizationContext,
    request: &AuthorizationRequest,
) -> AttributeBag {
    let mut bag = request.resource_attributes.clone();

    for key in [DATA_CLASSIFICATION, CLASSIFICATION] {
        bag.insert(
            key.to_string(),
            Value::from(context.data_classification.as_str()),
        );
    }
    for key in [DATA_RESIDENCY, RESIDENCY] {
        bag.insert(
            key.to_string(),
            Value::from(context.data_residency.as_str()),
        );
    }
    bag.insert(REQUIRES_MFA.to_string(), Value::Bool(request.requires_mfa));
    bag.insert(
        PII_ACCESS_REQUIRED.to_string(),
        Value::Bool(request.pii_access_required),
    );
    bag.insert(
        DATA_BREACH_RISK.to_string(),
        Value::Bool(request.data_breach_risk),
    );
    if let Some(expected) = request.expected_classification {
        bag.insert(
            EXPECTED_CLASSIFICATION.to_string(),
            Value::from(expected.as_str()),
        );
    }
    if let Some(expected) = &request.expected_residency {
        bag.insert(
            EXPECTED_RESIDENCY.to_string(),
            Value::from(expected.as_str()),
        );
    }

    bag
}
