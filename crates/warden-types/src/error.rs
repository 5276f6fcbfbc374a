//! Error types shared by every gate.

use thiserror::Error;

use crate::classification::ClassificationLevel;
use crate::event::Severity;
use crate::ids::OrgId;
use crate::residency::ResidencyZone;

/// Authorization denial.
///
/// Every variant is terminal for the current operation. The framework
/// boundary is expected to expose only [`AuthorizationError::code`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("record not found")]
    RecordNotFound,

    #[error("cross-tenant access denied: attempted {attempted:?}, authorized {authorized}")]
    CrossTenantAccess {
        attempted: Option<OrgId>,
        authorized: OrgId,
    },

    #[error("classification violation: context cleared for {context}, record requires {required}")]
    ClassificationViolation {
        context: ClassificationLevel,
        required: ClassificationLevel,
    },

    #[error("residency violation: context zone {context}, record requires {required}")]
    ResidencyViolation {
        context: ResidencyZone,
        required: ResidencyZone,
    },

    #[error("session token mismatch")]
    SessionInvalid,

    #[error("session expired")]
    SessionExpired,

    #[error("authorization reason required for sensitive operation")]
    ReasonRequired,

    #[error("client IP address changed during elevated session")]
    IpAddressChanged,

    #[error("step-up re-authentication required")]
    StepUpReauthRequired,

    #[error("MFA required: {reason}")]
    MfaRequired { reason: String },

    #[error("RBAC denied: {reason}")]
    RbacDenied { reason: String },

    #[error("ABAC denied: {reason}")]
    AbacDenied { reason: String },

    #[error("PII access denied: {reason}")]
    PiiAccessDenied { reason: String },
}

impl AuthorizationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthorizationError::RecordNotFound => "record_not_found",
            AuthorizationError::CrossTenantAccess { .. } => "cross_tenant_access",
            AuthorizationError::ClassificationViolation { .. } => "classification_violation",
            AuthorizationError::ResidencyViolation { .. } => "residency_violation",
            AuthorizationError::SessionInvalid => "session_invalid",
            AuthorizationError::SessionExpired => "session_expired",
            AuthorizationError::ReasonRequired => "reason_required",
            AuthorizationError::IpAddressChanged => "ip_address_changed",
            AuthorizationError::StepUpReauthRequired => "step_up_reauth_required",
            AuthorizationError::MfaRequired { .. } => "mfa_required",
            AuthorizationError::RbacDenied { .. } => "rbac_denied",
            AuthorizationError::AbacDenied { .. } => "abac_denied",
            AuthorizationError::PiiAccessDenied { .. } => "pii_access_denied",
        }
    }

    /// Audit severity for this kind of denial.
    pub fn severity(&self) -> Severity {
        match self {
            AuthorizationError::CrossTenantAccess { .. } | AuthorizationError::IpAddressChanged => {
                Severity::Critical
            }
            AuthorizationError::ClassificationViolation { .. }
            | AuthorizationError::ResidencyViolation { .. }
            | AuthorizationError::SessionInvalid
            | AuthorizationError::StepUpReauthRequired
            | AuthorizationError::PiiAccessDenied { .. } => Severity::High,
            AuthorizationError::SessionExpired
            | AuthorizationError::ReasonRequired
            | AuthorizationError::MfaRequired { .. }
            | AuthorizationError::RbacDenied { .. }
            | AuthorizationError::AbacDenied { .. } => Severity::Medium,
            AuthorizationError::RecordNotFound => Severity::Low,
        }
    }

    /// Whether the caller should prompt for re-authentication rather than deny outright.
    pub fn is_step_up(&self) -> bool {
        matches!(
            self,
            AuthorizationError::StepUpReauthRequired | AuthorizationError::MfaRequired { .. }
        )
    }
}

/// Failure to parse free-form permission input into the closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("malformed permission '{0}', expected 'resource.action'")]
    Malformed(String),
}
