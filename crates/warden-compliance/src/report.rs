//! Data compliance report for a context against an operation's residency
//! and classification requirements.
//!
//! [`validate_data_compliance`] never fails; it lists every violation with
//! a remediation hint. [`assert_data_compliance`] turns the first violation
//! into an [`AuthorizationError`].

use serde::Serialize;
use warden_types::{
    AuthResult, AuthorizationContext, AuthorizationError, ClassificationLevel, ResidencyZone,
};

/// One rule the context breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ComplianceViolation {
    /// The operation needs a different residency zone.
    ResidencyMismatch {
        required: ResidencyZone,
        actual: ResidencyZone,
    },
    /// The context does not clear the operation's minimum tier.
    InsufficientClearance {
        required: ClassificationLevel,
        actual: ClassificationLevel,
    },
    /// The context's tier needs MFA that was not verified.
    MfaNotVerified { classification: ClassificationLevel },
    /// The context's tier may not live in its residency zone.
    ZoneTooBroad {
        classification: ClassificationLevel,
        zone: ResidencyZone,
    },
}

impl ComplianceViolation {
    pub fn remediation(&self) -> String {
        match self {
            Self::ResidencyMismatch { required, .. } => format!(
                "Move data to compliant region ({required}) or adjust operational requirements"
            ),
            Self::InsufficientClearance { required, .. } => format!(
                "Apply appropriate security controls for {required} classification or adjust operational requirements"
            ),
            Self::MfaNotVerified { classification } => {
                format!("Enable and verify MFA for access to {classification} data")
            }
            Self::ZoneTooBroad {
                classification: ClassificationLevel::TopSecret,
                ..
            } => "Move TOP_SECRET data to UK_ONLY residency zone".to_string(),
            Self::ZoneTooBroad { classification, .. } => format!(
                "Move {classification} data to a more restrictive residency zone (UK_ONLY or UK_AND_EEA)"
            ),
        }
    }

    fn into_error(self) -> AuthorizationError {
        match self {
            Self::ResidencyMismatch { required, actual } => AuthorizationError::ResidencyViolation {
                context: actual,
                required,
            },
            Self::InsufficientClearance { required, actual } => {
                AuthorizationError::ClassificationViolation {
                    context: actual,
                    required,
                }
            }
            Self::MfaNotVerified { classification } => AuthorizationError::MfaRequired {
                reason: format!("{classification} data requires verified MFA"),
            },
            Self::ZoneTooBroad { classification, zone } => {
                let required = if classification == ClassificationLevel::TopSecret {
                    ResidencyZone::uk_only()
                } else {
                    ResidencyZone::uk_and_eea()
                };
                AuthorizationError::ResidencyViolation {
                    context: zone,
                    required,
                }
            }
        }
    }
}

impl std::fmt::Display for ComplianceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResidencyMismatch { required, actual } => write!(
                f,
                "data residency violation: operation requires {required} but current residency is {actual}"
            ),
            Self::InsufficientClearance { required, actual } => write!(
                f,
                "data classification violation: operation requires minimum {required} but current classification is {actual}"
            ),
            Self::MfaNotVerified { classification } => write!(
                f,
                "{classification} classification violation: MFA required but not verified"
            ),
            Self::ZoneTooBroad {
                classification,
                zone,
            } => write!(
                f,
                "{classification} classification violation: data must not be held in {zone}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataComplianceReport {
    pub is_valid: bool,
    pub violations: Vec<ComplianceViolation>,
    pub suggested_remediation: Vec<String>,
}

impl DataComplianceReport {
    fn from_violations(violations: Vec<ComplianceViolation>) -> Self {
        let suggested_remediation = violations.iter().map(ComplianceViolation::remediation).collect();
        Self {
            is_valid: violations.is_empty(),
            violations,
            suggested_remediation,
        }
    }
}

/// Checks `context` against the required zone and tier, plus the standing
/// rules for its own tier. Residency findings come first.
pub fn validate_data_compliance(
    context: &AuthorizationContext,
    required_residency: Option<&ResidencyZone>,
    required_classification: Option<ClassificationLevel>,
) -> DataComplianceReport {
    let mut violations = Vec::new();
    let level = context.data_classification;
    let zone = &context.data_residency;

    if let Some(required) = required_residency
        && required != zone
    {
        violations.push(ComplianceViolation::ResidencyMismatch {
            required: required.clone(),
            actual: zone.clone(),
        });
    }
    if level.is_elevated() && *zone == ResidencyZone::global_restricted() {
        violations.push(ComplianceViolation::ZoneTooBroad {
            classification: level,
            zone: zone.clone(),
        });
    }

    if let Some(required) = required_classification
        && !level.clears(required)
    {
        violations.push(ComplianceViolation::InsufficientClearance {
            required,
            actual: level,
        });
    }
    if level != ClassificationLevel::Official && !context.mfa_verified {
        violations.push(ComplianceViolation::MfaNotVerified {
            classification: level,
        });
    }
    if level == ClassificationLevel::TopSecret && *zone != ResidencyZone::uk_only() {
        let violation = ComplianceViolation::ZoneTooBroad {
            classification: level,
            zone: zone.clone(),
        };
        if !violations.contains(&violation) {
            violations.push(violation);
        }
    }

    DataComplianceReport::from_violations(violations)
}

/// Fails with the first violation [`validate_data_compliance`] finds.
pub fn assert_data_compliance(
    context: &AuthorizationContext,
    required_residency: Option<&ResidencyZone>,
    required_classification: Option<ClassificationLevel>,
) -> AuthResult<()> {
    let report = validate_data_compliance(context, required_residency, required_classification);
    match report.violations.into_iter().next() {
        None => Ok(()),
        Some(violation) => {
            tracing::warn!(
                org_id = %context.org_id,
                user_id = %context.user_id,
                violation = %violation,
                "Data compliance check failed"
            );
            Err(violation.into_error())
        }
    }
}
