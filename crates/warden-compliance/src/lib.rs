//! Tenant isolation and data governance for Warden.
//!
//! This crate holds the checks that sit between a caller and tenant data:
//!
//! - [`TenantConstraintValidator`]: org, classification, residency and PII
//!   checks on records, plus session and step-up checks on requests
//! - [`pii`]: PII detection, protection (mask / encrypt / tokenize) and the
//!   [`PiiComplianceGate`]
//! - [`report`]: non-throwing data compliance report
//! - [`audit`]: the [`SecurityEventSink`] interface and the fire-and-forget
//!   [`SecurityEventDispatcher`] every check reports through
//!
//! # Fail-closed
//!
//! Every check returns an [`AuthorizationError`](warden_types::AuthorizationError)
//! on the first failure. A missing record org id is treated as a foreign
//! tenant. Security event delivery never affects the result.

pub mod audit;
pub mod pii;
pub mod report;
pub mod tenant;

pub use audit::{MemorySink, SecurityEventDispatcher, SecurityEventSink, SinkError};
pub use pii::{
    PiiComplianceGate, PiiDetectionResult, PiiProtectionResult, PiiProtector, PiiScanner, PiiType,
    ProtectionError, ProtectionKeys, ProtectionLevel,
};
pub use report::{
    ComplianceViolation, DataComplianceReport, assert_data_compliance, validate_data_compliance,
};
pub use tenant::{StepUpPolicy, TenantConstraintValidator};
