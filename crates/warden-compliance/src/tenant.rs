//! Tenant isolation guard.
//!
//! [`TenantConstraintValidator`] is the check every repository read and write
//! passes before touching tenant data. Record checks run in a fixed order:
//!
//! 1. Org id equality (cross-tenant access is `critical`)
//! 2. Classification rank: the context must clear the record's tier
//! 3. Residency: exact zone equality, never ranked
//! 4. PII access, when the context or the record calls for it
//!
//! Each failure dispatches a security event before the error is returned.
//!
//! The validator also carries the request-level session and step-up checks
//! that the authorization pipeline runs ahead of RBAC and ABAC.

use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;
use tracing::debug;
use warden_types::{
    AuthResult, AuthorizationContext, AuthorizationError, AuthorizationRequest,
    ClassificationLevel, Clock, Operation, OrgId, ResidencyZone, ResourceRecord, ResourceType,
    Severity,
};

use crate::audit::{SecurityEventDispatcher, context_event};
use crate::pii::gate::{PII_ACCESS_DENIED_EVENT, pii_access_denial};

pub const CROSS_TENANT_EVENT: &str = "security.cross-tenant-access-attempt";
pub const CLASSIFICATION_VIOLATION_EVENT: &str = "security.data-classification.violation";
pub const RESIDENCY_VIOLATION_EVENT: &str = "security.data-residency.violation";
pub const RESIDENCY_VALIDATION_EVENT: &str = "security.data-residency.validation";
pub const SESSION_VIOLATION_EVENT: &str = "security.session.violation";
pub const CONSTRAINT_VIOLATION_EVENT: &str = "security.tenant-constraint.violation";

/// Inactivity rule for high-risk TOP_SECRET operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepUpPolicy {
    pub inactivity: Duration,
    /// When true, a context without `last_activity_at` counts as stale.
    pub require_activity_timestamp: bool,
}

impl Default for StepUpPolicy {
    fn default() -> Self {
        Self {
            inactivity: Duration::minutes(30),
            require_activity_timestamp: true,
        }
    }
}

/// Classification and residency a check compares against.
#[derive(Debug, Clone, Copy, Default)]
struct Declared<'a> {
    classification: Option<ClassificationLevel>,
    residency: Option<&'a ResidencyZone>,
    pii_detected: bool,
}

impl<'a> From<&'a ResourceRecord> for Declared<'a> {
    fn from(record: &'a ResourceRecord) -> Self {
        Self {
            classification: record.data_classification,
            residency: record.data_residency.as_ref(),
            pii_detected: record.pii_detected.unwrap_or(false),
        }
    }
}

/// Tenant, classification, residency and session guard.
pub struct TenantConstraintValidator {
    dispatcher: SecurityEventDispatcher,
    clock: Arc<dyn Clock>,
    step_up: StepUpPolicy,
}

impl TenantConstraintValidator {
    pub fn new(dispatcher: SecurityEventDispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            dispatcher,
            clock,
            step_up: StepUpPolicy::default(),
        }
    }

    pub fn with_step_up(mut self, step_up: StepUpPolicy) -> Self {
        self.step_up = step_up;
        self
    }

    pub fn step_up(&self) -> StepUpPolicy {
        self.step_up
    }

    // ========================================================================
    // Record guards
    // ========================================================================

    /// Validates a read of `record` and hands it back.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use warden_compliance::audit::SecurityEventDispatcher;
    /// use warden_compliance::tenant::TenantConstraintValidator;
    /// use warden_types::{
    ///     AuthorizationContext, AuthorizationError, ClassificationLevel, OrgId, ResourceRecord,
    ///     ResourceType, RoleKey, SystemClock, UserId,
    /// };
    ///
    /// let guard = TenantConstraintValidator::new(
    ///     SecurityEventDispatcher::disabled(),
    ///     Arc::new(SystemClock),
    /// );
    /// let org = OrgId::random();
    /// let ctx = AuthorizationContext::new(org, UserId::random(), RoleKey::Member);
    ///
    /// let open = ResourceRecord::owned_by(org);
    /// assert!(guard.assert_readable(Some(&open), &ctx, ResourceType::HrPolicy).is_ok());
    ///
    /// let secret = ResourceRecord::owned_by(org).with_classification(ClassificationLevel::Secret);
    /// assert!(matches!(
    ///     guard.assert_readable(Some(&secret), &ctx, ResourceType::HrPolicy),
    ///     Err(AuthorizationError::ClassificationViolation { .. })
    /// ));
    /// ```
    pub fn assert_readable<'r>(
        &self,
        record: Option<&'r ResourceRecord>,
        context: &AuthorizationContext,
        resource_type: ResourceType,
    ) -> AuthResult<&'r ResourceRecord> {
        let Some(record) = record else {
            return Err(AuthorizationError::RecordNotFound);
        };
        self.check_record(
            record.org_id.as_ref(),
            Declared::from(record),
            context,
            resource_type,
            Operation::Read,
        )?;
        Ok(record)
    }

    /// Validates a write against the target org id alone.
    ///
    /// Classification and residency pass trivially; PII access is checked
    /// only when the context is marked for it.
    pub fn assert_writable(
        &self,
        record_org_id: Option<&OrgId>,
        context: &AuthorizationContext,
        resource_type: ResourceType,
        operation: Operation,
    ) -> AuthResult<()> {
        self.check_record(
            record_org_id,
            Declared::default(),
            context,
            resource_type,
            operation,
        )
    }

    /// Validates a write to an existing record, honoring its declared
    /// classification and residency.
    pub fn assert_writable_record(
        &self,
        record: &ResourceRecord,
        context: &AuthorizationContext,
        resource_type: ResourceType,
        operation: Operation,
    ) -> AuthResult<()> {
        self.check_record(
            record.org_id.as_ref(),
            Declared::from(record),
            context,
            resource_type,
            operation,
        )
    }

    fn check_record(
        &self,
        record_org_id: Option<&OrgId>,
        declared: Declared<'_>,
        context: &AuthorizationContext,
        resource_type: ResourceType,
        operation: Operation,
    ) -> AuthResult<()> {
        self.assert_org(record_org_id, context, resource_type, operation)?;
        self.assert_classification(declared.classification, context, resource_type, operation)?;
        self.assert_residency(declared.residency, context, resource_type, operation)?;
        if context.pii_access_required || declared.pii_detected {
            self.validate_pii_access(context, operation, resource_type)?;
        }

        debug!(
            org_id = %context.org_id,
            user_id = %context.user_id,
            resource_type = %resource_type,
            operation = %operation,
            "Tenant constraints satisfied"
        );
        Ok(())
    }

    fn assert_org(
        &self,
        record_org_id: Option<&OrgId>,
        context: &AuthorizationContext,
        resource_type: ResourceType,
        operation: Operation,
    ) -> AuthResult<()> {
        if record_org_id == Some(&context.org_id) {
            return Ok(());
        }

        let attempted = record_org_id.copied();
        let attempted_label = attempted.map_or_else(|| "unknown".to_string(), |o| o.to_string());
        let mut event = context_event(
            context,
            CROSS_TENANT_EVENT,
            Severity::Critical,
            format!(
                "Cross-tenant {operation} attempt: record org {attempted_label} vs context org {}",
                context.org_id
            ),
            self.clock.now(),
        )
        .with_resource_type(resource_type.as_str())
        .with_resource_id(attempted_label)
        .with_metadata(
            "attemptedOrgId",
            attempted.map_or(Value::Null, |o| Value::String(o.to_string())),
        )
        .with_metadata("authorizedOrgId", context.org_id.to_string())
        .with_metadata("role", context.role_key.as_str());
        if let Some(session_id) = &context.session_id {
            event = event.with_metadata("sessionId", session_id.as_str());
        }
        self.dispatcher.dispatch(event);

        Err(AuthorizationError::CrossTenantAccess {
            attempted,
            authorized: context.org_id,
        })
    }

    fn assert_classification(
        &self,
        required: Option<ClassificationLevel>,
        context: &AuthorizationContext,
        resource_type: ResourceType,
        operation: Operation,
    ) -> AuthResult<()> {
        let Some(required) = required else {
            return Ok(());
        };
        if context.data_classification.clears(required) {
            return Ok(());
        }

        self.dispatcher.dispatch(
            context_event(
                context,
                CLASSIFICATION_VIOLATION_EVENT,
                Severity::High,
                format!("Data classification violation on {operation} for {resource_type}"),
                self.clock.now(),
            )
            .with_resource_type(resource_type.as_str())
            .with_metadata("operation", operation.as_str())
            .with_metadata("contextClassification", context.data_classification.as_str())
            .with_metadata("recordClassification", required.as_str()),
        );

        Err(AuthorizationError::ClassificationViolation {
            context: context.data_classification,
            required,
        })
    }

    fn assert_residency(
        &self,
        required: Option<&ResidencyZone>,
        context: &AuthorizationContext,
        resource_type: ResourceType,
        operation: Operation,
    ) -> AuthResult<()> {
        let Some(required) = required else {
            return Ok(());
        };
        if *required == context.data_residency {
            return Ok(());
        }

        self.dispatcher.dispatch(
            context_event(
                context,
                RESIDENCY_VIOLATION_EVENT,
                Severity::High,
                format!("Data residency violation on {operation} for {resource_type}"),
                self.clock.now(),
            )
            .with_resource_type(resource_type.as_str())
            .with_metadata("operation", operation.as_str())
            .with_metadata("contextResidency", context.data_residency.as_str())
            .with_metadata("recordResidency", required.as_str()),
        );

        Err(AuthorizationError::ResidencyViolation {
            context: context.data_residency.clone(),
            required: required.clone(),
        })
    }

    /// Checks that `context` may handle PII for `operation`.
    pub fn validate_pii_access(
        &self,
        context: &AuthorizationContext,
        operation: Operation,
        resource_type: ResourceType,
    ) -> AuthResult<()> {
        let Some(reason) = pii_access_denial(context, operation) else {
            return Ok(());
        };

        let mut event = context_event(
            context,
            PII_ACCESS_DENIED_EVENT,
            Severity::High,
            format!("PII access denied for {operation} on {resource_type}"),
            self.clock.now(),
        )
        .with_resource_type(resource_type.as_str())
        .with_metadata("operation", operation.as_str())
        .with_metadata("role", context.role_key.as_str());
        if let Some(session_id) = &context.session_id {
            event = event.with_metadata("sessionId", session_id.as_str());
        }
        self.dispatcher.dispatch(event);

        Err(AuthorizationError::PiiAccessDenied { reason })
    }

    /// Records that residency was checked for `operation`.
    pub fn record_residency_validation(
        &self,
        context: &AuthorizationContext,
        operation: Operation,
        resource_type: ResourceType,
    ) {
        self.dispatcher.dispatch(
            context_event(
                context,
                RESIDENCY_VALIDATION_EVENT,
                Severity::Low,
                format!("Data residency validation for {operation} on {resource_type}"),
                self.clock.now(),
            )
            .with_resource_type(resource_type.as_str())
            .with_metadata("operation", operation.as_str())
            .with_metadata("mfaVerified", context.mfa_verified),
        );
    }

    // ========================================================================
    // Request guards
    // ========================================================================

    /// Session integrity checks, the first gate of the pipeline.
    pub fn validate_session_security(
        &self,
        request: &AuthorizationRequest,
        context: &AuthorizationContext,
    ) -> AuthResult<()> {
        if let Some(token) = &request.session_token
            && context.session_token.as_ref() != Some(token)
        {
            return Err(self.deny(
                context,
                SESSION_VIOLATION_EVENT,
                AuthorizationError::SessionInvalid,
            ));
        }

        if let Some(expires_at) = context.session_expires_at
            && self.clock.now() > expires_at
        {
            return Err(self.deny(
                context,
                SESSION_VIOLATION_EVENT,
                AuthorizationError::SessionExpired,
            ));
        }

        let sensitive =
            context.pii_access_required || request.pii_access_required || request.data_breach_risk;
        if sensitive && !request.has_reason() {
            return Err(self.deny(
                context,
                SESSION_VIOLATION_EVENT,
                AuthorizationError::ReasonRequired,
            ));
        }

        if context.data_classification.is_elevated()
            && let (Some(request_ip), Some(context_ip)) = (&request.ip_address, &context.ip_address)
            && request_ip != context_ip
        {
            return Err(self.deny(
                context,
                SESSION_VIOLATION_EVENT,
                AuthorizationError::IpAddressChanged,
            ));
        }

        Ok(())
    }

    /// Request-declared tenant constraints and the step-up rule, the second
    /// gate of the pipeline.
    pub fn assert_enhanced_tenant_constraints(
        &self,
        request: &AuthorizationRequest,
        context: &AuthorizationContext,
    ) -> AuthResult<()> {
        if let Some(expected) = request.expected_classification
            && !context.data_classification.clears(expected)
        {
            return Err(self.deny(
                context,
                CLASSIFICATION_VIOLATION_EVENT,
                AuthorizationError::ClassificationViolation {
                    context: context.data_classification,
                    required: expected,
                },
            ));
        }

        if let Some(expected) = &request.expected_residency
            && *expected != context.data_residency
        {
            return Err(self.deny(
                context,
                RESIDENCY_VIOLATION_EVENT,
                AuthorizationError::ResidencyViolation {
                    context: context.data_residency.clone(),
                    required: expected.clone(),
                },
            ));
        }

        if request.requires_mfa && !context.mfa_verified {
            return Err(self.deny(
                context,
                CONSTRAINT_VIOLATION_EVENT,
                AuthorizationError::MfaRequired {
                    reason: "operation requires verified MFA".to_string(),
                },
            ));
        }

        if request.pii_access_required && !context.pii_access_required {
            return Err(self.deny(
                context,
                PII_ACCESS_DENIED_EVENT,
                AuthorizationError::PiiAccessDenied {
                    reason: "context is not authorized for PII access".to_string(),
                },
            ));
        }

        if request.data_breach_risk
            && context.data_classification == ClassificationLevel::TopSecret
            && self.is_stale(context)
        {
            return Err(self.deny(
                context,
                CONSTRAINT_VIOLATION_EVENT,
                AuthorizationError::StepUpReauthRequired,
            ));
        }

        Ok(())
    }

    fn is_stale(&self, context: &AuthorizationContext) -> bool {
        match context.last_activity_at {
            Some(last) => self.clock.now() - last > self.step_up.inactivity,
            None => self.step_up.require_activity_timestamp,
        }
    }

    /// Dispatches the event for `error` and returns it.
    fn deny(
        &self,
        context: &AuthorizationContext,
        event_type: &str,
        error: AuthorizationError,
    ) -> AuthorizationError {
        self.dispatcher.dispatch(
            context_event(
                context,
                event_type,
                error.severity(),
                error.to_string(),
                self.clock.now(),
            )
            .with_metadata("code", error.code()),
        );
        error
    }
}

impl std::fmt::Debug for TenantConstraintValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantConstraintValidator")
            .field("dispatcher", &self.dispatcher)
            .field("step_up", &self.step_up)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{MemorySink, SecurityEventSink};
    use chrono::Utc;
    use proptest::prelude::*;
    use test_case::test_case;
    use warden_types::{Action, FixedClock, PermissionMap, RoleKey, UserId};

    fn guard() -> TenantConstraintValidator {
        TenantConstraintValidator::new(
            SecurityEventDispatcher::disabled(),
            Arc::new(FixedClock::new(Utc::now())),
        )
    }

    fn guard_with_sink() -> (TenantConstraintValidator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let dispatcher =
            SecurityEventDispatcher::new(Some(sink.clone() as Arc<dyn SecurityEventSink>));
        let guard = TenantConstraintValidator::new(dispatcher, Arc::new(FixedClock::new(Utc::now())));
        (guard, sink)
    }

    fn ctx(org: OrgId, level: ClassificationLevel) -> AuthorizationContext {
        AuthorizationContext::new(org, UserId::random(), RoleKey::Manager).with_classification(level)
    }

    async fn settle() {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    #[test]
    fn test_missing_record() {
        let org = OrgId::random();
        assert_eq!(
            guard()
                .assert_readable(None, &ctx(org, ClassificationLevel::TopSecret), ResourceType::HrPolicy)
                .unwrap_err(),
            AuthorizationError::RecordNotFound
        );
    }

    #[test]
    fn test_official_context_cannot_read_secret_record() {
        let org = OrgId::random();
        let record = ResourceRecord::owned_by(org).with_classification(ClassificationLevel::Secret);
        let err = guard()
            .assert_readable(Some(&record), &ctx(org, ClassificationLevel::Official), ResourceType::HrPolicy)
            .unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::ClassificationViolation {
                context: ClassificationLevel::Official,
                required: ClassificationLevel::Secret,
            }
        );
    }

    #[tokio::test]
    async fn test_cross_tenant_dominates_and_logs_critical() {
        let (guard, sink) = guard_with_sink();
        let mine = OrgId::random();
        let theirs = OrgId::random();
        let context = ctx(mine, ClassificationLevel::TopSecret)
            .with_permissions(PermissionMap::new().with(ResourceType::HrPolicy, [Action::PiiRead]));
        let record = ResourceRecord::owned_by(theirs)
            .with_classification(ClassificationLevel::Official)
            .with_residency(ResidencyZone::uk_only());

        let err = guard
            .assert_readable(Some(&record), &context, ResourceType::HrPolicy)
            .unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::CrossTenantAccess {
                attempted: Some(theirs),
                authorized: mine,
            }
        );

        settle().await;
        let events = sink.events_of_type(CROSS_TENANT_EVENT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Critical);
        assert_eq!(events[0].metadata["attemptedOrgId"], theirs.to_string());
        assert_eq!(events[0].metadata["authorizedOrgId"], mine.to_string());
    }

    #[test]
    fn test_cross_tenant_event_reaches_sink_from_sync_caller() {
        let (guard, sink) = guard_with_sink();
        let mine = OrgId::random();
        let record = ResourceRecord::owned_by(OrgId::random());

        assert!(
            guard
                .assert_readable(Some(&record), &ctx(mine, ClassificationLevel::Official), ResourceType::HrPolicy)
                .is_err()
        );
        assert!(
            guard
                .assert_writable(None, &ctx(mine, ClassificationLevel::Official), ResourceType::HrPolicy, Operation::Delete)
                .is_err()
        );

        for _ in 0..500 {
            if sink.len() >= 2 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let events = sink.events_of_type(CROSS_TENANT_EVENT);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.severity == Severity::Critical));
        assert_eq!(events[0].metadata["authorizedOrgId"], mine.to_string());
    }

    #[test]
    fn test_missing_org_is_cross_tenant() {
        let org = OrgId::random();
        let err = guard()
            .assert_writable(None, &ctx(org, ClassificationLevel::Official), ResourceType::HrPolicy, Operation::Write)
            .unwrap_err();
        assert!(matches!(err, AuthorizationError::CrossTenantAccess { attempted: None, .. }));
    }

    #[test_case("UK_ONLY", "EU_ONLY" ; "uk context eu record")]
    #[test_case("UK_AND_EEA", "UK_ONLY" ; "broader context narrower record")]
    #[test_case("UK_ONLY", "uk_only" ; "case sensitive")]
    fn test_residency_mismatch(context_zone: &str, record_zone: &str) {
        let org = OrgId::random();
        let context = ctx(org, ClassificationLevel::TopSecret).with_residency(ResidencyZone::new(context_zone));
        let record = ResourceRecord::owned_by(org).with_residency(ResidencyZone::new(record_zone));
        assert!(matches!(
            guard().assert_readable(Some(&record), &context, ResourceType::HrPolicy),
            Err(AuthorizationError::ResidencyViolation { .. })
        ));
    }

    #[test]
    fn test_writable_record_honors_declared_tiers() {
        let org = OrgId::random();
        let context = ctx(org, ClassificationLevel::OfficialSensitive);
        let record = ResourceRecord::owned_by(org).with_classification(ClassificationLevel::TopSecret);

        assert!(
            guard()
                .assert_writable(Some(&org), &context, ResourceType::HrPolicy, Operation::Update)
                .is_ok()
        );
        assert!(matches!(
            guard().assert_writable_record(&record, &context, ResourceType::HrPolicy, Operation::Update),
            Err(AuthorizationError::ClassificationViolation { .. })
        ));
    }

    #[test]
    fn test_pii_record_requires_scope() {
        let org = OrgId::random();
        let record = ResourceRecord::owned_by(org).with_pii_detected(true);
        let plain = ctx(org, ClassificationLevel::Official);
        assert!(matches!(
            guard().assert_readable(Some(&record), &plain, ResourceType::EmployeeProfile),
            Err(AuthorizationError::PiiAccessDenied { .. })
        ));

        let scoped = plain.with_permissions(
            PermissionMap::new().with(ResourceType::EmployeeProfile, [Action::PiiRead]),
        );
        assert!(guard().assert_readable(Some(&record), &scoped, ResourceType::EmployeeProfile).is_ok());
    }

    #[test]
    fn test_pii_secret_read_needs_mfa() {
        let org = OrgId::random();
        let context = ctx(org, ClassificationLevel::Secret)
            .with_permissions(PermissionMap::new().with(ResourceType::EmployeeProfile, [Action::PiiRead]))
            .marked_for_pii_access();
        let record = ResourceRecord::owned_by(org);
        let g = guard();

        assert!(g.assert_readable(Some(&record), &context, ResourceType::EmployeeProfile).is_err());
        assert!(
            g.assert_writable(Some(&org), &context, ResourceType::EmployeeProfile, Operation::Write)
                .is_ok()
        );
        let verified = context.with_mfa_verified(true);
        assert!(g.assert_readable(Some(&record), &verified, ResourceType::EmployeeProfile).is_ok());
    }

    #[tokio::test]
    async fn test_residency_validation_event() {
        let (guard, sink) = guard_with_sink();
        let context = ctx(OrgId::random(), ClassificationLevel::Official);
        guard.record_residency_validation(&context, Operation::Read, ResourceType::HrPolicy);
        settle().await;

        let events = sink.events_of_type(RESIDENCY_VALIDATION_EVENT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Low);
        assert_eq!(events[0].data_residency, Some(ResidencyZone::uk_only()));
    }

    // ------------------------------------------------------------------------
    // Session and step-up
    // ------------------------------------------------------------------------

    #[test]
    fn test_session_token_mismatch() {
        let g = guard();
        let context = ctx(OrgId::random(), ClassificationLevel::Official)
            .with_session("tok-a", Some(Utc::now() + Duration::hours(1)));

        let same = AuthorizationRequest::new().with_session_token("tok-a");
        assert!(g.validate_session_security(&same, &context).is_ok());

        let other = AuthorizationRequest::new().with_session_token("tok-b");
        assert_eq!(
            g.validate_session_security(&other, &context).unwrap_err(),
            AuthorizationError::SessionInvalid
        );

        let tokenless = ctx(OrgId::random(), ClassificationLevel::Official);
        assert_eq!(
            g.validate_session_security(&same, &tokenless).unwrap_err(),
            AuthorizationError::SessionInvalid
        );
    }

    #[test]
    fn test_session_expired() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let g = TenantConstraintValidator::new(SecurityEventDispatcher::disabled(), clock.clone());
        let context = ctx(OrgId::random(), ClassificationLevel::Official)
            .with_session("tok", Some(clock.now() + Duration::minutes(5)));
        let request = AuthorizationRequest::new();

        assert!(g.validate_session_security(&request, &context).is_ok());
        clock.advance(Duration::minutes(6));
        assert_eq!(
            g.validate_session_security(&request, &context).unwrap_err(),
            AuthorizationError::SessionExpired
        );
    }

    #[test_case(false, true, false ; "request pii")]
    #[test_case(false, false, true ; "breach risk")]
    #[test_case(true, false, false ; "context pii")]
    fn test_sensitive_operation_needs_reason(context_pii: bool, request_pii: bool, breach: bool) {
        let g = guard();
        let mut context = ctx(OrgId::random(), ClassificationLevel::Official);
        if context_pii {
            context = context.marked_for_pii_access();
        }
        let request = AuthorizationRequest::new()
            .with_pii_access_required(request_pii)
            .with_data_breach_risk(breach);

        assert_eq!(
            g.validate_session_security(&request, &context).unwrap_err(),
            AuthorizationError::ReasonRequired
        );
        assert_eq!(
            g.validate_session_security(&request.clone().with_reason("   "), &context).unwrap_err(),
            AuthorizationError::ReasonRequired
        );
        assert!(g.validate_session_security(&request.with_reason("audit #42"), &context).is_ok());
    }

    #[test_case(ClassificationLevel::Official, true)]
    #[test_case(ClassificationLevel::OfficialSensitive, true)]
    #[test_case(ClassificationLevel::Secret, false)]
    #[test_case(ClassificationLevel::TopSecret, false)]
    fn test_ip_change(level: ClassificationLevel, allowed: bool) {
        let context = ctx(OrgId::random(), level).with_ip_address("10.0.0.1");
        let request = AuthorizationRequest::new().with_ip_address("10.0.0.2");
        assert_eq!(guard().validate_session_security(&request, &context).is_ok(), allowed);
    }

    #[test]
    fn test_expected_tiers() {
        let g = guard();
        let context = ctx(OrgId::random(), ClassificationLevel::OfficialSensitive);

        let too_high = AuthorizationRequest::new().with_expected_classification(ClassificationLevel::Secret);
        assert!(matches!(
            g.assert_enhanced_tenant_constraints(&too_high, &context),
            Err(AuthorizationError::ClassificationViolation { .. })
        ));

        let eu = AuthorizationRequest::new().with_expected_residency(ResidencyZone::new("EU_ONLY"));
        assert!(matches!(
            g.assert_enhanced_tenant_constraints(&eu, &context),
            Err(AuthorizationError::ResidencyViolation { .. })
        ));

        let fits = AuthorizationRequest::new()
            .with_expected_classification(ClassificationLevel::Official)
            .with_expected_residency(ResidencyZone::uk_only());
        assert!(g.assert_enhanced_tenant_constraints(&fits, &context).is_ok());
    }

    #[test]
    fn test_requires_mfa_and_pii_marking() {
        let g = guard();
        let context = ctx(OrgId::random(), ClassificationLevel::Official);

        let mfa = AuthorizationRequest::new().with_requires_mfa(true);
        let err = g.assert_enhanced_tenant_constraints(&mfa, &context).unwrap_err();
        assert!(err.is_step_up());
        assert!(
            g.assert_enhanced_tenant_constraints(&mfa, &context.clone().with_mfa_verified(true))
                .is_ok()
        );

        let pii = AuthorizationRequest::new().with_pii_access_required(true);
        assert!(matches!(
            g.assert_enhanced_tenant_constraints(&pii, &context),
            Err(AuthorizationError::PiiAccessDenied { .. })
        ));
        assert!(
            g.assert_enhanced_tenant_constraints(&pii, &context.marked_for_pii_access())
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_stale_top_secret_breach_risk_requires_step_up() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let sink = Arc::new(MemorySink::new());
        let g = TenantConstraintValidator::new(
            SecurityEventDispatcher::new(Some(sink.clone() as Arc<dyn SecurityEventSink>)),
            clock.clone(),
        );
        let context = ctx(OrgId::random(), ClassificationLevel::TopSecret)
            .with_last_activity(clock.now() - Duration::minutes(31));
        let request = AuthorizationRequest::new().with_data_breach_risk(true);

        assert_eq!(
            g.assert_enhanced_tenant_constraints(&request, &context).unwrap_err(),
            AuthorizationError::StepUpReauthRequired
        );
        settle().await;
        let events = sink.events_of_type(CONSTRAINT_VIOLATION_EVENT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metadata["code"], "step_up_reauth_required");
    }

    #[test]
    fn test_step_up_window_edges() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let g = TenantConstraintValidator::new(SecurityEventDispatcher::disabled(), clock.clone());
        let request = AuthorizationRequest::new().with_data_breach_risk(true);
        let base = ctx(OrgId::random(), ClassificationLevel::TopSecret);

        let fresh = base.clone().with_last_activity(clock.now() - Duration::minutes(30));
        assert!(g.assert_enhanced_tenant_constraints(&request, &fresh).is_ok());

        assert_eq!(
            g.assert_enhanced_tenant_constraints(&request, &base).unwrap_err(),
            AuthorizationError::StepUpReauthRequired
        );

        let lenient = TenantConstraintValidator::new(SecurityEventDispatcher::disabled(), clock)
            .with_step_up(StepUpPolicy {
                require_activity_timestamp: false,
                ..StepUpPolicy::default()
            });
        assert!(lenient.assert_enhanced_tenant_constraints(&request, &base).is_ok());

        let secret = base.with_classification(ClassificationLevel::Secret);
        assert!(g.assert_enhanced_tenant_constraints(&request, &secret).is_ok());
    }

    fn level() -> impl Strategy<Value = ClassificationLevel> {
        prop::sample::select(ClassificationLevel::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_readable_iff_rank_clears(c in level(), r in level(), mfa in any::<bool>()) {
            let org = OrgId::random();
            let context = ctx(org, c).with_mfa_verified(mfa);
            let record = ResourceRecord::owned_by(org).with_classification(r);
            let ok = guard().assert_readable(Some(&record), &context, ResourceType::HrPolicy).is_ok();
            prop_assert_eq!(ok, c.rank() >= r.rank());
        }

        #[test]
        fn prop_residency_is_exact(a in "[A-Z_]{1,12}", b in "[A-Z_]{1,12}", c in level()) {
            let org = OrgId::random();
            let context = ctx(org, c).with_residency(ResidencyZone::new(a.clone()));
            let record = ResourceRecord::owned_by(org).with_residency(ResidencyZone::new(b.clone()));
            let ok = guard().assert_readable(Some(&record), &context, ResourceType::HrPolicy).is_ok();
            prop_assert_eq!(ok, a == b);
        }
    }
}
