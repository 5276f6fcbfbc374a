//! Kernel wiring.
//!
//! [`AuthorizationKernel`] builds every gate from a [`WardenConfig`] and
//! shares one dispatcher and one clock between them. Callers hold one
//! kernel per process and pass it down explicitly.

use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;
use warden_abac::{AbacEvaluator, PolicyDecisionPoint};
use warden_compliance::{
    PiiComplianceGate, PiiDetectionResult, PiiProtectionResult, PiiProtector, PiiScanner,
    ProtectionKeys, ProtectionLevel, SecurityEventDispatcher, SecurityEventSink, StepUpPolicy,
    TenantConstraintValidator,
};
use warden_config::WardenConfig;
use warden_rbac::RbacEvaluator;
use warden_types::{
    AuthResult, AuthorizationContext, AuthorizationRequest, Clock, Operation, OrgId,
    ResourceRecord, ResourceType, SystemClock,
};

use crate::error::Result;
use crate::pipeline::AuthorizationPipeline;

/// Every gate, wired from configuration.
pub struct AuthorizationKernel {
    guard: Arc<TenantConstraintValidator>,
    protector: Arc<PiiProtector>,
    pii_gate: PiiComplianceGate,
    pipeline: AuthorizationPipeline,
    dispatcher: SecurityEventDispatcher,
}

impl AuthorizationKernel {
    /// Builds the kernel on the system clock.
    ///
    /// `sink` receives security events when `audit.enabled` is set; without
    /// one, events only reach `tracing`.
    pub fn from_config(
        config: &WardenConfig,
        pdp: Arc<dyn PolicyDecisionPoint>,
        sink: Option<Arc<dyn SecurityEventSink>>,
    ) -> Result<Self> {
        Self::from_config_with_clock(config, pdp, sink, Arc::new(SystemClock))
    }

    pub fn from_config_with_clock(
        config: &WardenConfig,
        pdp: Arc<dyn PolicyDecisionPoint>,
        sink: Option<Arc<dyn SecurityEventSink>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let dispatcher = SecurityEventDispatcher::new(sink).with_enabled(config.audit.enabled);

        let keys = ProtectionKeys::from_base64(
            config.pii.encryption_key.as_deref(),
            config.pii.tokenization_key.as_deref(),
        )?;
        let scanner = PiiScanner::with_confidence(config.pii.match_confidence)?;
        let protector = Arc::new(PiiProtector::new(scanner, keys));

        let guard = Arc::new(
            TenantConstraintValidator::new(dispatcher.clone(), clock.clone()).with_step_up(
                StepUpPolicy {
                    inactivity: Duration::minutes(i64::from(config.step_up.inactivity_minutes)),
                    require_activity_timestamp: config.step_up.require_activity_timestamp,
                },
            ),
        );

        let pii_gate = PiiComplianceGate::new(protector.clone(), dispatcher.clone(), clock.clone())
            .with_sanitize_elevated_writes(config.pii.sanitize_elevated_writes);

        let pipeline = AuthorizationPipeline::new(
            guard.clone(),
            RbacEvaluator::new(),
            AbacEvaluator::new(pdp),
            dispatcher.clone(),
            clock,
        );

        tracing::info!(
            audit_sink = dispatcher.has_sink(),
            inactivity_minutes = config.step_up.inactivity_minutes,
            sanitize_elevated_writes = config.pii.sanitize_elevated_writes,
            "Authorization kernel initialized"
        );

        Ok(Self {
            guard,
            protector,
            pii_gate,
            pipeline,
            dispatcher,
        })
    }

    pub fn guard(&self) -> &TenantConstraintValidator {
        &self.guard
    }

    pub fn pipeline(&self) -> &AuthorizationPipeline {
        &self.pipeline
    }

    pub fn pii_gate(&self) -> &PiiComplianceGate {
        &self.pii_gate
    }

    pub fn protector(&self) -> &PiiProtector {
        &self.protector
    }

    pub fn dispatcher(&self) -> &SecurityEventDispatcher {
        &self.dispatcher
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    pub fn assert_readable<'r>(
        &self,
        record: Option<&'r ResourceRecord>,
        context: &AuthorizationContext,
        resource_type: ResourceType,
    ) -> AuthResult<&'r ResourceRecord> {
        self.guard.assert_readable(record, context, resource_type)
    }

    pub fn assert_writable(
        &self,
        record_org_id: Option<&OrgId>,
        context: &AuthorizationContext,
        resource_type: ResourceType,
        operation: Operation,
    ) -> AuthResult<()> {
        self.guard
            .assert_writable(record_org_id, context, resource_type, operation)
    }

    pub async fn execute_authorization(
        &self,
        request: &AuthorizationRequest,
        context: &AuthorizationContext,
    ) -> AuthResult<()> {
        self.pipeline.execute_authorization(request, context).await
    }

    pub fn detect_pii(&self, value: &Value) -> PiiDetectionResult {
        self.protector.scanner().detect_pii(value)
    }

    pub fn protect_pii(&self, value: &Value, level: ProtectionLevel) -> Result<PiiProtectionResult> {
        Ok(self.protector.protect_pii(value, level)?)
    }

    /// See [`PiiComplianceGate::assert_pii_compliance`]; write the returned
    /// value, not the one passed in.
    pub fn assert_pii_compliance(
        &self,
        context: &AuthorizationContext,
        data: Value,
        operation: Operation,
    ) -> AuthResult<Value> {
        self.pii_gate.assert_pii_compliance(context, data, operation)
    }
}

impl std::fmt::Debug for AuthorizationKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationKernel")
            .field("guard", &self.guard)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
