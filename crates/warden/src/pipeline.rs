//! The four-gate authorization pipeline.

use std::sync::Arc;

use tracing::debug;
use warden_abac::AbacEvaluator;
use warden_compliance::audit::{SecurityEventDispatcher, context_event};
use warden_compliance::TenantConstraintValidator;
use warden_rbac::RbacEvaluator;
use warden_types::{AuthResult, AuthorizationContext, AuthorizationError, AuthorizationRequest, Clock};

pub const AUTHORIZATION_DENIED_EVENT: &str = "security.authorization.denied";

/// Gate names as they appear in logs and event metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Session,
    TenantConstraints,
    Rbac,
    Abac,
}

impl Gate {
    pub fn as_str(self) -> &'static str {
        match self {
            Gate::Session => "session",
            Gate::TenantConstraints => "tenant_constraints",
            Gate::Rbac => "rbac",
            Gate::Abac => "abac",
        }
    }
}

/// Runs session, tenant-constraint, RBAC and ABAC checks in that order.
///
/// The order is fixed. Local synchronous checks always run before the
/// policy decision point is consulted, and the first failure ends the call.
pub struct AuthorizationPipeline {
    guard: Arc<TenantConstraintValidator>,
    rbac: RbacEvaluator,
    abac: AbacEvaluator,
    dispatcher: SecurityEventDispatcher,
    clock: Arc<dyn Clock>,
}

impl AuthorizationPipeline {
    pub fn new(
        guard: Arc<TenantConstraintValidator>,
        rbac: RbacEvaluator,
        abac: AbacEvaluator,
        dispatcher: SecurityEventDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            guard,
            rbac,
            abac,
            dispatcher,
            clock,
        }
    }

    /// Authorizes `request` for `context`.
    ///
    /// Returns the first gate failure. Session and tenant-constraint gates
    /// emit their own security events; RBAC and ABAC denials are reported
    /// here before the error is returned.
    pub async fn execute_authorization(
        &self,
        request: &AuthorizationRequest,
        context: &AuthorizationContext,
    ) -> AuthResult<()> {
        self.guard.validate_session_security(request, context)?;
        self.guard
            .assert_enhanced_tenant_constraints(request, context)?;

        if let Err(e) = self.rbac.assert_rbac(request, context) {
            return Err(self.report(Gate::Rbac, request, context, e));
        }
        if let Err(e) = self.abac.assert_abac(request, context).await {
            return Err(self.report(Gate::Abac, request, context, e));
        }

        debug!(
            org_id = %context.org_id,
            user_id = %context.user_id,
            action = ?request.action,
            resource_type = ?request.resource_type,
            "Authorization granted"
        );
        Ok(())
    }

    fn report(
        &self,
        gate: Gate,
        request: &AuthorizationRequest,
        context: &AuthorizationContext,
        error: AuthorizationError,
    ) -> AuthorizationError {
        let mut event = context_event(
            context,
            AUTHORIZATION_DENIED_EVENT,
            error.severity(),
            error.to_string(),
            self.clock.now(),
        )
        .with_metadata("gate", gate.as_str())
        .with_metadata("code", error.code());
        if let Some(resource_type) = request.resource_type {
            event = event.with_resource_type(resource_type.as_str());
        }
        if let Some(action) = request.action {
            event = event.with_metadata("action", action.as_str());
        }
        self.dispatcher.dispatch(event);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use warden_abac::{PolicyDecisionError, PolicyDecisionPoint, SubjectAttributes};
    use warden_compliance::{MemorySink, SecurityEventSink};
    use warden_types::{
        Action, AttributeBag, ClassificationLevel, FixedClock, OrgId, PermissionMap, ResourceType,
        RoleKey, UserId,
    };

    struct Counting {
        calls: AtomicUsize,
        allow: bool,
    }

    #[async_trait]
    impl PolicyDecisionPoint for Counting {
        async fn evaluate(
            &self,
            _org_id: OrgId,
            _action: Action,
            _resource_type: ResourceType,
            _subject: &SubjectAttributes,
            _resource: &AttributeBag,
        ) -> Result<bool, PolicyDecisionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.allow)
        }
    }

    fn pipeline(allow: bool) -> (AuthorizationPipeline, Arc<Counting>, Arc<MemorySink>) {
        let pdp = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            allow,
        });
        let sink = Arc::new(MemorySink::new());
        let dispatcher = SecurityEventDispatcher::new(Some(sink.clone() as Arc<dyn SecurityEventSink>));
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Utc::now()));
        let guard = Arc::new(TenantConstraintValidator::new(dispatcher.clone(), clock.clone()));
        let pipeline = AuthorizationPipeline::new(
            guard,
            RbacEvaluator::new().without_audit(),
            AbacEvaluator::new(pdp.clone()),
            dispatcher,
            clock,
        );
        (pipeline, pdp, sink)
    }

    fn context() -> AuthorizationContext {
        AuthorizationContext::new(OrgId::random(), UserId::random(), RoleKey::Manager)
            .with_permissions(PermissionMap::new().with(ResourceType::LeaveRequest, [Action::Read]))
    }

    #[tokio::test]
    async fn test_rbac_denial_skips_policy_and_is_reported() {
        let (pipeline, pdp, sink) = pipeline(true);
        let request = AuthorizationRequest::for_action(Action::Update, ResourceType::LeaveRequest)
            .with_required_permissions(
                PermissionMap::new().with(ResourceType::LeaveRequest, [Action::Update]),
            );

        let err = pipeline.execute_authorization(&request, &context()).await.unwrap_err();
        assert!(matches!(err, AuthorizationError::RbacDenied { .. }));
        assert_eq!(pdp.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let events = sink.events_of_type(AUTHORIZATION_DENIED_EVENT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metadata["gate"], "rbac");
    }

    #[tokio::test]
    async fn test_policy_deny_is_reported_as_abac() {
        let (pipeline, pdp, sink) = pipeline(false);
        let request = AuthorizationRequest::for_action(Action::Read, ResourceType::LeaveRequest);

        let err = pipeline.execute_authorization(&request, &context()).await.unwrap_err();
        assert!(matches!(err, AuthorizationError::AbacDenied { .. }));
        assert_eq!(pdp.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(sink.events_of_type(AUTHORIZATION_DENIED_EVENT)[0].metadata["gate"], "abac");
    }

    #[tokio::test]
    async fn test_all_gates_pass() {
        let (pipeline, pdp, _) = pipeline(true);
        let request = AuthorizationRequest::for_action(Action::Read, ResourceType::LeaveRequest)
            .with_required_permissions(
                PermissionMap::new().with(ResourceType::LeaveRequest, [Action::Read]),
            );
        pipeline.execute_authorization(&request, &context()).await.unwrap();
        assert_eq!(pdp.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_constraint_failure_precedes_rbac() {
        let (pipeline, pdp, _) = pipeline(true);
        let request = AuthorizationRequest::for_action(Action::Read, ResourceType::LeaveRequest)
            .with_expected_classification(ClassificationLevel::Secret)
            .with_required_permissions(
                PermissionMap::new().with(ResourceType::Invoice, [Action::Delete]),
            );

        let err = pipeline.execute_authorization(&request, &context()).await.unwrap_err();
        assert!(matches!(err, AuthorizationError::ClassificationViolation { .. }));
        assert_eq!(pdp.calls.load(Ordering::SeqCst), 0);
    }
}
