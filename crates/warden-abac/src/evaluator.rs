//! ABAC enforcement.
//!
//! Builds the attribute bags, asks the policy decision point, then applies
//! the TOP_SECRET MFA gate on top of any allow.

use std::sync::Arc;

use tracing::{debug, warn};
use warden_types::{
    AuthResult, AuthorizationContext, AuthorizationError, AuthorizationRequest,
    ClassificationLevel,
};

use crate::attributes::{SubjectAttributes, resource_attributes};
use crate::decision::PolicyDecisionPoint;

/// Attribute-based evaluator backed by a [`PolicyDecisionPoint`].
pub struct AbacEvaluator {
    pdp: Arc<dyn PolicyDecisionPoint>,
}

impl AbacEvaluator {
    pub fn new(pdp: Arc<dyn PolicyDecisionPoint>) -> Self {
        Self { pdp }
    }

    /// Evaluates the request against the external policy.
    ///
    /// A request without both an action and a resource type is not subject to
    /// ABAC and passes. A policy error is a deny. After a policy allow,
    /// TOP_SECRET contexts without verified MFA are still rejected.
    pub async fn assert_abac(
        &self,
        request: &AuthorizationRequest,
        context: &AuthorizationContext,
    ) -> AuthResult<()> {
        let (Some(action), Some(resource_type)) = (request.action, request.resource_type) else {
            return Ok(());
        };

        let subject = SubjectAttributes::from_request(context, request);
        let resource = resource_attributes(context, request);

        let allowed = match self
            .pdp
            .evaluate(context.org_id, action, resource_type, &subject, &resource)
            .await
        {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!(
                    org_id = %context.org_id,
                    action = %action,
                    resource_type = %resource_type,
                    error = %e,
                    "Policy decision failed, denying"
                );
                return Err(AuthorizationError::AbacDenied {
                    reason: format!("policy decision unavailable: {e}"),
                });
            }
        };

        if !allowed {
            warn!(
                org_id = %context.org_id,
                user_id = %context.user_id,
                action = %action,
                resource_type = %resource_type,
                "ABAC policy denied"
            );
            return Err(AuthorizationError::AbacDenied {
                reason: format!("policy denied {action} on {resource_type}"),
            });
        }

        if context.data_classification == ClassificationLevel::TopSecret && !context.mfa_verified {
            warn!(
                org_id = %context.org_id,
                user_id = %context.user_id,
                "TOP_SECRET access without verified MFA"
            );
            return Err(AuthorizationError::MfaRequired {
                reason: "TOP_SECRET data requires verified MFA".to_string(),
            });
        }

        debug!(
            org_id = %context.org_id,
            action = %action,
            resource_type = %resource_type,
            "ABAC check passed"
        );
        Ok(())
    }
}
