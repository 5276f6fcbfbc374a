//! RBAC enforcement.
//!
//! Checks that a context's granted permissions satisfy a request's
//! requirements, after the role tier rule for the top classifications.

use tracing::{debug, warn};
use warden_types::{AuthResult, AuthorizationContext, AuthorizationError, AuthorizationRequest};

use crate::permissions::PermissionNormalizer;
use crate::roles::may_access_classification;

/// Role and permission-map evaluator.
pub struct RbacEvaluator {
    /// Whether to log decisions.
    audit_enabled: bool,
}

impl RbacEvaluator {
    pub fn new() -> Self {
        Self {
            audit_enabled: true,
        }
    }

    /// Disables decision logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    /// Enforces the request's permission requirements against the context.
    ///
    /// In order:
    /// 1. A custom role is denied on SECRET and TOP_SECRET contexts, whatever
    ///    its permissions and even when nothing is required.
    /// 2. With no normalized requirement at all, the check passes.
    /// 3. Every `(resource, action)` pair in `required_permissions` must be held.
    /// 4. At least one of `required_any_permission_profiles` must be fully
    ///    held. An empty list is vacuously satisfied.
    pub fn assert_rbac(
        &self,
        request: &AuthorizationRequest,
        context: &AuthorizationContext,
    ) -> AuthResult<()> {
        if !may_access_classification(context.role_key, context.data_classification) {
            return Err(self.deny(
                context,
                format!(
                    "custom role may not act on {} data",
                    context.data_classification
                ),
            ));
        }

        let required = PermissionNormalizer::normalize(&request.required_permissions);
        let profiles =
            PermissionNormalizer::normalize_profiles(&request.required_any_permission_profiles);

        if required.is_empty() && profiles.is_empty() {
            return Ok(());
        }

        if let Some((resource, action)) = required
            .pairs()
            .find(|(resource, action)| !context.permissions.contains(*resource, *action))
        {
            return Err(self.deny(context, format!("missing permission {resource}.{action}")));
        }

        let any_satisfied =
            profiles.is_empty() || profiles.iter().any(|p| context.permissions.satisfies(p));
        if !any_satisfied {
            return Err(self.deny(
                context,
                format!("none of {} permission profiles satisfied", profiles.len()),
            ));
        }

        if self.audit_enabled {
            debug!(
                org_id = %context.org_id,
                user_id = %context.user_id,
                role = %context.role_key,
                "RBAC check passed"
            );
        }
        Ok(())
    }

    fn deny(&self, context: &AuthorizationContext, reason: String) -> AuthorizationError {
        if self.audit_enabled {
            warn!(
                org_id = %context.org_id,
                user_id = %context.user_id,
                role = %context.role_key,
                classification = %context.data_classification,
                reason = %reason,
                "RBAC check denied"
            );
        }
        AuthorizationError::RbacDenied { reason }
    }
}

impl Default for RbacEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use warden_types::{
        Action, ClassificationLevel, OrgId, PermissionMap, ResourceType, RoleKey, UserId,
    };

    fn context(role: RoleKey, level: ClassificationLevel) -> AuthorizationContext {
        AuthorizationContext::new(OrgId::random(), UserId::random(), role)
            .with_classification(level)
            .with_permissions(
                PermissionMap::new()
                    .with(ResourceType::EmployeeProfile, [Action::Read, Action::Update])
                    .with(ResourceType::Absence, [Action::Approve]),
            )
    }

    fn evaluator() -> RbacEvaluator {
        RbacEvaluator::new().without_audit()
    }

    #[test]
    fn test_no_requirements_passes() {
        let ctx = context(RoleKey::Member, ClassificationLevel::Official);
        assert!(evaluator().assert_rbac(&AuthorizationRequest::new(), &ctx).is_ok());
    }

    #[test]
    fn test_empty_action_sets_count_as_no_requirement() {
        let ctx = AuthorizationContext::new(OrgId::random(), UserId::random(), RoleKey::Member);
        let mut required = PermissionMap::new().with(ResourceType::Invoice, [Action::Read]);
        required.revoke(ResourceType::Invoice, Action::Read);
        let req = AuthorizationRequest::new()
            .with_required_permissions(required)
            .with_any_profile(PermissionMap::new());
        assert!(evaluator().assert_rbac(&req, &ctx).is_ok());
    }

    #[test]
    fn test_missing_required_pair_denies() {
        let ctx = context(RoleKey::Manager, ClassificationLevel::Official);
        let req = AuthorizationRequest::new().with_required_permissions(
            PermissionMap::new().with(ResourceType::EmployeeProfile, [Action::Delete]),
        );
        let err = evaluator().assert_rbac(&req, &ctx).unwrap_err();
        assert_eq!(err.code(), "rbac_denied");
    }

    #[test]
    fn test_required_and_any_profile_both_needed() {
        let ctx = context(RoleKey::Manager, ClassificationLevel::Official);
        let required = PermissionMap::new().with(ResourceType::EmployeeProfile, [Action::Read]);

        let unmet = AuthorizationRequest::new()
            .with_required_permissions(required.clone())
            .with_any_profile(PermissionMap::new().with(ResourceType::Invoice, [Action::Read]));
        assert!(evaluator().assert_rbac(&unmet, &ctx).is_err());

        let met = unmet
            .with_any_profile(PermissionMap::new().with(ResourceType::Absence, [Action::Approve]));
        assert!(evaluator().assert_rbac(&met, &ctx).is_ok());
    }

    #[test]
    fn test_custom_role_denied_on_secret_without_requirements() {
        let ctx = context(RoleKey::Custom, ClassificationLevel::Secret);
        let err = evaluator()
            .assert_rbac(&AuthorizationRequest::new(), &ctx)
            .unwrap_err();
        assert!(matches!(err, AuthorizationError::RbacDenied { .. }));
    }

    #[test]
    fn test_custom_role_allowed_below_secret() {
        let ctx = context(RoleKey::Custom, ClassificationLevel::OfficialSensitive);
        let req = AuthorizationRequest::new().with_required_permissions(
            PermissionMap::new().with(ResourceType::EmployeeProfile, [Action::Read]),
        );
        assert!(evaluator().assert_rbac(&req, &ctx).is_ok());
    }

    proptest! {
        #[test]
        fn prop_custom_role_denied_on_elevated_even_when_satisfied(
            level in prop::sample::select(vec![ClassificationLevel::Secret, ClassificationLevel::TopSecret]),
        ) {
            let ctx = context(RoleKey::Custom, level);
            let req = AuthorizationRequest::new().with_required_permissions(
                PermissionMap::new().with(ResourceType::EmployeeProfile, [Action::Read]),
            );
            prop_assert!(ctx.permissions.satisfies(&req.required_permissions));
            prop_assert!(evaluator().assert_rbac(&req, &ctx).is_err());
        }
    }
}
