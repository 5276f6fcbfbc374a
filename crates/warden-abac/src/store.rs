//! In-process policy store.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;
use warden_types::{Action, AttributeBag, OrgId, ResourceType};

use crate::attributes::SubjectAttributes;
use crate::decision::{PolicyDecisionError, PolicyDecisionPoint};
use crate::policy::{PolicyInput, RulePolicy};

/// Per-organization [`RulePolicy`] table with an optional fallback.
///
/// An organization with neither its own policy nor a fallback gets an
/// error, which the evaluator turns into a deny.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyStore {
    policies: HashMap<OrgId, RulePolicy>,
    fallback: Option<RulePolicy>,
}

impl StaticPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that applies `policy` to every organization.
    pub fn uniform(policy: RulePolicy) -> Self {
        Self {
            policies: HashMap::new(),
            fallback: Some(policy),
        }
    }

    pub fn with_org_policy(mut self, org_id: OrgId, policy: RulePolicy) -> Self {
        self.policies.insert(org_id, policy);
        self
    }

    pub fn with_fallback(mut self, policy: RulePolicy) -> Self {
        self.fallback = Some(policy);
        self
    }

    fn policy_for(&self, org_id: OrgId) -> Option<&RulePolicy> {
        self.policies.get(&org_id).or(self.fallback.as_ref())
    }
}

#[async_trait]
impl PolicyDecisionPoint for StaticPolicyStore {
    async fn evaluate(
        &self,
        org_id: OrgId,
        action: Action,
        resource_type: ResourceType,
        subject: &SubjectAttributes,
        resource: &AttributeBag,
    ) -> Result<bool, PolicyDecisionError> {
        let policy = self
            .policy_for(org_id)
            .ok_or(PolicyDecisionError::NoPolicy(org_id))?;

        let decision = policy.evaluate(&PolicyInput {
            action,
            resource_type,
            subject,
            resource,
        });

        debug!(
            org_id = %org_id,
            action = %action,
            resource_type = %resource_type,
            matched_rule = ?decision.matched_rule,
            effect = ?decision.effect,
            "Policy decision"
        );

        Ok(decision.is_allow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Condition, Effect, Rule};
    use warden_types::{AuthorizationContext, AuthorizationRequest, RoleKey, UserId};

    fn subject(org_id: OrgId) -> SubjectAttributes {
        let ctx = AuthorizationContext::new(org_id, UserId::random(), RoleKey::Member);
        SubjectAttributes::from_request(&ctx, &AuthorizationRequest::new())
    }

    #[tokio::test]
    async fn test_org_policy_overrides_fallback() {
        let strict_org = OrgId::random();
        let other_org = OrgId::random();
        let store = StaticPolicyStore::uniform(
            RulePolicy::new(Effect::Deny).with_rule(Rule::new("allow", Effect::Allow, 0)),
        )
        .with_org_policy(
            strict_org,
            RulePolicy::new(Effect::Deny).with_rule(
                Rule::new("members-only-read", Effect::Allow, 0)
                    .when(Condition::ActionIn(vec![Action::Read])),
            ),
        );
        let bag = AttributeBag::new();

        let allowed = store
            .evaluate(other_org, Action::Delete, ResourceType::Member, &subject(other_org), &bag)
            .await
            .unwrap();
        assert!(allowed);

        let denied = store
            .evaluate(strict_org, Action::Delete, ResourceType::Member, &subject(strict_org), &bag)
            .await
            .unwrap();
        assert!(!denied);
    }

    #[tokio::test]
    async fn test_missing_policy_is_an_error() {
        let org = OrgId::random();
        let result = StaticPolicyStore::new()
            .evaluate(org, Action::Read, ResourceType::Member, &subject(org), &AttributeBag::new())
            .await;
        assert!(matches!(result, Err(PolicyDecisionError::NoPolicy(id)) if id == org));
    }
}
