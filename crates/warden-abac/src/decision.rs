//! Policy decision point seam.
//!
//! The kernel never owns policy storage. Anything able to answer
//! "may this subject do this action on this resource" plugs in here: a
//! remote policy service, an in-process [`crate::StaticPolicyStore`], or a
//! test double.

use async_trait::async_trait;
use thiserror::Error;
use warden_types::{Action, AttributeBag, OrgId, ResourceType};

use crate::attributes::SubjectAttributes;

/// Failure to obtain a decision. The evaluator treats it as a deny.
#[derive(Debug, Error)]
pub enum PolicyDecisionError {
    #[error("policy store unavailable: {0}")]
    Unavailable(String),

    #[error("no policy configured for organization {0}")]
    NoPolicy(OrgId),

    #[error("policy evaluation failed: {0}")]
    Evaluation(String),
}

/// Boolean policy decision interface.
#[async_trait]
pub trait PolicyDecisionPoint: Send + Sync {
    /// Returns `Ok(true)` to allow, `Ok(false)` to deny.
    async fn evaluate(
        &self,
        org_id: OrgId,
        action: Action,
        resource_type: ResourceType,
        subject: &SubjectAttributes,
        resource: &AttributeBag,
    ) -> Result<bool, PolicyDecisionError>;
}

/// Decision point that allows everything.
///
/// Leaves the pipeline with RBAC and the tenant constraints as the only
/// gates, plus the TOP_SECRET MFA check.
pub struct AllowAllPolicy;

#[async_trait]
impl PolicyDecisionPoint for AllowAllPolicy {
    async fn evaluate(
        &self,
        _org_id: OrgId,
        _action: Action,
        _resource_type: ResourceType,
        _subject: &SubjectAttributes,
        _resource: &AttributeBag,
    ) -> Result<bool, PolicyDecisionError> {
        Ok(true)
    }
}
