//! # warden-abac: Attribute-Based Access Control
//!
//! Context-aware access decisions delegated to a policy decision point.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  AuthorizationRequest + AuthorizationContext │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  AbacEvaluator                               │
//! │  ├─ Build subject attributes                 │
//! │  ├─ Build resource attribute bag             │
//! │  └─ Ask PolicyDecisionPoint (async)          │
//! └─────────────────┬───────────────────────────┘
//!                   │ allow
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  TOP_SECRET MFA gate                         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use warden_abac::{AbacEvaluator, RulePolicy, StaticPolicyStore};
//! use warden_types::{
//!     Action, AuthorizationContext, AuthorizationRequest, OrgId, ResourceType, RoleKey, UserId,
//! };
//!
//! # tokio_test_block(async {
//! let store = StaticPolicyStore::uniform(RulePolicy::hr_baseline());
//! let evaluator = AbacEvaluator::new(Arc::new(store));
//!
//! let context = AuthorizationContext::new(OrgId::random(), UserId::random(), RoleKey::Manager);
//! let request = AuthorizationRequest::for_action(Action::Read, ResourceType::Absence);
//!
//! evaluator.assert_abac(&request, &context).await.unwrap();
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod attributes;
pub mod decision;
pub mod evaluator;
pub mod policy;
pub mod store;

pub use attributes::{SubjectAttributes, resource_attributes};
pub use decision::{AllowAllPolicy, PolicyDecisionError, PolicyDecisionPoint};
pub use evaluator::AbacEvaluator;
pub use policy::{Condition, Decision, Effect as PolicyEffect, PolicyInput, Rule, RulePolicy};
pub use store::StaticPolicyStore;
