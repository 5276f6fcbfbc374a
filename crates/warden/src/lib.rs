//! # Warden
//!
//! Fail-closed authorization and data-governance kernel for multi-tenant
//! services.
//!
//! Every read, write, update and delete of tenant data passes through the
//! kernel first. It composes independent policy dimensions into one
//! decision:
//!
//! - **Tenant isolation** - a context never touches another org's records
//! - **Classification** - OFFICIAL < OFFICIAL_SENSITIVE < SECRET < TOP_SECRET
//! - **Residency** - opaque zones compared by exact equality
//! - **RBAC / ABAC** - permission maps, then an external policy decision
//! - **PII** - detection, protection and sanitized elevated writes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     AuthorizationPipeline                    │
//! │  ┌─────────┐   ┌─────────────┐   ┌────────┐   ┌───────────┐  │
//! │  │ Session │ → │   Tenant    │ → │  RBAC  │ → │   ABAC    │  │
//! │  │ (sync)  │   │ constraints │   │ (sync) │   │  (async)  │  │
//! │  └─────────┘   └─────────────┘   └────────┘   └───────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!            every denial → SecurityEventDispatcher → sink
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use warden::{
//!     Action, AllowAllPolicy, AuthorizationContext, AuthorizationKernel, AuthorizationRequest,
//!     OrgId, PermissionMap, ResourceRecord, ResourceType, RoleKey, UserId, WardenConfig,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let kernel = AuthorizationKernel::from_config(
//!     &WardenConfig::default(),
//!     Arc::new(AllowAllPolicy),
//!     None,
//! )?;
//!
//! let org = OrgId::random();
//! let ctx = AuthorizationContext::new(org, UserId::random(), RoleKey::Manager)
//!     .with_permissions(PermissionMap::new().with(ResourceType::LeaveRequest, [Action::Read]));
//!
//! let request = AuthorizationRequest::for_action(Action::Read, ResourceType::LeaveRequest)
//!     .with_required_permissions(
//!         PermissionMap::new().with(ResourceType::LeaveRequest, [Action::Read]),
//!     );
//! kernel.execute_authorization(&request, &ctx).await?;
//!
//! let record = ResourceRecord::owned_by(org);
//! kernel.assert_readable(Some(&record), &ctx, ResourceType::LeaveRequest)?;
//! # Ok::<(), warden::WardenError>(())
//! # }).unwrap();
//! ```
//!
//! # Modules
//!
//! - **Facade**: [`AuthorizationKernel`], [`AuthorizationPipeline`]
//! - **Gates**: [`TenantConstraintValidator`], [`RbacEvaluator`], [`AbacEvaluator`],
//!   [`PiiComplianceGate`]
//! - **Vocabulary**: re-exported from `warden-types`

mod error;
mod kernel;
mod pipeline;

pub use error::{Result, WardenError};
pub use kernel::AuthorizationKernel;
pub use pipeline::{AUTHORIZATION_DENIED_EVENT, AuthorizationPipeline, Gate};

// Re-export core types
pub use warden_types::{
    Action, AttributeBag, AuthResult, AuthorizationContext, AuthorizationError,
    AuthorizationRequest, ClassificationLevel, Clock, FixedClock, Operation, OrgId,
    PermissionError, PermissionMap, ResidencyZone, ResourceRecord, ResourceType, RoleKey,
    SecurityEventLogInput, Severity, SystemClock, UserId,
};

// Re-export RBAC
pub use warden_rbac::{PermissionNormalizer, RbacEvaluator, RoleTier};

// Re-export ABAC
pub use warden_abac::{
    AbacEvaluator, AllowAllPolicy, PolicyDecisionError, PolicyDecisionPoint, Rule, RulePolicy,
    StaticPolicyStore, SubjectAttributes,
};

// Re-export tenant guard, PII and audit
pub use warden_compliance::{
    DataComplianceReport, MemorySink, PiiComplianceGate, PiiDetectionResult, PiiProtectionResult,
    PiiProtector, PiiScanner, PiiType, ProtectionKeys, ProtectionLevel, SecurityEventDispatcher,
    SecurityEventSink, SinkError, StepUpPolicy, TenantConstraintValidator,
    assert_data_compliance, validate_data_compliance,
};

// Re-export configuration
pub use warden_config::{ConfigLayer, ConfigLoader, WardenConfig};
