//! # warden-types: Core types for `Warden`
//!
//! This crate contains the vocabulary shared by every gate of the
//! authorization kernel:
//! - Entity IDs ([`OrgId`], [`UserId`])
//! - Sensitivity tiers ([`ClassificationLevel`]) and residency zones ([`ResidencyZone`])
//! - Closed permission vocabulary ([`ResourceType`], [`Action`], [`PermissionMap`])
//! - Roles ([`RoleKey`])
//! - Request-scoped inputs ([`AuthorizationContext`], [`AuthorizationRequest`], [`ResourceRecord`])
//! - Audit records ([`SecurityEventLogInput`], [`Severity`])
//! - Time sources ([`Clock`], [`SystemClock`], [`FixedClock`])
//! - The unified denial type ([`AuthorizationError`])

mod classification;
mod clock;
mod context;
mod error;
mod event;
mod ids;
mod permission;
mod residency;
mod role;

pub use classification::ClassificationLevel;
pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{
    AttributeBag, AuthorizationContext, AuthorizationRequest, Operation, ResourceRecord,
};
pub use error::{AuthorizationError, PermissionError};
pub use event::{SecurityEventLogInput, Severity};
pub use ids::{OrgId, UserId};
pub use permission::{Action, PermissionMap, ResourceType};
pub use residency::ResidencyZone;
pub use role::RoleKey;

/// Result type for gate checks.
pub type AuthResult<T> = std::result::Result<T, AuthorizationError>;
