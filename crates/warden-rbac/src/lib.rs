//! # warden-rbac: Role-Based Access Control
//!
//! Permission-map checks for the authorization pipeline:
//! - **Normalization** of sparse requirement maps and "any-of" profiles
//! - **Role tiers**: only predefined roles may touch SECRET/TOP_SECRET data
//! - **Enforcement**: required pairs AND one satisfied any-profile
//!
//! ## Examples
//!
//! ```
//! use warden_rbac::RbacEvaluator;
//! use warden_types::{
//!     Action, AuthorizationContext, AuthorizationRequest, OrgId, PermissionMap,
//!     ResourceType, RoleKey, UserId,
//! };
//!
//! let context = AuthorizationContext::new(OrgId::random(), UserId::random(), RoleKey::HrAdmin)
//!     .with_permissions(
//!         PermissionMap::new().with(ResourceType::EmployeeProfile, [Action::Read]),
//!     );
//!
//! let request = AuthorizationRequest::for_action(Action::Read, ResourceType::EmployeeProfile)
//!     .with_required_permissions(
//!         PermissionMap::new().with(ResourceType::EmployeeProfile, [Action::Read]),
//!     );
//!
//! RbacEvaluator::new().assert_rbac(&request, &context)?;
//! # Ok::<(), warden_types::AuthorizationError>(())
//! ```

pub mod enforcement;
pub mod permissions;
pub mod roles;

pub use enforcement::RbacEvaluator;
pub use permissions::PermissionNormalizer;
pub use roles::RoleTier;
