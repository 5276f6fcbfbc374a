//! Closed permission vocabulary.
//!
//! Resource types and actions are enumerations rather than free-form strings
//! so that every evaluator can match on them exhaustively. Free-form input
//! from the outer layers is validated once, at construction time, through
//! [`FromStr`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PermissionError;

// ============================================================================
// Resource types
// ============================================================================

/// Tenant-owned resource families guarded by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    Organization,
    Member,
    Role,
    EmployeeProfile,
    EmploymentContract,
    Absence,
    LeaveRequest,
    TimeEntry,
    TrainingRecord,
    PerformanceReview,
    HrPolicy,
    BillingPlan,
    Invoice,
    AuditLog,
    SecurityEvent,
    PlatformSupport,
    PlatformImpersonation,
}

impl ResourceType {
    pub const ALL: [ResourceType; 17] = [
        ResourceType::Organization,
        ResourceType::Member,
        ResourceType::Role,
        ResourceType::EmployeeProfile,
        ResourceType::EmploymentContract,
        ResourceType::Absence,
        ResourceType::LeaveRequest,
        ResourceType::TimeEntry,
        ResourceType::TrainingRecord,
        ResourceType::PerformanceReview,
        ResourceType::HrPolicy,
        ResourceType::BillingPlan,
        ResourceType::Invoice,
        ResourceType::AuditLog,
        ResourceType::SecurityEvent,
        ResourceType::PlatformSupport,
        ResourceType::PlatformImpersonation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Organization => "organization",
            ResourceType::Member => "member",
            ResourceType::Role => "role",
            ResourceType::EmployeeProfile => "employeeProfile",
            ResourceType::EmploymentContract => "employmentContract",
            ResourceType::Absence => "absence",
            ResourceType::LeaveRequest => "leaveRequest",
            ResourceType::TimeEntry => "timeEntry",
            ResourceType::TrainingRecord => "trainingRecord",
            ResourceType::PerformanceReview => "performanceReview",
            ResourceType::HrPolicy => "hrPolicy",
            ResourceType::BillingPlan => "billingPlan",
            ResourceType::Invoice => "invoice",
            ResourceType::AuditLog => "auditLog",
            ResourceType::SecurityEvent => "securityEvent",
            ResourceType::PlatformSupport => "platformSupport",
            ResourceType::PlatformImpersonation => "platformImpersonation",
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| PermissionError::UnknownResource(s.to_string()))
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Operations a permission may grant on a resource.
///
/// The `pii:*` actions are PII scopes: holding any of them on any resource
/// marks the context as cleared to handle personal data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "invite")]
    Invite,
    #[serde(rename = "approve")]
    Approve,
    #[serde(rename = "export")]
    Export,
    #[serde(rename = "manage")]
    Manage,
    #[serde(rename = "request")]
    Request,
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "stop")]
    Stop,
    #[serde(rename = "pii:read")]
    PiiRead,
    #[serde(rename = "pii:write")]
    PiiWrite,
    #[serde(rename = "pii:delete")]
    PiiDelete,
    #[serde(rename = "pii:process")]
    PiiProcess,
}

impl Action {
    pub const ALL: [Action; 16] = [
        Action::Read,
        Action::List,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Invite,
        Action::Approve,
        Action::Export,
        Action::Manage,
        Action::Request,
        Action::Start,
        Action::Stop,
        Action::PiiRead,
        Action::PiiWrite,
        Action::PiiDelete,
        Action::PiiProcess,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Invite => "invite",
            Action::Approve => "approve",
            Action::Export => "export",
            Action::Manage => "manage",
            Action::Request => "request",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::PiiRead => "pii:read",
            Action::PiiWrite => "pii:write",
            Action::PiiDelete => "pii:delete",
            Action::PiiProcess => "pii:process",
        }
    }

    /// Returns whether this action is a PII scope (`pii:*`).
    pub fn is_pii_scope(self) -> bool {
        matches!(
            self,
            Action::PiiRead | Action::PiiWrite | Action::PiiDelete | Action::PiiProcess
        )
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| PermissionError::UnknownAction(s.to_string()))
    }
}

// ============================================================================
// Permission map
// ============================================================================

/// Mapping of resource type to the set of actions granted (or required) on it.
///
/// Used both for the permissions a context holds and for the permissions a
/// request requires. Ordered collections keep iteration and serialization
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<ResourceType, BTreeSet<Action>>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds actions on a resource (builder pattern).
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_types::{Action, PermissionMap, ResourceType};
    ///
    /// let granted = PermissionMap::new()
    ///     .with(ResourceType::EmployeeProfile, [Action::Read, Action::Update]);
    /// assert!(granted.contains(ResourceType::EmployeeProfile, Action::Read));
    /// assert!(!granted.contains(ResourceType::EmployeeProfile, Action::Delete));
    /// ```
    pub fn with(mut self, resource: ResourceType, actions: impl IntoIterator<Item = Action>) -> Self {
        self.0.entry(resource).or_default().extend(actions);
        self
    }

    /// Grants a single action.
    pub fn grant(&mut self, resource: ResourceType, action: Action) {
        self.0.entry(resource).or_default().insert(action);
    }

    /// Removes a single action, dropping the resource entry once it is empty.
    pub fn revoke(&mut self, resource: ResourceType, action: Action) {
        if let Some(actions) = self.0.get_mut(&resource) {
            actions.remove(&action);
            if actions.is_empty() {
                self.0.remove(&resource);
            }
        }
    }

    pub fn contains(&self, resource: ResourceType, action: Action) -> bool {
        self.0
            .get(&resource)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Actions held on a resource, if any.
    pub fn actions(&self, resource: ResourceType) -> Option<&BTreeSet<Action>> {
        self.0.get(&resource)
    }

    /// Returns `true` when no resource carries any action.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    /// Iterates `(resource, actions)` entries, including empty action sets.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, &BTreeSet<Action>)> {
        self.0.iter().map(|(resource, actions)| (*resource, actions))
    }

    /// Iterates every `(resource, action)` pair.
    pub fn pairs(&self) -> impl Iterator<Item = (ResourceType, Action)> + '_ {
        self.0
            .iter()
            .flat_map(|(resource, actions)| actions.iter().map(move |a| (*resource, *a)))
    }

    /// Returns whether every pair in `required` is present in `self`.
    pub fn satisfies(&self, required: &PermissionMap) -> bool {
        required
            .pairs()
            .all(|(resource, action)| self.contains(resource, action))
    }

    /// Returns whether any resource carries a `pii:*` action.
    pub fn has_pii_scope(&self) -> bool {
        self.0
            .values()
            .any(|actions| actions.iter().any(|a| a.is_pii_scope()))
    }

    /// Drops resources whose action set is empty.
    pub fn retain_non_empty(&mut self) {
        self.0.retain(|_, actions| !actions.is_empty());
    }
}

impl FromIterator<(ResourceType, Action)> for PermissionMap {
    fn from_iter<I: IntoIterator<Item = (ResourceType, Action)>>(iter: I) -> Self {
        let mut map = PermissionMap::new();
        for (resource, action) in iter {
            map.grant(resource, action);
        }
        map
    }
}
