//! Rule-based ABAC policies.
//!
//! Policies consist of rules, each with conditions that must all match for
//! the rule to apply. Rules are evaluated by priority (highest first), and
//! the first matching rule determines the outcome. When nothing matches the
//! policy's default effect applies, which is `Deny` unless stated otherwise.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_types::{Action, AttributeBag, ClassificationLevel, ResidencyZone, ResourceType};

use crate::attributes::SubjectAttributes;

// ============================================================================
// Effect
// ============================================================================

/// The effect of a policy rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    #[default]
    Deny,
}

// ============================================================================
// Condition
// ============================================================================

/// A condition that must hold for a rule to match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    // -- Subject --
    /// Subject holds at least one of these role tokens.
    RoleIn(Vec<String>),
    /// Subject clearance is at most this tier.
    ClassificationAtMost(ClassificationLevel),
    /// Subject clearance is at least this tier.
    ClassificationAtLeast(ClassificationLevel),
    /// Subject residency zone equals this zone.
    ResidencyEquals(ResidencyZone),
    MfaVerified,
    BreachRisk,

    // -- Request --
    ActionIn(Vec<Action>),
    ResourceTypeIn(Vec<ResourceType>),

    // -- Resource bag --
    /// Resource bag holds `key` with exactly `value`.
    ResourceAttributeEquals { key: String, value: Value },
    /// Resource bag holds `key` at all.
    ResourceAttributePresent(String),

    // -- Logical combinators --
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

/// Inputs of a single policy evaluation.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput<'a> {
    pub action: Action,
    pub resource_type: ResourceType,
    pub subject: &'a SubjectAttributes,
    pub resource: &'a AttributeBag,
}

impl Condition {
    /// Recursively evaluates this condition.
    pub fn matches(&self, input: &PolicyInput<'_>) -> bool {
        match self {
            Condition::RoleIn(roles) => roles.iter().any(|r| input.subject.has_role(r)),
            Condition::ClassificationAtMost(max) => input.subject.data_classification <= *max,
            Condition::ClassificationAtLeast(min) => input.subject.data_classification >= *min,
            Condition::ResidencyEquals(zone) => input.subject.data_residency == *zone,
            Condition::MfaVerified => input.subject.mfa_verified,
            Condition::BreachRisk => input.subject.data_breach_risk,

            Condition::ActionIn(actions) => actions.contains(&input.action),
            Condition::ResourceTypeIn(types) => types.contains(&input.resource_type),

            Condition::ResourceAttributeEquals { key, value } => {
                input.resource.get(key).is_some_and(|v| v == value)
            }
            Condition::ResourceAttributePresent(key) => input.resource.contains_key(key),

            Condition::And(sub) => sub.iter().all(|c| c.matches(input)),
            Condition::Or(sub) => sub.iter().any(|c| c.matches(input)),
            Condition::Not(sub) => !sub.matches(input),
        }
    }
}

// ============================================================================
// Rule
// ============================================================================

/// A single rule within a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Name for audit logging.
    pub name: String,
    pub effect: Effect,
    /// All conditions must hold for the rule to match.
    pub conditions: Vec<Condition>,
    /// Higher values are evaluated first.
    pub priority: u32,
}

impl Rule {
    pub fn new(name: &str, effect: Effect, priority: u32) -> Self {
        Self {
            name: name.to_string(),
            effect,
            conditions: Vec::new(),
            priority,
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

// ============================================================================
// Decision
// ============================================================================

/// Outcome of evaluating a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub effect: Effect,
    /// Name of the matched rule, `None` when the default applied.
    pub matched_rule: Option<String>,
    pub reason: String,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        self.effect == Effect::Allow
    }
}

// ============================================================================
// RulePolicy
// ============================================================================

/// Priority-ordered rule set with a default effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulePolicy {
    pub rules: Vec<Rule>,
    pub default_effect: Effect,
}

impl RulePolicy {
    pub fn new(default_effect: Effect) -> Self {
        Self {
            rules: Vec::new(),
            default_effect,
        }
    }

    /// Adds a rule (builder pattern).
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Baseline policy for HR tenants.
    ///
    /// Rules:
    /// 1. Deny breach-risk operations without verified MFA
    /// 2. Deny platform support and impersonation to everyone but owners
    /// 3. Allow everything else
    pub fn hr_baseline() -> Self {
        Self::new(Effect::Deny)
            .with_rule(
                Rule::new("deny-breach-risk-without-mfa", Effect::Deny, 100)
                    .when(Condition::BreachRisk)
                    .when(Condition::Not(Box::new(Condition::MfaVerified))),
            )
            .with_rule(
                Rule::new("deny-platform-access", Effect::Deny, 90)
                    .when(Condition::ResourceTypeIn(vec![
                        ResourceType::PlatformSupport,
                        ResourceType::PlatformImpersonation,
                    ]))
                    .when(Condition::Not(Box::new(Condition::RoleIn(vec![
                        "owner".to_string(),
                    ])))),
            )
            .with_rule(Rule::new("allow-tenant-access", Effect::Allow, 0))
    }

    /// Evaluates the policy against one request.
    ///
    /// Ties in priority keep declaration order.
    pub fn evaluate(&self, input: &PolicyInput<'_>) -> Decision {
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        for rule in rules {
            if rule.conditions.iter().all(|c| c.matches(input)) {
                return Decision {
                    effect: rule.effect,
                    matched_rule: Some(rule.name.clone()),
                    reason: format!("Matched rule '{}' (priority {})", rule.name, rule.priority),
                };
            }
        }

        Decision {
            effect: self.default_effect,
            matched_rule: None,
            reason: format!(
                "No rule matched; applying default effect: {:?}",
                self.default_effect
            ),
        }
    }
}
