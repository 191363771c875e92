//! Compliance evaluator.
//!
//! Pure functions from a user's [`RoleSet`] and a set of rules to the roles
//! that must be granted. No I/O and no shared state, so evaluation for
//! different users can run concurrently.
//!
//! Only grants are ever produced. Evaluation is idempotent: once every
//! emitted role is held, evaluating again emits nothing.
//!
//! Callers pass rules that already passed the validity filter. A rule whose
//! roles were deleted must not reach the evaluator.

use rolekeeper_core::{RoleId, RoleSet};
use serde::{Deserialize, Serialize};

use crate::types::{Chain, Group, Rule, RuleKind};

/// A role one rule requires the user to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Role to grant.
    pub role: RoleId,
    /// Kind of the implying rule.
    pub rule_kind: RuleKind,
    /// Name of the implying rule.
    pub rule_name: String,
}

/// Group: any member role held and the group role missing emits the group role.
///
/// An empty member list never implies anything.
#[must_use]
pub fn evaluate_group(held: &RoleSet, group: &Group) -> Option<RoleId> {
    (held.contains_any(&group.member_roles) && !held.contains(group.group_role))
        .then_some(group.group_role)
}

/// Chain: every missing rung below the highest held rung, lowest first.
///
/// Lower rungs already held are skipped. Nothing is emitted when no rung is
/// held.
#[must_use]
pub fn evaluate_chain(held: &RoleSet, chain: &Chain) -> Vec<RoleId> {
    let Some(top) = chain.roles.iter().rposition(|r| held.contains(*r)) else {
        return Vec::new();
    };
    chain.roles[..top]
        .iter()
        .copied()
        .filter(|r| !held.contains(*r))
        .collect()
}

/// Roles one rule requires, in rule order.
#[must_use]
pub fn evaluate_rule(held: &RoleSet, rule: &Rule) -> Vec<RoleId> {
    match rule {
        Rule::Group(group) => evaluate_group(held, group).into_iter().collect(),
        Rule::Chain(chain) => evaluate_chain(held, chain),
    }
}

/// Evaluate every rule until no rule requires anything more.
///
/// Roles emitted in one round count as held in the next, so a group role
/// that is also a chain rung pulls in the rungs below it in the same call.
/// The result is ordered by round, then by rule, then by position within the
/// rule. The same role may be emitted by more than one rule of a round;
/// deduplication is left to the caller that dispatches grants.
///
/// Every round adds at least one role the user did not hold and rules
/// reference finitely many roles, so the loop terminates.
pub fn evaluate<'a>(held: &RoleSet, rules: impl IntoIterator<Item = &'a Rule>) -> Vec<Grant> {
    let rules: Vec<&Rule> = rules.into_iter().collect();
    let mut current = held.clone();
    let mut grants = Vec::new();

    loop {
        let round: Vec<Grant> = rules
            .iter()
            .flat_map(|rule| {
                evaluate_rule(&current, rule).into_iter().map(move |role| Grant {
                    role,
                    rule_kind: rule.kind(),
                    rule_name: rule.name().to_string(),
                })
            })
            .collect();
        if round.is_empty() {
            return grants;
        }
        current.extend(round.iter().map(|g| g.role));
        grants.extend(round);
    }
}

// ============================================================================
// Tests
// ============================================================================
