//! Display views and per-user rule status.
//!
//! Everything here works from a name lookup that was resolved against the
//! directory beforehand. An id missing from the lookup is a deleted role and
//! renders as a placeholder.

use std::collections::HashMap;
use std::fmt;

use rolekeeper_core::{RoleId, RoleSet};
use serde::Serialize;

use crate::evaluator::evaluate_rule;
use crate::types::{Chain, Group, Rule, RuleKind};

/// Resolved role names for a space, keyed by id.
pub type RoleNames = HashMap<RoleId, String>;

/// A role id with its display name, if the role still exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleLabel {
    /// Role identifier
    pub id: RoleId,
    /// Display name, `None` once the role is deleted
    pub name: Option<String>,
}

impl RoleLabel {
    /// Look the role up in `names`.
    #[must_use]
    pub fn resolve(id: RoleId, names: &RoleNames) -> Self {
        Self {
            id,
            name: names.get(&id).cloned(),
        }
    }

    /// Whether the role no longer exists.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.name.is_none()
    }
}

impl fmt::Display for RoleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "<Deleted Role: {}>", self.id),
        }
    }
}

fn join_labels(labels: &[RoleLabel]) -> String {
    labels
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A group with resolved role names.
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    /// Group name
    pub name: String,
    /// The implied role
    pub group_role: RoleLabel,
    /// Member roles in definition order
    pub member_roles: Vec<RoleLabel>,
}

impl GroupView {
    /// Resolve a group's roles.
    #[must_use]
    pub fn new(group: &Group, names: &RoleNames) -> Self {
        Self {
            name: group.name.clone(),
            group_role: RoleLabel::resolve(group.group_role, names),
            member_roles: group
                .member_roles
                .iter()
                .map(|r| RoleLabel::resolve(*r, names))
                .collect(),
        }
    }
}

impl fmt::Display for GroupView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Group Role: {}\nMembers: {}",
            self.group_role,
            join_labels(&self.member_roles)
        )
    }
}

/// A chain with resolved role names.
#[derive(Debug, Clone, Serialize)]
pub struct ChainView {
    /// Chain name
    pub name: String,
    /// Rungs, lowest first
    pub roles: Vec<RoleLabel>,
}

impl ChainView {
    /// Resolve a chain's roles.
    #[must_use]
    pub fn new(chain: &Chain, names: &RoleNames) -> Self {
        Self {
            name: chain.name.clone(),
            roles: chain
                .roles
                .iter()
                .map(|r| RoleLabel::resolve(*r, names))
                .collect(),
        }
    }
}

impl fmt::Display for ChainView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Roles: {}", join_labels(&self.roles))
    }
}

// ============================================================================
// Per-user status
// ============================================================================

/// Whether a user holds one role of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCheck {
    /// The role
    pub role: RoleLabel,
    /// Whether the user holds it
    pub held: bool,
}

impl fmt::Display for RoleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.role.is_deleted() {
            return write!(f, "{}", self.role);
        }
        let mark = if self.held { "✅" } else { "❌" };
        write!(f, "{mark} {}", self.role)
    }
}

/// One user's standing against one rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleStatus {
    /// Rule name
    pub rule_name: String,
    /// Rule kind
    pub kind: RuleKind,
    /// The group role, for groups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_role: Option<RoleCheck>,
    /// Member roles for groups, rungs for chains
    pub roles: Vec<RoleCheck>,
    /// Roles reconciliation would grant
    pub missing: Vec<RoleId>,
    /// False when the rule references a deleted role and is skipped
    pub valid: bool,
    /// Valid and nothing missing
    pub compliant: bool,
}

/// Whether every role the rule references resolved.
#[must_use]
pub fn is_valid(rule: &Rule, names: &RoleNames) -> bool {
    rule.referenced_roles()
        .iter()
        .all(|r| names.contains_key(r))
}

/// Check one rule against a user's held roles.
///
/// A rule that references a deleted role reports nothing missing, because
/// reconciliation skips it entirely, and is never compliant.
#[must_use]
pub fn rule_status(held: &RoleSet, rule: &Rule, names: &RoleNames) -> RuleStatus {
    let check = |id: RoleId| RoleCheck {
        role: RoleLabel::resolve(id, names),
        held: held.contains(id),
    };

    let (group_role, roles) = match rule {
        Rule::Group(g) => (
            Some(check(g.group_role)),
            g.member_roles.iter().map(|r| check(*r)).collect::<Vec<_>>(),
        ),
        Rule::Chain(c) => (None, c.roles.iter().map(|r| check(*r)).collect()),
    };

    let valid = is_valid(rule, names);
    let missing = if valid {
        evaluate_rule(held, rule)
    } else {
        Vec::new()
    };

    RuleStatus {
        rule_name: rule.name().to_string(),
        kind: rule.kind(),
        group_role,
        roles,
        compliant: valid && missing.is_empty(),
        missing,
        valid,
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(group_role) = &self.group_role {
            writeln!(f, "Group Role: {group_role}")?;
        }
        for role in &self.roles {
            writeln!(f, "{role}")?;
        }
        if !self.valid {
            write!(f, "Skipped: references a deleted role")
        } else if self.compliant {
            write!(f, "Compliant")
        } else {
            write!(f, "Missing {} role(s)", self.missing.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNIGHT: RoleId = RoleId::new(1);
    const SQUIRE: RoleId = RoleId::new(2);
    const PAGE: RoleId = RoleId::new(3);

    fn names() -> RoleNames {
        HashMap::from([
            (KNIGHT, "Knight".to_string()),
            (SQUIRE, "Squire".to_string()),
            (PAGE, "Page".to_string()),
        ])
    }

    fn group() -> Group {
        Group {
            name: "Knights".to_string(),
            group_role: KNIGHT,
            member_roles: vec![PAGE, SQUIRE],
        }
    }

    #[test]
    fn test_deleted_role_placeholder() {
        let label = RoleLabel::resolve(RoleId::new(77), &names());
        assert!(label.is_deleted());
        assert_eq!(label.to_string(), "<Deleted Role: 77>");
    }

    #[test]
    fn test_group_view_text() {
        let view = GroupView::new(&group(), &names());
        assert_eq!(
            view.to_string(),
            "Group Role: Knight\nMembers: Page -> Squire"
        );
    }

    #[test]
    fn test_chain_view_with_deleted_rung() {
        let chain = Chain {
            name: "ladder".to_string(),
            roles: vec![PAGE, RoleId::new(9), KNIGHT],
        };
        let view = ChainView::new(&chain, &names());
        assert_eq!(
            view.to_string(),
            "Roles: Page -> <Deleted Role: 9> -> Knight"
        );
    }

    #[test]
    fn test_status_reports_missing_group_role() {
        let held: RoleSet = [SQUIRE].into_iter().collect();
        let status = rule_status(&held, &Rule::from(group()), &names());

        assert!(status.valid);
        assert!(!status.compliant);
        assert_eq!(status.missing, vec![KNIGHT]);
        assert_eq!(status.group_role.as_ref().map(|c| c.held), Some(false));
        assert_eq!(
            status.to_string(),
            "Group Role: ❌ Knight\n❌ Page\n✅ Squire\nMissing 1 role(s)"
        );
    }

    #[test]
    fn test_status_compliant() {
        let held: RoleSet = [SQUIRE, KNIGHT].into_iter().collect();
        let status = rule_status(&held, &Rule::from(group()), &names());
        assert!(status.compliant);
        assert!(status.missing.is_empty());
    }

    #[test]
    fn test_status_with_deleted_role_is_skipped() {
        let chain = Chain {
            name: "ladder".to_string(),
            roles: vec![PAGE, RoleId::new(9), KNIGHT],
        };
        let held: RoleSet = [KNIGHT].into_iter().collect();
        let status = rule_status(&held, &Rule::from(chain), &names());

        assert!(!status.valid);
        assert!(!status.compliant);
        assert!(status.missing.is_empty());
        assert!(status.to_string().contains("<Deleted Role: 9>"));
    }
}
