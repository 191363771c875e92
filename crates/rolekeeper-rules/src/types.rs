//! Type definitions for the rule domain.
//!
//! Two rule kinds exist. A [`Group`] says that holding any member role implies
//! holding the group role. A [`Chain`] says that holding a role at some rung
//! implies holding every rung below it. Both are carried through evaluation
//! as the tagged [`Rule`] variant.

use std::collections::BTreeMap;
use std::fmt;

use rolekeeper_core::RoleId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Rules
// ============================================================================

/// Holding any of `member_roles` implies holding `group_role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Name, unique among the space's groups.
    pub name: String,
    /// The implied role.
    pub group_role: RoleId,
    /// Roles that imply the group role. Order is kept for display only.
    pub member_roles: Vec<RoleId>,
}

impl Group {
    /// Every role this group references, group role first.
    pub fn referenced_roles(&self) -> impl Iterator<Item = RoleId> + '_ {
        std::iter::once(self.group_role).chain(self.member_roles.iter().copied())
    }
}

/// Ordered hierarchy, lowest rung first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    /// Name, unique among the space's chains.
    pub name: String,
    /// Rungs from lowest to highest. The order is the hierarchy.
    pub roles: Vec<RoleId>,
}

/// Rule kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// A [`Group`] rule.
    Group,
    /// A [`Chain`] rule.
    Chain,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => write!(f, "group"),
            Self::Chain => write!(f, "chain"),
        }
    }
}

/// Either rule kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Rule {
    /// Any-of implies one.
    Group(Group),
    /// Higher rung implies lower rungs.
    Chain(Chain),
}

impl Rule {
    /// Rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Group(g) => &g.name,
            Self::Chain(c) => &c.name,
        }
    }

    /// Rule kind.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Group(_) => RuleKind::Group,
            Self::Chain(_) => RuleKind::Chain,
        }
    }

    /// Every role the rule references, in definition order.
    #[must_use]
    pub fn referenced_roles(&self) -> Vec<RoleId> {
        match self {
            Self::Group(g) => g.referenced_roles().collect(),
            Self::Chain(c) => c.roles.clone(),
        }
    }
}

impl From<Group> for Rule {
    fn from(group: Group) -> Self {
        Self::Group(group)
    }
}

impl From<Chain> for Rule {
    fn from(chain: Chain) -> Self {
        Self::Chain(chain)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind(), self.name())
    }
}

// ============================================================================
// Persisted layout
// ============================================================================

/// All rules of one space.
///
/// Groups and chains live in independent namespaces, so a group and a chain
/// may share a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRules {
    /// Group name to group.
    #[serde(default)]
    pub groups: BTreeMap<String, Group>,
    /// Chain name to chain.
    #[serde(default)]
    pub chains: BTreeMap<String, Chain>,
}

impl SpaceRules {
    /// Whether the space has no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.chains.is_empty()
    }

    /// Groups then chains, each in name order.
    #[must_use]
    pub fn rules(&self) -> Vec<Rule> {
        self.groups
            .values()
            .cloned()
            .map(Rule::Group)
            .chain(self.chains.values().cloned().map(Rule::Chain))
            .collect()
    }
}
