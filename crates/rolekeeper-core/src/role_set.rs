//! Role sets.
//!
//! A [`RoleSet`] is the set of roles one user holds at evaluation time. It is
//! read as an immutable snapshot for the whole of one evaluation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::RoleId;

/// The roles a user currently holds.
///
/// Backed by an ordered set so iteration, serialization and equality are
/// deterministic regardless of the order roles were reported in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<RoleId>);

impl RoleSet {
    /// Create an empty role set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the role is held.
    #[must_use]
    pub fn contains(&self, role: RoleId) -> bool {
        self.0.contains(&role)
    }

    /// Whether any of the given roles is held.
    pub fn contains_any<'a>(&self, roles: impl IntoIterator<Item = &'a RoleId>) -> bool {
        roles.into_iter().any(|r| self.0.contains(r))
    }

    /// Add a role. Returns `false` if it was already held.
    pub fn insert(&mut self, role: RoleId) -> bool {
        self.0.insert(role)
    }

    /// Number of roles held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no roles are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate held roles in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<RoleId> for RoleSet {
    fn from_iter<I: IntoIterator<Item = RoleId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<RoleId> for RoleSet {
    fn extend<I: IntoIterator<Item = RoleId>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = RoleId;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, RoleId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}
