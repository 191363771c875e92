//! Error types for rule management.

use rolekeeper_core::{DirectoryError, RoleId};
use thiserror::Error;

use crate::types::RuleKind;

/// A rule definition rejected at creation time.
///
/// Nothing is persisted when one of these is returned. The message is meant
/// to be shown to the administrator as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Rule name is blank.
    #[error("Rule name must not be empty.")]
    EmptyName,

    /// A group was given no member roles.
    #[error("You must specify at least one member role (after the group role).")]
    EmptyMemberList,

    /// A chain was given fewer than two roles.
    #[error("A chain needs at least 2 roles, got {len}.")]
    ChainTooShort {
        /// Number of roles supplied
        len: usize,
    },

    /// The same role appears twice in one definition.
    #[error("Role {role} appears more than once in {kind} '{name}'.")]
    DuplicateRole {
        /// Rule kind
        kind: RuleKind,
        /// Rule name
        name: String,
        /// Repeated role
        role: RoleId,
    },

    /// The role is already a member of the group.
    #[error("Role '{role_name}' is already in group '{group}'.")]
    DuplicateMember {
        /// Group name
        group: String,
        /// Display name of the role
        role_name: String,
    },

    /// Referenced roles do not exist in the space.
    #[error("These roles do not exist: {}", join_ids(.roles))]
    UnknownRoles {
        /// Missing role ids
        roles: Vec<RoleId>,
    },

    /// Referenced roles are at or above the acting principal's rank.
    #[error("I cannot manage these roles (they are above my highest role): {}", .names.join(", "))]
    UnmanageableRoles {
        /// Display names of the offending roles
        names: Vec<String>,
    },
}

fn join_ids(roles: &[RoleId]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by the rule store and rule service.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Definition rejected.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// No rule with this name.
    #[error("{kind} '{name}' not found.")]
    NotFound {
        /// Rule kind
        kind: RuleKind,
        /// Rule name
        name: String,
    },

    /// Directory call failed while validating or resolving.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Persistence backend failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl RuleError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Definition(_) => "definition_error",
            Self::NotFound { .. } => "not_found",
            Self::Directory(e) => e.error_code(),
            Self::Storage(_) => "storage_error",
        }
    }
}

impl From<std::io::Error> for RuleError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Result type for rule operations.
pub type Result<T, E = RuleError> = std::result::Result<T, E>;
