//! Definition checks.
//!
//! Shape checks are pure and run first. The directory check runs second and
//! needs the live directory: every role must exist and be below the acting
//! principal's rank. Manageability is only checked here, at creation time;
//! a role that later becomes unmanageable leaves its rules in place.

use std::collections::HashSet;

use rolekeeper_core::{RoleDirectory, RoleId, SpaceId};

use crate::error::{DefinitionError, Result};
use crate::types::RuleKind;

/// Check a group definition's shape.
pub fn check_group_shape(name: &str, member_roles: &[RoleId]) -> Result<(), DefinitionError> {
    check_name(name)?;
    if member_roles.is_empty() {
        return Err(DefinitionError::EmptyMemberList);
    }
    check_unique(RuleKind::Group, name, member_roles)
}

/// Check a chain definition's shape.
pub fn check_chain_shape(name: &str, roles: &[RoleId]) -> Result<(), DefinitionError> {
    check_name(name)?;
    if roles.len() < 2 {
        return Err(DefinitionError::ChainTooShort { len: roles.len() });
    }
    check_unique(RuleKind::Chain, name, roles)
}

fn check_name(name: &str) -> Result<(), DefinitionError> {
    if name.trim().is_empty() {
        return Err(DefinitionError::EmptyName);
    }
    Ok(())
}

fn check_unique(kind: RuleKind, name: &str, roles: &[RoleId]) -> Result<(), DefinitionError> {
    let mut seen = HashSet::with_capacity(roles.len());
    match roles.iter().find(|r| !seen.insert(**r)) {
        Some(&role) => Err(DefinitionError::DuplicateRole {
            kind,
            name: name.to_string(),
            role,
        }),
        None => Ok(()),
    }
}

/// Check that every role exists and may be granted by the acting principal.
///
/// Unknown roles are reported before unmanageable ones, since an unknown
/// role has no name to show.
pub async fn check_manageable(
    directory: &dyn RoleDirectory,
    space_id: SpaceId,
    roles: &[RoleId],
) -> Result<()> {
    let mut unknown = Vec::new();
    let mut unmanageable = Vec::new();

    for &role_id in roles {
        match directory.resolve_role(space_id, role_id).await? {
            None => unknown.push(role_id),
            Some(role) => {
                if !directory.is_manageable(space_id, role_id).await? {
                    unmanageable.push(role.name);
                }
            }
        }
    }

    if !unknown.is_empty() {
        return Err(DefinitionError::UnknownRoles { roles: unknown }.into());
    }
    if !unmanageable.is_empty() {
        return Err(DefinitionError::UnmanageableRoles {
            names: unmanageable,
        }
        .into());
    }
    Ok(())
}
