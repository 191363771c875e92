//! Snapshot-backed role directory.
//!
//! [`InMemoryRoleDirectory`] holds a [`DirectorySnapshot`] behind an async
//! lock. Tests use it as the directory double and the CLI loads one from a
//! JSON file. It enforces the same hierarchy rule a live platform does: a
//! role can only be granted when its position is below the acting
//! principal's position.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::directory::{ResolvedRole, RoleDirectory};
use crate::error::{DirectoryError, Result};
use crate::ids::{RoleId, SpaceId, UserId};
use crate::role_set::RoleSet;

/// Serializable state of every space known to the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    /// Spaces by id.
    #[serde(default)]
    pub spaces: BTreeMap<SpaceId, SpaceSnapshot>,
}

/// One space: its roles, members, and the acting principal's rank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSnapshot {
    /// Position of the acting principal's highest role.
    #[serde(default)]
    pub acting_position: u32,
    /// Roles that exist in the space.
    #[serde(default)]
    pub roles: BTreeMap<RoleId, RoleEntry>,
    /// Members of the space.
    #[serde(default)]
    pub members: BTreeMap<UserId, MemberEntry>,
}

/// A role as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    /// Display name.
    pub name: String,
    /// Rank in the hierarchy.
    pub position: u32,
}

/// A member as stored in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEntry {
    /// Optional display name, used only for output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Roles held.
    #[serde(default)]
    pub roles: RoleSet,
    /// Service (non-human) account flag.
    #[serde(default)]
    pub service_account: bool,
}

impl SpaceSnapshot {
    fn member(&self, space_id: SpaceId, user_id: UserId) -> Result<&MemberEntry> {
        self.members
            .get(&user_id)
            .ok_or(DirectoryError::UnknownUser { space_id, user_id })
    }

    fn can_manage(&self, role_id: RoleId) -> bool {
        self.roles
            .get(&role_id)
            .is_some_and(|r| r.position < self.acting_position)
    }
}

/// In-memory role directory for testing and offline snapshots.
#[derive(Debug, Default)]
pub struct InMemoryRoleDirectory {
    state: Arc<RwLock<DirectorySnapshot>>,
    grant_calls: AtomicUsize,
}

impl InMemoryRoleDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(snapshot)),
            grant_calls: AtomicUsize::new(0),
        }
    }

    /// Clone the current state.
    pub async fn snapshot(&self) -> DirectorySnapshot {
        self.state.read().await.clone()
    }

    /// Set the acting principal's position in a space.
    pub async fn set_acting_position(&self, space_id: SpaceId, position: u32) {
        let mut state = self.state.write().await;
        state.spaces.entry(space_id).or_default().acting_position = position;
    }

    /// Create or rename a role.
    pub async fn add_role(
        &self,
        space_id: SpaceId,
        role_id: RoleId,
        name: impl Into<String>,
        position: u32,
    ) {
        let mut state = self.state.write().await;
        state.spaces.entry(space_id).or_default().roles.insert(
            role_id,
            RoleEntry {
                name: name.into(),
                position,
            },
        );
    }

    /// Delete a role from the space and from every member holding it.
    pub async fn remove_role(&self, space_id: SpaceId, role_id: RoleId) -> bool {
        let mut state = self.state.write().await;
        let Some(space) = state.spaces.get_mut(&space_id) else {
            return false;
        };
        let removed = space.roles.remove(&role_id).is_some();
        if removed {
            for member in space.members.values_mut() {
                member.roles = member.roles.iter().filter(|r| *r != role_id).collect();
            }
        }
        removed
    }

    /// Add a human member holding the given roles.
    pub async fn add_member(
        &self,
        space_id: SpaceId,
        user_id: UserId,
        roles: impl IntoIterator<Item = RoleId>,
    ) {
        let mut state = self.state.write().await;
        state.spaces.entry(space_id).or_default().members.insert(
            user_id,
            MemberEntry {
                name: None,
                roles: roles.into_iter().collect(),
                service_account: false,
            },
        );
    }

    /// Add a service account holding the given roles.
    pub async fn add_service_account(
        &self,
        space_id: SpaceId,
        user_id: UserId,
        roles: impl IntoIterator<Item = RoleId>,
    ) {
        let mut state = self.state.write().await;
        state.spaces.entry(space_id).or_default().members.insert(
            user_id,
            MemberEntry {
                name: None,
                roles: roles.into_iter().collect(),
                service_account: true,
            },
        );
    }

    /// Number of `grant_roles` calls that reached the directory.
    pub fn grant_calls(&self) -> usize {
        self.grant_calls.load(Ordering::SeqCst)
    }
}

fn space(state: &DirectorySnapshot, space_id: SpaceId) -> Result<&SpaceSnapshot> {
    state
        .spaces
        .get(&space_id)
        .ok_or(DirectoryError::UnknownSpace { space_id })
}

#[async_trait::async_trait]
impl RoleDirectory for InMemoryRoleDirectory {
    async fn resolve_role(
        &self,
        space_id: SpaceId,
        role_id: RoleId,
    ) -> Result<Option<ResolvedRole>> {
        let state = self.state.read().await;
        Ok(space(&state, space_id)?
            .roles
            .get(&role_id)
            .map(|r| ResolvedRole {
                id: role_id,
                name: r.name.clone(),
                position: r.position,
            }))
    }

    async fn current_roles(&self, space_id: SpaceId, user_id: UserId) -> Result<RoleSet> {
        let state = self.state.read().await;
        Ok(space(&state, space_id)?
            .member(space_id, user_id)?
            .roles
            .clone())
    }

    async fn grant_roles(
        &self,
        space_id: SpaceId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> Result<()> {
        self.grant_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        let space = state
            .spaces
            .get_mut(&space_id)
            .ok_or(DirectoryError::UnknownSpace { space_id })?;

        // Validate the whole batch before touching the member.
        for &role_id in roles {
            if !space.roles.contains_key(&role_id) {
                return Err(DirectoryError::transport(format!("Unknown Role {role_id}")));
            }
            if !space.can_manage(role_id) {
                return Err(DirectoryError::PermissionDenied {
                    message: Some(format!("role {role_id} is not below the acting role")),
                });
            }
        }

        let member = space
            .members
            .get_mut(&user_id)
            .ok_or(DirectoryError::UnknownUser { space_id, user_id })?;
        member.roles.extend(roles.iter().copied());

        tracing::debug!(
            space_id = %space_id,
            user_id = %user_id,
            count = roles.len(),
            reason,
            "Snapshot directory granted roles"
        );
        Ok(())
    }

    async fn is_manageable(&self, space_id: SpaceId, role_id: RoleId) -> Result<bool> {
        let state = self.state.read().await;
        Ok(space(&state, space_id)?.can_manage(role_id))
    }

    async fn is_service_account(&self, space_id: SpaceId, user_id: UserId) -> Result<bool> {
        let state = self.state.read().await;
        Ok(space(&state, space_id)?
            .member(space_id, user_id)?
            .service_account)
    }

    async fn list_users(&self, space_id: SpaceId) -> Result<Vec<UserId>> {
        let state = self.state.read().await;
        Ok(space(&state, space_id)?.members.keys().copied().collect())
    }
}
