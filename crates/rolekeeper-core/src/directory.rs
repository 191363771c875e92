//! Role directory contract.
//!
//! The directory is the hosting platform's view of a space: which roles
//! exist, who holds them, and the ability to grant them. rolekeeper never
//! implements a real directory, it only consumes this trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use rolekeeper_core::{InMemoryRoleDirectory, RoleDirectory, RoleId, SpaceId, UserId};
//!
//! let space = SpaceId::new(1);
//! let directory = InMemoryRoleDirectory::new();
//! directory.add_role(space, RoleId::new(10), "Member", 1).await;
//! directory.add_member(space, UserId::new(7), []).await;
//!
//! directory
//!     .grant_roles(space, UserId::new(7), &[RoleId::new(10)], "example")
//!     .await?;
//! let held = directory.current_roles(space, UserId::new(7)).await?;
//! assert!(held.contains(RoleId::new(10)));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{RoleId, SpaceId, UserId};
use crate::role_set::RoleSet;

/// A role that currently exists in a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRole {
    /// Role identifier
    pub id: RoleId,
    /// Display name
    pub name: String,
    /// Rank in the space's role hierarchy (higher outranks lower)
    pub position: u32,
}

/// Trait for role directory adapters.
///
/// All calls are asynchronous I/O. Timeouts and rate limiting belong to the
/// adapter; callers treat every error as final for the current pass.
#[async_trait::async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Resolve a role, returning `None` if it has been deleted.
    async fn resolve_role(&self, space_id: SpaceId, role_id: RoleId)
        -> Result<Option<ResolvedRole>>;

    /// The roles the user holds right now.
    async fn current_roles(&self, space_id: SpaceId, user_id: UserId) -> Result<RoleSet>;

    /// Grant every role in `roles` to the user in one call.
    ///
    /// Adapters that cannot batch should return `false` from
    /// [`supports_batch_grants`](Self::supports_batch_grants); callers then
    /// pass exactly one role per call.
    async fn grant_roles(
        &self,
        space_id: SpaceId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> Result<()>;

    /// Whether [`grant_roles`](Self::grant_roles) accepts more than one role.
    fn supports_batch_grants(&self) -> bool {
        true
    }

    /// Whether the acting principal outranks the role and may grant it.
    async fn is_manageable(&self, space_id: SpaceId, role_id: RoleId) -> Result<bool>;

    /// Whether the user is a service (non-human) account.
    async fn is_service_account(&self, space_id: SpaceId, user_id: UserId) -> Result<bool>;

    /// Every user in the space, service accounts included.
    async fn list_users(&self, space_id: SpaceId) -> Result<Vec<UserId>>;
}
