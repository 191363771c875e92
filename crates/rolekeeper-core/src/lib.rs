//! rolekeeper Core Library
//!
//! Shared types and the role directory contract for rolekeeper.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed snowflake identifiers (SpaceId, UserId, RoleId)
//! - [`role_set`] - Immutable snapshot of the roles a user holds
//! - [`directory`] - The [`RoleDirectory`] trait consumed by the rule and reconcile crates
//! - [`memory`] - Snapshot-backed in-memory directory
//! - [`error`] - Directory error taxonomy (DirectoryError)
//!
//! # Example
//!
//! ```
//! use rolekeeper_core::{RoleId, RoleSet, UserId};
//!
//! let user = UserId::new(80351110224678912);
//! let held: RoleSet = [RoleId::new(1), RoleId::new(2)].into_iter().collect();
//!
//! assert!(held.contains(RoleId::new(2)));
//! assert_eq!(user.get(), 80351110224678912);
//! ```

pub mod directory;
pub mod error;
pub mod ids;
pub mod memory;
pub mod role_set;

// Re-export main types for convenient access
pub use directory::{ResolvedRole, RoleDirectory};
pub use error::{DirectoryError, Result};
pub use ids::{ParseIdError, RoleId, SpaceId, UserId};
pub use memory::{DirectorySnapshot, InMemoryRoleDirectory, MemberEntry, RoleEntry, SpaceSnapshot};
pub use role_set::RoleSet;
