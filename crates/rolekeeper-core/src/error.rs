//! Error Types
//!
//! Failures reported by a [`RoleDirectory`](crate::RoleDirectory) adapter.
//!
//! # Example
//!
//! ```
//! use rolekeeper_core::{DirectoryError, Result};
//!
//! fn grant() -> Result<()> {
//!     Err(DirectoryError::PermissionDenied { message: None })
//! }
//!
//! assert!(grant().unwrap_err().is_permission_denied());
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::ids::{SpaceId, UserId};

/// Error type for role directory calls.
///
/// Reconciliation never retries on any of these. A failed grant is logged
/// and counted, and the next audit or role-change event derives the same
/// missing roles again.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectoryError {
    /// The acting principal lacks the authority to perform the change.
    #[error("Permission denied{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    PermissionDenied {
        /// Optional message from the directory
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// The call failed in transit, was rate limited, or the directory
    /// rejected it for a reason other than authority.
    #[error("Directory transport error: {message}")]
    Transport {
        /// Description of the failure
        message: String,
    },

    /// The user is not a member of the space.
    #[error("User {user_id} not found in space {space_id}")]
    UnknownUser {
        /// Space that was searched
        space_id: SpaceId,
        /// User that was not found
        user_id: UserId,
    },

    /// The space is not known to the directory.
    #[error("Space not found: {space_id}")]
    UnknownSpace {
        /// Space that was not found
        space_id: SpaceId,
    },
}

impl DirectoryError {
    /// Shorthand for a transport failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Whether the directory refused the change for lack of authority.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Transport { .. } => "transport_error",
            Self::UnknownUser { .. } => "unknown_user",
            Self::UnknownSpace { .. } => "unknown_space",
        }
    }
}

/// Type alias for Results using `DirectoryError`.
pub type Result<T> = std::result::Result<T, DirectoryError>;
