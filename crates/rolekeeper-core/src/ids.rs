//! Strongly Typed Identifiers
//!
//! Spaces, users and roles are all named by 64-bit snowflakes handed out by
//! the hosting platform. Wrapping each in its own newtype keeps a role id from
//! being passed where a user id is expected.
//!
//! # Example
//!
//! ```
//! use rolekeeper_core::{RoleId, UserId};
//!
//! let role = RoleId::new(42);
//! let user: UserId = "1234".parse().unwrap();
//!
//! fn requires_role(id: RoleId) -> u64 {
//!     id.get()
//! }
//!
//! assert_eq!(requires_role(role), 42);
//! // requires_role(user); // This would not compile!
//! # let _ = user;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying integer parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed snowflake ID type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw snowflake.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw snowflake.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier of a space (a community server holding roles, users and rules).
    ///
    /// Every rule store lookup and directory call is scoped by a space, so two
    /// spaces never see each other's rules.
    SpaceId
);

define_id!(
    /// Identifier of a user within a space.
    UserId
);

define_id!(
    /// Identifier of a grantable role within a space.
    ///
    /// The core never needs a role's display name, only its identity.
    /// Names are resolved through the directory when something is rendered.
    RoleId
);
