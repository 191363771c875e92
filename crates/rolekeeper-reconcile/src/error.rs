//! Error types for reconciliation.

use rolekeeper_core::DirectoryError;
use rolekeeper_rules::RuleError;
use thiserror::Error;

/// Failure that stops reconciliation of a user or an audit.
///
/// Rejected grants are not errors at this level; they are recorded in the
/// outcome and the pass carries on.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Loading or validating rules failed.
    #[error("Rule error: {0}")]
    Rules(#[from] RuleError),

    /// A directory read failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

impl ReconcileError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Rules(e) => e.error_code(),
            Self::Directory(e) => e.error_code(),
        }
    }
}

/// Result type for reconciliation.
pub type Result<T> = std::result::Result<T, ReconcileError>;
