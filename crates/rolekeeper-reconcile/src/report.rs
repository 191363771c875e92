//! Reconciliation outcomes and audit reports.

use std::fmt;

use chrono::{DateTime, Utc};
use rolekeeper_core::{RoleId, SpaceId, UserId};
use serde::{Deserialize, Serialize};

// ============================================================================
// Single user
// ============================================================================

/// A grant the directory rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedGrant {
    /// Role that was not granted.
    pub role: RoleId,
    /// Machine-readable error code.
    pub error_code: String,
    /// Error message.
    pub message: String,
}

/// Result of reconciling one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOutcome {
    /// The user.
    pub user_id: UserId,
    /// Roles the directory accepted.
    pub granted: Vec<RoleId>,
    /// Roles the directory rejected.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failed: Vec<FailedGrant>,
    /// Roles that would have been granted in dry-run mode.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub planned: Vec<RoleId>,
    /// Service account, never evaluated.
    #[serde(default)]
    pub skipped: bool,
}

impl UserOutcome {
    /// Outcome for a user with nothing to grant.
    #[must_use]
    pub fn unchanged(user_id: UserId) -> Self {
        Self {
            user_id,
            granted: Vec::new(),
            failed: Vec::new(),
            planned: Vec::new(),
            skipped: false,
        }
    }

    /// Outcome for a user that was not evaluated.
    #[must_use]
    pub fn skipped(user_id: UserId) -> Self {
        Self {
            skipped: true,
            ..Self::unchanged(user_id)
        }
    }

    /// Number of roles actually granted.
    #[must_use]
    pub fn fixed(&self) -> usize {
        self.granted.len()
    }
}

// ============================================================================
// Audit
// ============================================================================

/// How an audit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Every user was visited.
    Completed,
    /// The caller stopped listening before the last user.
    Cancelled,
    /// Every stored rule references a deleted role; nothing was evaluated.
    NoValidRules,
}

/// Aggregate result of a space-wide audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// The audited space.
    pub space_id: SpaceId,
    /// How the audit ended.
    pub outcome: AuditOutcome,
    /// When the audit started.
    pub started_at: DateTime<Utc>,
    /// When the audit ended.
    pub completed_at: DateTime<Utc>,
    /// Users in the space when the audit started.
    pub total_users: usize,
    /// Users visited, service accounts and failures included.
    pub processed: usize,
    /// Roles granted across all users.
    pub fixed: usize,
    /// Users whose reconciliation failed outright.
    pub errors: usize,
    /// Individual grants the directory rejected.
    pub failed_grants: usize,
    /// Service accounts skipped.
    pub skipped_service_accounts: usize,
    /// Roles that would have been granted in dry-run mode.
    pub planned: usize,
    /// Rules that passed the validity filter.
    pub valid_rules: usize,
    /// Whether grants were only planned.
    pub dry_run: bool,
}

impl AuditReport {
    /// Start an empty report.
    #[must_use]
    pub fn new(space_id: SpaceId, total_users: usize, valid_rules: usize, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            space_id,
            outcome: AuditOutcome::Completed,
            started_at: now,
            completed_at: now,
            total_users,
            processed: 0,
            fixed: 0,
            errors: 0,
            failed_grants: 0,
            skipped_service_accounts: 0,
            planned: 0,
            valid_rules,
            dry_run,
        }
    }

    /// Fold one user's outcome into the totals.
    pub fn record(&mut self, outcome: &UserOutcome) {
        self.processed += 1;
        if outcome.skipped {
            self.skipped_service_accounts += 1;
        }
        self.fixed += outcome.fixed();
        self.failed_grants += outcome.failed.len();
        self.planned += outcome.planned.len();
    }

    /// Count a user whose reconciliation failed.
    pub fn record_error(&mut self) {
        self.processed += 1;
        self.errors += 1;
    }

    /// Every failure, per-user and per-grant.
    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.errors + self.failed_grants
    }

    /// Mark the report finished.
    pub fn finish(&mut self, outcome: AuditOutcome) {
        self.outcome = outcome;
        self.completed_at = Utc::now();
    }

    /// Progress snapshot at this point of the audit.
    #[must_use]
    pub fn progress(&self) -> AuditProgress {
        AuditProgress::Checkpoint {
            processed: self.processed,
            total: self.total_users,
            fixed: self.fixed,
            errors: self.total_errors(),
        }
    }

    /// Wall-clock duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            AuditOutcome::NoValidRules => {
                return write!(f, "No valid rules found (all contain deleted roles).");
            }
            AuditOutcome::Cancelled => write!(
                f,
                "Audit cancelled after {}/{} members. Fixed {} missing roles.",
                self.processed, self.total_users, self.fixed
            )?,
            AuditOutcome::Completed if self.dry_run => write!(
                f,
                "Dry run complete! Processed {} members; {} missing roles would be granted.",
                self.processed, self.planned
            )?,
            AuditOutcome::Completed => write!(
                f,
                "Audit complete! Processed {} members and fixed {} missing roles.",
                self.processed, self.fixed
            )?,
        }
        let errors = self.total_errors();
        if errors > 0 {
            write!(f, " Encountered {errors} errors (check logs for details).")?;
        }
        Ok(())
    }
}

/// Message streamed to the caller of a running audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditProgress {
    /// Sent once before the first user.
    Started {
        /// Users to visit.
        total: usize,
    },
    /// Sent every `progress_interval` processed users.
    Checkpoint {
        /// Users visited so far.
        processed: usize,
        /// Users to visit.
        total: usize,
        /// Roles granted so far.
        fixed: usize,
        /// Failures so far.
        errors: usize,
    },
    /// Sent once with the final report.
    Finished(AuditReport),
}

impl fmt::Display for AuditProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { total } => write!(f, "Starting audit of {total} members..."),
            Self::Checkpoint {
                processed,
                total,
                fixed,
                errors,
            } => {
                write!(f, "Processed {processed}/{total} members. Fixed {fixed} roles")?;
                if *errors > 0 {
                    write!(f, ", {errors} errors")?;
                }
                write!(f, "...")
            }
            Self::Finished(report) => write!(f, "{report}"),
        }
    }
}
