//! Reconciliation for rolekeeper.
//!
//! Computes the roles a user is missing under the valid rules of their
//! space and grants them through the [`RoleDirectory`](rolekeeper_core::RoleDirectory).
//! Two drivers share one primitive:
//!
//! - [`Reconciler::reconcile_user`], invoked per role-change event
//!   (see [`events`])
//! - [`Reconciler::reconcile_all_with_progress`], the space-wide audit
//!
//! Concurrent passes over the same user are not serialized. Each works from
//! its own snapshot of the user's roles; a redundant grant of a role that is
//! already held changes nothing.

pub mod config;
pub mod error;
pub mod events;
pub mod reconciler;
pub mod report;

pub use config::{ConfigError, ReconcilerConfig};
pub use error::{ReconcileError, Result};
pub use events::{run_event_loop, RoleSetChanged};
pub use reconciler::Reconciler;
pub use report::{AuditOutcome, AuditProgress, AuditReport, FailedGrant, UserOutcome};
