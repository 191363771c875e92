//! Role-change event bridge.
//!
//! The hosting platform reports every change to a user's roles. Each
//! notification triggers its own reconciliation of that user; rapid
//! successive changes are not coalesced.

use rolekeeper_core::{RoleSet, SpaceId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::Result;
use crate::reconciler::Reconciler;
use crate::report::UserOutcome;

/// A user's roles changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSetChanged {
    /// Space the user belongs to.
    pub space_id: SpaceId,
    /// The user.
    pub user_id: UserId,
    /// Roles before the change.
    pub before: RoleSet,
    /// Roles after the change.
    pub after: RoleSet,
}

impl Reconciler {
    /// Handle a role-change notification.
    ///
    /// Returns `None` when the event is ignored: the role set did not
    /// actually change, or the user is a service account.
    pub async fn on_role_set_changed(
        &self,
        event: &RoleSetChanged,
    ) -> Result<Option<UserOutcome>> {
        if event.before == event.after {
            return Ok(None);
        }

        let outcome = self.reconcile_user(event.space_id, event.user_id).await?;
        if outcome.skipped {
            return Ok(None);
        }
        Ok(Some(outcome))
    }
}

/// Reconcile users as their role-change events arrive.
///
/// Events are handled one at a time in arrival order. A failure is logged
/// and the loop moves on to the next event. Returns once every sender is
/// dropped, with the number of roles granted.
pub async fn run_event_loop(
    reconciler: Reconciler,
    mut events: mpsc::Receiver<RoleSetChanged>,
) -> usize {
    let mut fixed = 0;

    while let Some(event) = events.recv().await {
        match reconciler.on_role_set_changed(&event).await {
            Ok(Some(outcome)) => {
                debug!(
                    space_id = %event.space_id,
                    user_id = %event.user_id,
                    granted = outcome.fixed(),
                    "Role change reconciled"
                );
                fixed += outcome.fixed();
            }
            Ok(None) => {}
            Err(e) => {
                error!(
                    space_id = %event.space_id,
                    user_id = %event.user_id,
                    error = %e,
                    "Failed to reconcile role change"
                );
            }
        }
    }

    debug!(fixed, "Role change stream closed");
    fixed
}
