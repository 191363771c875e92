//! Reconciler.
//!
//! One primitive computes and applies the missing roles of a single user.
//! Both entry points share it: [`Reconciler::reconcile_user`] for role-change
//! events and [`Reconciler::reconcile_all_with_progress`] for space-wide
//! audits.
//!
//! Roles are only ever granted. Directory failures are recorded per grant and
//! never abort the rest of the user's grants or the rest of the audit.

use std::sync::Arc;

use rolekeeper_core::{DirectoryError, RoleDirectory, RoleId, SpaceId, UserId};
use rolekeeper_rules::{evaluate, rule_status, Grant, Rule, RuleService, RuleStatus, RuleStore};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::ReconcilerConfig;
use crate::error::Result;
use crate::report::{AuditOutcome, AuditProgress, AuditReport, FailedGrant, UserOutcome};

/// A role to grant and the rules that require it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingGrant {
    role: RoleId,
    sources: Vec<String>,
}

/// Collapse evaluator output to one entry per role, first occurrence first.
fn dedupe(grants: Vec<Grant>) -> Vec<PendingGrant> {
    let mut pending: Vec<PendingGrant> = Vec::with_capacity(grants.len());
    for grant in grants {
        let source = format!("{} '{}'", grant.rule_kind, grant.rule_name);
        match pending.iter_mut().find(|p| p.role == grant.role) {
            Some(existing) => {
                if !existing.sources.contains(&source) {
                    existing.sources.push(source);
                }
            }
            None => pending.push(PendingGrant {
                role: grant.role,
                sources: vec![source],
            }),
        }
    }
    pending
}

fn grant_reason<'a>(prefix: &str, sources: impl IntoIterator<Item = &'a String>) -> String {
    let mut named: Vec<&str> = Vec::new();
    for source in sources {
        if !named.contains(&source.as_str()) {
            named.push(source);
        }
    }
    format!("{prefix}: Adding missing role from {}", named.join(", "))
}

fn failed(roles: &[RoleId], error: &DirectoryError) -> Vec<FailedGrant> {
    roles
        .iter()
        .map(|role| FailedGrant {
            role: *role,
            error_code: error.error_code().to_string(),
            message: error.to_string(),
        })
        .collect()
}

/// Reconciles users against the valid rules of their space.
#[derive(Clone)]
pub struct Reconciler {
    rules: RuleService,
    directory: Arc<dyn RoleDirectory>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a reconciler with the default configuration.
    pub fn new(store: Arc<dyn RuleStore>, directory: Arc<dyn RoleDirectory>) -> Self {
        Self::with_config(store, directory, ReconcilerConfig::default())
    }

    /// Create a reconciler with an explicit configuration.
    ///
    /// A zero `progress_interval` is raised to 1.
    pub fn with_config(
        store: Arc<dyn RuleStore>,
        directory: Arc<dyn RoleDirectory>,
        mut config: ReconcilerConfig,
    ) -> Self {
        if config.progress_interval == 0 {
            warn!("progress_interval of 0 raised to 1");
            config.progress_interval = 1;
        }
        Self {
            rules: RuleService::new(store, directory.clone()),
            directory,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// The rule service sharing this reconciler's store and directory.
    #[must_use]
    pub fn rules(&self) -> &RuleService {
        &self.rules
    }

    /// Reconcile one user.
    ///
    /// Service accounts are skipped. When no rule of the space is valid the
    /// user's roles are not even fetched.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_user(&self, space_id: SpaceId, user_id: UserId) -> Result<UserOutcome> {
        if self.directory.is_service_account(space_id, user_id).await? {
            debug!("Skipping service account");
            return Ok(UserOutcome::skipped(user_id));
        }

        let rules = self.rules.valid_rules(space_id).await?;
        if rules.is_empty() {
            return Ok(UserOutcome::unchanged(user_id));
        }

        self.reconcile_member(space_id, user_id, &rules).await
    }

    /// Audit every user of a space.
    pub async fn reconcile_all(&self, space_id: SpaceId) -> Result<AuditReport> {
        self.reconcile_all_with_progress(space_id, None).await
    }

    /// Audit every user of a space, streaming progress to `progress`.
    ///
    /// A failure for one user is logged and counted and the audit moves on.
    /// Dropping the receiving end cancels the audit once the user in flight
    /// is done.
    ///
    /// Only failing to load the rules or the user list fails the whole call.
    pub async fn reconcile_all_with_progress(
        &self,
        space_id: SpaceId,
        progress: Option<&mpsc::Sender<AuditProgress>>,
    ) -> Result<AuditReport> {
        let rules = self.rules.valid_rules(space_id).await?;
        let users = self.directory.list_users(space_id).await?;

        let mut report =
            AuditReport::new(space_id, users.len(), rules.len(), self.config.dry_run);

        if rules.is_empty() {
            warn!(space_id = %space_id, "Audit skipped, no valid rules");
            report.finish(AuditOutcome::NoValidRules);
            notify(progress, AuditProgress::Finished(report.clone())).await;
            return Ok(report);
        }

        info!(
            space_id = %space_id,
            total_users = users.len(),
            valid_rules = rules.len(),
            dry_run = self.config.dry_run,
            "Starting audit"
        );
        notify(progress, AuditProgress::Started { total: users.len() }).await;

        for user_id in users {
            if progress.is_some_and(mpsc::Sender::is_closed) {
                warn!(
                    space_id = %space_id,
                    processed = report.processed,
                    total_users = report.total_users,
                    "Audit cancelled"
                );
                report.finish(AuditOutcome::Cancelled);
                return Ok(report);
            }

            match self.audit_member(space_id, user_id, &rules).await {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    error!(
                        space_id = %space_id,
                        user_id = %user_id,
                        error = %e,
                        "Failed to reconcile user"
                    );
                    report.record_error();
                }
            }

            if report.processed % self.config.progress_interval == 0 {
                debug!(
                    space_id = %space_id,
                    processed = report.processed,
                    total_users = report.total_users,
                    fixed = report.fixed,
                    "Audit progress"
                );
                notify(progress, report.progress()).await;
            }
        }

        report.finish(AuditOutcome::Completed);
        info!(
            space_id = %space_id,
            processed = report.processed,
            fixed = report.fixed,
            errors = report.errors,
            failed_grants = report.failed_grants,
            duration_ms = report.duration_ms(),
            "Audit complete"
        );
        notify(progress, AuditProgress::Finished(report.clone())).await;

        Ok(report)
    }

    /// Every rule of the space checked against the user's current roles.
    ///
    /// Rules that reference deleted roles are included and marked invalid.
    pub async fn check_user(&self, space_id: SpaceId, user_id: UserId) -> Result<Vec<RuleStatus>> {
        let rules = self.rules.list_rules(space_id).await?;
        let names = self.rules.resolve_names(space_id, &rules).await?;
        let held = self.directory.current_roles(space_id, user_id).await?;

        Ok(rules
            .iter()
            .map(|rule| rule_status(&held, rule, &names))
            .collect())
    }

    async fn audit_member(
        &self,
        space_id: SpaceId,
        user_id: UserId,
        rules: &[Rule],
    ) -> Result<UserOutcome> {
        if self.directory.is_service_account(space_id, user_id).await? {
            return Ok(UserOutcome::skipped(user_id));
        }
        self.reconcile_member(space_id, user_id, rules).await
    }

    /// Evaluate one user against pre-filtered rules and apply the result.
    async fn reconcile_member(
        &self,
        space_id: SpaceId,
        user_id: UserId,
        rules: &[Rule],
    ) -> Result<UserOutcome> {
        let held = self.directory.current_roles(space_id, user_id).await?;
        let pending = dedupe(evaluate(&held, rules));

        let mut outcome = UserOutcome::unchanged(user_id);
        if pending.is_empty() {
            return Ok(outcome);
        }

        if self.config.dry_run {
            outcome.planned = pending.iter().map(|p| p.role).collect();
            info!(
                space_id = %space_id,
                user_id = %user_id,
                roles = ?outcome.planned,
                "Dry run, roles not granted"
            );
            return Ok(outcome);
        }

        if self.directory.supports_batch_grants() {
            let roles: Vec<RoleId> = pending.iter().map(|p| p.role).collect();
            let reason = grant_reason(
                &self.config.grant_reason_prefix,
                pending.iter().flat_map(|p| &p.sources),
            );
            match self
                .directory
                .grant_roles(space_id, user_id, &roles, &reason)
                .await
            {
                Ok(()) => {
                    info!(
                        space_id = %space_id,
                        user_id = %user_id,
                        roles = ?roles,
                        reason = %reason,
                        "Granted missing roles"
                    );
                    outcome.granted = roles;
                }
                Err(e) => {
                    log_grant_failure(space_id, user_id, &roles, &e);
                    outcome.failed = failed(&roles, &e);
                }
            }
        } else {
            for grant in &pending {
                let reason = grant_reason(&self.config.grant_reason_prefix, &grant.sources);
                match self
                    .directory
                    .grant_roles(space_id, user_id, &[grant.role], &reason)
                    .await
                {
                    Ok(()) => {
                        info!(
                            space_id = %space_id,
                            user_id = %user_id,
                            role_id = %grant.role,
                            reason = %reason,
                            "Granted missing role"
                        );
                        outcome.granted.push(grant.role);
                    }
                    Err(e) => {
                        log_grant_failure(space_id, user_id, &[grant.role], &e);
                        outcome.failed.extend(failed(&[grant.role], &e));
                    }
                }
            }
        }

        Ok(outcome)
    }
}

fn log_grant_failure(space_id: SpaceId, user_id: UserId, roles: &[RoleId], e: &DirectoryError) {
    if e.is_permission_denied() {
        warn!(
            space_id = %space_id,
            user_id = %user_id,
            roles = ?roles,
            error = %e,
            "Missing permission to grant roles"
        );
    } else {
        error!(
            space_id = %space_id,
            user_id = %user_id,
            roles = ?roles,
            error = %e,
            "Failed to grant roles"
        );
    }
}

async fn notify(progress: Option<&mpsc::Sender<AuditProgress>>, message: AuditProgress) {
    if let Some(tx) = progress {
        // A closed channel is picked up as cancellation before the next user.
        let _ = tx.send(message).await;
    }
}
