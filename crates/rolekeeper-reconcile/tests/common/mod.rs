//! Shared mocks for rolekeeper-reconcile integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rolekeeper_core::{
    DirectoryError, InMemoryRoleDirectory, ResolvedRole, RoleDirectory, RoleId, RoleSet, SpaceId,
    UserId,
};
use rolekeeper_reconcile::{AuditProgress, Reconciler, ReconcilerConfig};
use rolekeeper_rules::{Chain, Group, InMemoryRuleStore, SpaceRules};
use tokio::sync::mpsc;

pub const SPACE: SpaceId = SpaceId::new(500);

pub const MEMBER: RoleId = RoleId::new(1);
pub const REGULAR: RoleId = RoleId::new(2);
pub const VETERAN: RoleId = RoleId::new(3);
pub const ELITE: RoleId = RoleId::new(4);
pub const HELPER: RoleId = RoleId::new(5);
pub const STAFF: RoleId = RoleId::new(6);

const NONE: u64 = 0;

// =============================================================================
// Manual Mock Directory
// =============================================================================

/// Snapshot directory with injectable failures and call recording.
pub struct TestDirectory {
    pub inner: InMemoryRoleDirectory,
    batch: AtomicBool,
    failing_user: AtomicU64,
    denied_role: AtomicU64,
    transport_role: AtomicU64,
    grant_call_count: AtomicUsize,
    reasons: Mutex<Vec<String>>,
    close_after: Mutex<Option<(UserId, mpsc::Receiver<AuditProgress>)>>,
}

impl TestDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: InMemoryRoleDirectory::new(),
            batch: AtomicBool::new(true),
            failing_user: AtomicU64::new(NONE),
            denied_role: AtomicU64::new(NONE),
            transport_role: AtomicU64::new(NONE),
            grant_call_count: AtomicUsize::new(0),
            reasons: Mutex::new(Vec::new()),
            close_after: Mutex::new(None),
        }
    }

    pub fn without_batch_grants(self) -> Self {
        self.batch.store(false, Ordering::SeqCst);
        self
    }

    /// Reading this user's roles fails with a transport error.
    pub fn with_failing_user(self, user_id: UserId) -> Self {
        self.failing_user.store(user_id.get(), Ordering::SeqCst);
        self
    }

    /// Any grant call including this role is refused for lack of authority.
    pub fn with_denied_role(self, role_id: RoleId) -> Self {
        self.denied_role.store(role_id.get(), Ordering::SeqCst);
        self
    }

    /// Any grant call including this role fails in transit.
    pub fn with_transport_failure(self, role_id: RoleId) -> Self {
        self.transport_role.store(role_id.get(), Ordering::SeqCst);
        self
    }

    /// Drop `receiver` once `user_id`'s roles have been read.
    pub fn close_progress_after(&self, user_id: UserId, receiver: mpsc::Receiver<AuditProgress>) {
        *self.close_after.lock().unwrap() = Some((user_id, receiver));
    }

    pub fn grant_calls(&self) -> usize {
        self.grant_call_count.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.reasons.lock().unwrap().clone()
    }
}

impl Default for TestDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleDirectory for TestDirectory {
    async fn resolve_role(
        &self,
        space_id: SpaceId,
        role_id: RoleId,
    ) -> Result<Option<ResolvedRole>, DirectoryError> {
        self.inner.resolve_role(space_id, role_id).await
    }

    async fn current_roles(
        &self,
        space_id: SpaceId,
        user_id: UserId,
    ) -> Result<RoleSet, DirectoryError> {
        if self.failing_user.load(Ordering::SeqCst) == user_id.get() {
            return Err(DirectoryError::transport("connection reset"));
        }
        let roles = self.inner.current_roles(space_id, user_id).await;

        let mut close_after = self.close_after.lock().unwrap();
        if close_after.as_ref().is_some_and(|(u, _)| *u == user_id) {
            close_after.take();
        }
        roles
    }

    async fn grant_roles(
        &self,
        space_id: SpaceId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> Result<(), DirectoryError> {
        self.grant_call_count.fetch_add(1, Ordering::SeqCst);
        self.reasons.lock().unwrap().push(reason.to_string());

        let has = |slot: &AtomicU64| {
            let id = slot.load(Ordering::SeqCst);
            roles.iter().any(|r| r.get() == id)
        };
        if has(&self.denied_role) {
            return Err(DirectoryError::PermissionDenied {
                message: Some("Missing Permissions".to_string()),
            });
        }
        if has(&self.transport_role) {
            return Err(DirectoryError::transport("503 Service Unavailable"));
        }
        self.inner.grant_roles(space_id, user_id, roles, reason).await
    }

    fn supports_batch_grants(&self) -> bool {
        self.batch.load(Ordering::SeqCst)
    }

    async fn is_manageable(
        &self,
        space_id: SpaceId,
        role_id: RoleId,
    ) -> Result<bool, DirectoryError> {
        self.inner.is_manageable(space_id, role_id).await
    }

    async fn is_service_account(
        &self,
        space_id: SpaceId,
        user_id: UserId,
    ) -> Result<bool, DirectoryError> {
        self.inner.is_service_account(space_id, user_id).await
    }

    async fn list_users(&self, space_id: SpaceId) -> Result<Vec<UserId>, DirectoryError> {
        self.inner.list_users(space_id).await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Add the standard roles to `directory`.
pub async fn seed_roles(directory: &TestDirectory) {
    directory.inner.set_acting_position(SPACE, 100).await;
    for (id, name, position) in [
        (MEMBER, "Member", 1),
        (REGULAR, "Regular", 2),
        (VETERAN, "Veteran", 3),
        (ELITE, "Elite", 4),
        (HELPER, "Helper", 5),
        (STAFF, "Staff", 6),
    ] {
        directory.inner.add_role(SPACE, id, name, position).await;
    }
}

/// A store with the `progression` chain and the `staff` group.
pub fn seed_rules() -> Arc<InMemoryRuleStore> {
    let progression = Chain {
        name: "progression".to_string(),
        roles: vec![MEMBER, REGULAR, VETERAN, ELITE],
    };
    let staff = Group {
        name: "staff".to_string(),
        group_role: STAFF,
        member_roles: vec![HELPER],
    };
    let rules = SpaceRules {
        groups: BTreeMap::from([(staff.name.clone(), staff)]),
        chains: BTreeMap::from([(progression.name.clone(), progression)]),
    };
    Arc::new(InMemoryRuleStore::with_rules(HashMap::from([(SPACE, rules)])))
}

/// A reconciler over the standard rules and a seeded `directory`.
pub async fn reconciler(
    directory: TestDirectory,
    config: ReconcilerConfig,
) -> (Reconciler, Arc<TestDirectory>) {
    seed_roles(&directory).await;
    let directory = Arc::new(directory);
    let reconciler = Reconciler::with_config(seed_rules(), directory.clone(), config);
    (reconciler, directory)
}
