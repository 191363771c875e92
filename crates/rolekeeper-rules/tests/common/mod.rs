//! Shared fixtures for rolekeeper-rules integration tests.

use std::path::Path;
use std::sync::Arc;

use rolekeeper_core::{InMemoryRoleDirectory, RoleId, SpaceId};
use rolekeeper_rules::{JsonFileRuleStore, RuleService};

pub const SPACE: SpaceId = SpaceId::new(1_000);
pub const OTHER_SPACE: SpaceId = SpaceId::new(2_000);

pub const PAGE: RoleId = RoleId::new(11);
pub const SQUIRE: RoleId = RoleId::new(12);
pub const KNIGHT: RoleId = RoleId::new(13);
pub const LORD: RoleId = RoleId::new(14);
pub const OWNER: RoleId = RoleId::new(99);

/// A directory with a four-rung ladder and one role above the acting principal.
pub async fn directory() -> Arc<InMemoryRoleDirectory> {
    let directory = Arc::new(InMemoryRoleDirectory::new());
    for space in [SPACE, OTHER_SPACE] {
        directory.set_acting_position(space, 50).await;
        directory.add_role(space, PAGE, "Page", 1).await;
        directory.add_role(space, SQUIRE, "Squire", 2).await;
        directory.add_role(space, KNIGHT, "Knight", 3).await;
        directory.add_role(space, LORD, "Lord", 4).await;
        directory.add_role(space, OWNER, "Owner", 100).await;
    }
    directory
}

/// A service backed by a rule file at `path`.
pub async fn file_service(path: &Path, directory: Arc<InMemoryRoleDirectory>) -> RuleService {
    let store = JsonFileRuleStore::open(path)
        .await
        .expect("Failed to open rule file");
    RuleService::new(Arc::new(store), directory)
}
