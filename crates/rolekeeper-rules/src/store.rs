//! Rule storage.
//!
//! A store maps each space to its [`SpaceRules`]. Writes replace a rule
//! wholesale by name (last write wins, no history). A space's entry is
//! created implicitly by its first insertion.

use std::collections::HashMap;
use std::sync::Arc;

use rolekeeper_core::SpaceId;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{Chain, Group, SpaceRules};

// ============================================================================
// Store Trait
// ============================================================================

/// Trait for rule storage backends.
///
/// Reads and writes are not isolated from in-flight reconciliation. A pass
/// works from whatever snapshot it read at its start.
#[async_trait::async_trait]
pub trait RuleStore: Send + Sync {
    /// Insert or replace a group, returning the previous definition.
    async fn upsert_group(&self, space_id: SpaceId, group: Group) -> Result<Option<Group>>;

    /// Insert or replace a chain, returning the previous definition.
    async fn upsert_chain(&self, space_id: SpaceId, chain: Chain) -> Result<Option<Chain>>;

    /// Remove a group. Returns `false` if no group had that name.
    async fn remove_group(&self, space_id: SpaceId, name: &str) -> Result<bool>;

    /// Remove a chain. Returns `false` if no chain had that name.
    async fn remove_chain(&self, space_id: SpaceId, name: &str) -> Result<bool>;

    /// Get a group by name.
    async fn get_group(&self, space_id: SpaceId, name: &str) -> Result<Option<Group>>;

    /// Get a chain by name.
    async fn get_chain(&self, space_id: SpaceId, name: &str) -> Result<Option<Chain>>;

    /// All rules of a space. Empty if the space has none.
    async fn space_rules(&self, space_id: SpaceId) -> Result<SpaceRules>;

    /// All groups of a space, in name order.
    async fn list_groups(&self, space_id: SpaceId) -> Result<Vec<Group>> {
        Ok(self.space_rules(space_id).await?.groups.into_values().collect())
    }

    /// All chains of a space, in name order.
    async fn list_chains(&self, space_id: SpaceId) -> Result<Vec<Chain>> {
        Ok(self.space_rules(space_id).await?.chains.into_values().collect())
    }
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory rule store.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    spaces: Arc<RwLock<HashMap<SpaceId, SpaceRules>>>,
}

impl InMemoryRuleStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with rules.
    #[must_use]
    pub fn with_rules(spaces: HashMap<SpaceId, SpaceRules>) -> Self {
        Self {
            spaces: Arc::new(RwLock::new(spaces)),
        }
    }
}

#[async_trait::async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn upsert_group(&self, space_id: SpaceId, group: Group) -> Result<Option<Group>> {
        let mut spaces = self.spaces.write().await;
        Ok(spaces
            .entry(space_id)
            .or_default()
            .groups
            .insert(group.name.clone(), group))
    }

    async fn upsert_chain(&self, space_id: SpaceId, chain: Chain) -> Result<Option<Chain>> {
        let mut spaces = self.spaces.write().await;
        Ok(spaces
            .entry(space_id)
            .or_default()
            .chains
            .insert(chain.name.clone(), chain))
    }

    async fn remove_group(&self, space_id: SpaceId, name: &str) -> Result<bool> {
        let mut spaces = self.spaces.write().await;
        Ok(spaces
            .get_mut(&space_id)
            .is_some_and(|s| s.groups.remove(name).is_some()))
    }

    async fn remove_chain(&self, space_id: SpaceId, name: &str) -> Result<bool> {
        let mut spaces = self.spaces.write().await;
        Ok(spaces
            .get_mut(&space_id)
            .is_some_and(|s| s.chains.remove(name).is_some()))
    }

    async fn get_group(&self, space_id: SpaceId, name: &str) -> Result<Option<Group>> {
        let spaces = self.spaces.read().await;
        Ok(spaces
            .get(&space_id)
            .and_then(|s| s.groups.get(name))
            .cloned())
    }

    async fn get_chain(&self, space_id: SpaceId, name: &str) -> Result<Option<Chain>> {
        let spaces = self.spaces.read().await;
        Ok(spaces
            .get(&space_id)
            .and_then(|s| s.chains.get(name))
            .cloned())
    }

    async fn space_rules(&self, space_id: SpaceId) -> Result<SpaceRules> {
        let spaces = self.spaces.read().await;
        Ok(spaces.get(&space_id).cloned().unwrap_or_default())
    }
}

// ============================================================================
// Tests
// ============================================================================
