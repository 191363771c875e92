//! JSON file rule store.
//!
//! The whole document (space id to [`SpaceRules`]) is rewritten after every
//! mutation. A write goes to a sibling temp file first and is renamed over
//! the target, so a crash never leaves a half-written document behind.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rolekeeper_core::SpaceId;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::store::RuleStore;
use crate::types::{Chain, Group, SpaceRules};

type Document = BTreeMap<SpaceId, SpaceRules>;

/// File-backed rule store.
#[derive(Debug)]
pub struct JsonFileRuleStore {
    path: PathBuf,
    document: Mutex<Document>,
}

impl JsonFileRuleStore {
    /// Open a store, starting empty if the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Document::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Document::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), spaces = document.len(), "Opened rule file");

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, document: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Apply a change to a copy of the document, persist it, then commit.
    async fn mutate<T>(&self, change: impl FnOnce(&mut Document) -> T) -> Result<T> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        let out = change(&mut next);
        self.persist(&next).await?;
        *document = next;
        Ok(out)
    }
}

#[async_trait::async_trait]
impl RuleStore for JsonFileRuleStore {
    async fn upsert_group(&self, space_id: SpaceId, group: Group) -> Result<Option<Group>> {
        self.mutate(|doc| {
            doc.entry(space_id)
                .or_default()
                .groups
                .insert(group.name.clone(), group)
        })
        .await
    }

    async fn upsert_chain(&self, space_id: SpaceId, chain: Chain) -> Result<Option<Chain>> {
        self.mutate(|doc| {
            doc.entry(space_id)
                .or_default()
                .chains
                .insert(chain.name.clone(), chain)
        })
        .await
    }

    async fn remove_group(&self, space_id: SpaceId, name: &str) -> Result<bool> {
        if self.get_group(space_id, name).await?.is_none() {
            return Ok(false);
        }
        self.mutate(|doc| {
            doc.get_mut(&space_id)
                .is_some_and(|s| s.groups.remove(name).is_some())
        })
        .await
    }

    async fn remove_chain(&self, space_id: SpaceId, name: &str) -> Result<bool> {
        if self.get_chain(space_id, name).await?.is_none() {
            return Ok(false);
        }
        self.mutate(|doc| {
            doc.get_mut(&space_id)
                .is_some_and(|s| s.chains.remove(name).is_some())
        })
        .await
    }

    async fn get_group(&self, space_id: SpaceId, name: &str) -> Result<Option<Group>> {
        let document = self.document.lock().await;
        Ok(document
            .get(&space_id)
            .and_then(|s| s.groups.get(name))
            .cloned())
    }

    async fn get_chain(&self, space_id: SpaceId, name: &str) -> Result<Option<Chain>> {
        let document = self.document.lock().await;
        Ok(document
            .get(&space_id)
            .and_then(|s| s.chains.get(name))
            .cloned())
    }

    async fn space_rules(&self, space_id: SpaceId) -> Result<SpaceRules> {
        let document = self.document.lock().await;
        Ok(document.get(&space_id).cloned().unwrap_or_default())
    }
}
