//! Runtime context shared by every command.
//!
//! Rules live in a JSON rule file that is rewritten on every change. The
//! directory is a snapshot file; commands that grant roles only write it
//! back when asked to.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use rolekeeper_core::{DirectorySnapshot, InMemoryRoleDirectory, SpaceId};
use rolekeeper_reconcile::{Reconciler, ReconcilerConfig};
use rolekeeper_rules::{JsonFileRuleStore, RuleService};

use crate::error::{CliError, CliResult};

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Space to operate on
    #[arg(long, global = true, env = "ROLEKEEPER_SPACE")]
    pub space: Option<SpaceId>,

    /// Rule file
    #[arg(
        long,
        global = true,
        env = "ROLEKEEPER_RULES_PATH",
        default_value = "rolekeeper-rules.json"
    )]
    pub rules: PathBuf,

    /// Directory snapshot file
    #[arg(long, global = true, env = "ROLEKEEPER_DIRECTORY_PATH")]
    pub directory: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Loaded stores and services for one invocation.
pub struct AppContext {
    pub space: SpaceId,
    pub json: bool,
    pub directory: Arc<InMemoryRoleDirectory>,
    pub reconciler: Reconciler,
    directory_path: PathBuf,
}

impl AppContext {
    /// Open the rule file and load the directory snapshot.
    pub async fn load(args: &GlobalArgs, config: ReconcilerConfig) -> CliResult<Self> {
        let space = args
            .space
            .ok_or_else(|| CliError::Config("no space given (--space)".to_string()))?;
        let directory_path = args.directory.clone().ok_or_else(|| {
            CliError::Config("no directory snapshot given (--directory)".to_string())
        })?;

        let snapshot = read_snapshot(&directory_path).await?;
        if !snapshot.spaces.contains_key(&space) {
            return Err(CliError::Config(format!(
                "space {space} is not in {}",
                directory_path.display()
            )));
        }
        let directory = Arc::new(InMemoryRoleDirectory::from_snapshot(snapshot));
        let store = Arc::new(JsonFileRuleStore::open(&args.rules).await?);

        tracing::debug!(
            space_id = %space,
            rules = %args.rules.display(),
            directory = %directory_path.display(),
            "Context loaded"
        );

        Ok(Self {
            space,
            json: args.json,
            reconciler: Reconciler::with_config(store, directory.clone(), config),
            directory,
            directory_path,
        })
    }

    /// Rule administration for this context.
    pub fn rules(&self) -> &RuleService {
        self.reconciler.rules()
    }

    /// Write the directory snapshot back to its file.
    pub async fn save_directory(&self) -> CliResult<()> {
        let snapshot = self.directory.snapshot().await;
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(&self.directory_path, bytes).await?;
        tracing::info!(path = %self.directory_path.display(), "Directory snapshot saved");
        Ok(())
    }
}

async fn read_snapshot(path: &Path) -> CliResult<DirectorySnapshot> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CliError::Config(format!("cannot read {}: {e}", path.display())))?;
    Ok(serde_json::from_slice(&bytes)?)
}
