use serde::{Deserialize, Serialize};

/// Configuration for the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Emit an audit progress update every this many processed users.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Prefix of the reason attached to every grant call.
    #[serde(default = "default_grant_reason_prefix")]
    pub grant_reason_prefix: String,

    /// Evaluate and report grants without calling the directory.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_progress_interval() -> usize {
    50
}

fn default_grant_reason_prefix() -> String {
    "RoleKeeper".to_string()
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            grant_reason_prefix: default_grant_reason_prefix(),
            dry_run: false,
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Every variable is optional. Tests supply variables through the reader
    /// instead of mutating the process environment.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let progress_interval = match reader("ROLEKEEPER_PROGRESS_INTERVAL") {
            Ok(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("ROLEKEEPER_PROGRESS_INTERVAL".into(), e.to_string())
            })?,
            Err(_) => default_progress_interval(),
        };
        if progress_interval == 0 {
            return Err(ConfigError::InvalidValue(
                "ROLEKEEPER_PROGRESS_INTERVAL".into(),
                "must be greater than zero".into(),
            ));
        }

        let grant_reason_prefix = reader("ROLEKEEPER_GRANT_REASON")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_grant_reason_prefix);

        let dry_run = match reader("ROLEKEEPER_DRY_RUN") {
            Ok(raw) => raw.trim().parse::<bool>().map_err(|e| {
                ConfigError::InvalidValue("ROLEKEEPER_DRY_RUN".into(), e.to_string())
            })?,
            Err(_) => false,
        };

        Ok(Self {
            progress_interval,
            grant_reason_prefix,
            dry_run,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
