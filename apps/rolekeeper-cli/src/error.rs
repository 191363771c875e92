//! CLI error types and exit codes

use rolekeeper_reconcile::{ConfigError, ReconcileError};
use rolekeeper_rules::RuleError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 3: Directory error
/// - 4: Validation error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Directory(_) => 3,
            CliError::Validation(_) | CliError::NotFound(_) => 4,
            CliError::Storage(_) | CliError::Config(_) | CliError::Io(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    /// Get a suggested action for this error
    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::NotFound(_) => Some("Run 'rolekeeper group list' or 'rolekeeper chain list'."),
            CliError::Config(_) => {
                Some("Check ROLEKEEPER_DIRECTORY_PATH, ROLEKEEPER_RULES_PATH and ROLEKEEPER_SPACE.")
            }
            _ => None,
        }
    }
}

impl From<RuleError> for CliError {
    fn from(e: RuleError) -> Self {
        match e {
            RuleError::Definition(d) => CliError::Validation(d.to_string()),
            RuleError::NotFound { .. } => CliError::NotFound(e.to_string()),
            RuleError::Directory(d) => CliError::Directory(d.to_string()),
            RuleError::Storage(s) => CliError::Storage(s),
        }
    }
}

impl From<ReconcileError> for CliError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::Rules(r) => r.into(),
            ReconcileError::Directory(d) => CliError::Directory(d.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Config(format!("JSON error: {}", e))
    }
}
