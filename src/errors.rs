//! Shared error types for decruft.
//!
//! Only fatal conditions and library-level failures surface as
//! [`DecruftError`]. Per-file scan problems are logged and skipped, and
//! per-step execution failures are recorded inline on the step itself.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for decruft operations
#[derive(Debug, Error)]
pub enum DecruftError {
    /// The repository root is missing or unreadable
    #[error("Cannot access repository root {path}: {message}")]
    RepositoryRoot { path: PathBuf, message: String },

    /// Version-control errors that abort the run
    #[error("Version control error: {0}")]
    Vcs(String),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Removal plan could not be built or loaded
    #[error("Plan error: {0}")]
    Plan(String),

    /// File system related errors
    #[error("File system error at {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// CSV errors
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl DecruftError {
    pub fn repository_root(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::RepositoryRoot {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    pub fn config_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Whether the error must abort the whole run with a non-zero exit.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RepositoryRoot { .. } | Self::Vcs(_) | Self::Config { .. }
        )
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, DecruftError>;
