//! Error types for the Gobel CLI
//!
//! This module provides user-friendly error types with clear, actionable
//! messages that help users understand what went wrong and how to fix it.

use gobel_core::{ManagerError, StorageError};
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
///
/// All errors are designed to be user-facing with clear messages and
/// suggestions.
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your GOBEL_* environment variables or command-line flags.")]
    Config(String),

    /// Fetching a remote file failed
    #[error("Download failed: {0}. Check your network connection and the source URL, or pass --local with a file on disk.")]
    Download(String),

    /// The ontology file violated a structural constraint
    #[error("Ontology rejected: {0}")]
    InvalidOntology(String),

    /// A version label already holds different content
    #[error("Version '{0}' already exists with different content. Pass --overwrite to replace it, or choose another --version label.")]
    VersionConflict(String),

    /// A requested term or version does not exist
    #[error("Not found: {0}. Run 'gobel versions' to list stored releases.")]
    NotFound(String),

    /// No version label could be determined for a populate run
    #[error("{0}. Pass an explicit --version label.")]
    MissingVersion(String),

    /// The database holds no committed graph yet
    #[error("No ontology data stored yet. Run 'gobel populate' to load a release first.")]
    EmptyDatabase,

    /// An unparseable relation kind was given on the command line
    #[error("Invalid relation kind: '{0}'. Valid kinds: is_a, part_of, has_part, regulates, positively_regulates, negatively_regulates, occurs_in, ends_during, happens_during.")]
    InvalidKind(String),

    /// Database operation failed
    #[error("Database error: {0}. Check the database path and file permissions.")]
    Database(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid relation kind error
    pub fn invalid_kind(kind: impl Into<String>) -> Self {
        Self::InvalidKind(kind.into())
    }
}

/// Map engine errors onto user-facing variants with remediation hints
impl From<ManagerError> for CliError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Config(msg) => CliError::Config(msg),
            ManagerError::Download(e) => CliError::Download(e.to_string()),
            ManagerError::Build(e) => CliError::InvalidOntology(e.to_string()),
            ManagerError::MissingVersion(msg) => CliError::MissingVersion(msg),
            ManagerError::Storage(e) => e.into(),
        }
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::VersionConflict { version } => CliError::VersionConflict(version),
            StorageError::NotFound(msg) => CliError::NotFound(msg),
            StorageError::Corrupt(msg) => CliError::Database(msg),
            StorageError::Database(e) => CliError::Database(e.to_string()),
        }
    }
}
