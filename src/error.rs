//! Error taxonomy for the MGit engine.
//!
//! Engine modules return [`MgitError`]; the command layer wraps it in `anyhow`
//! with additional context. Unmapped parents and refs are not errors: they are
//! resolved by the fallback policy and logged.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = MgitError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum MgitError {
    /// Any failure surfaced by libgit2 (open, lookup, create).
    #[error("git operation '{operation}' failed")]
    Git {
        operation: String,
        #[source]
        source: git2::Error,
    },

    /// The mapping table on disk (or a transferred payload) cannot be trusted.
    #[error("mapping table {} is corrupt: {reason}", path.display())]
    MappingCorruption { path: PathBuf, reason: String },

    /// A stored MGit commit object cannot be parsed.
    #[error("MGit object {} is corrupt: {reason}", path.display())]
    ObjectCorruption { path: PathBuf, reason: String },

    /// Filesystem write or read failure under `.mgit/`.
    #[error("{operation} failed for {}", path.display())]
    Persistence {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid hash '{value}': {reason}")]
    InvalidHash { value: String, reason: String },

    #[error("invalid ref name '{name}'")]
    InvalidRef { name: String },

    /// Raised only under the `reject` unmapped-parent policy.
    #[error("parent commit {git_hash} has no MGit mapping")]
    UnmappedParent { git_hash: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("config {} is invalid: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl MgitError {
    /// Adapter for `map_err` on git2 results.
    pub fn git(operation: impl Into<String>) -> impl FnOnce(git2::Error) -> MgitError {
        let operation = operation.into();
        move |source| MgitError::Git { operation, source }
    }

    /// Adapter for `map_err` on filesystem results.
    pub fn io(operation: impl Into<String>, path: &Path) -> impl FnOnce(std::io::Error) -> MgitError {
        let operation = operation.into();
        let path = path.to_path_buf();
        move |source| MgitError::Persistence { operation, path, source }
    }

    pub fn not_found(what: impl Into<String>) -> MgitError {
        MgitError::NotFound { what: what.into() }
    }
}
