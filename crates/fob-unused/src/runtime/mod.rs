//! Filesystem abstraction for unused-file detection
//!
//! Candidate discovery and report persistence are the only two places this
//! crate touches the outside world. Both go through the [`Runtime`] trait so
//! that hosts (and tests) can supply their own filesystem.

#[cfg(not(target_family = "wasm"))]
pub mod native;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::candidates::CandidateQuery;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Directory traversal failed while expanding glob patterns
    #[error("failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// Platform runtime trait
///
/// # Contract
///
/// - `glob` returns absolute paths of regular files matched by the query,
///   dotfiles included, in a stable order with no duplicates.
/// - `write_file` replaces the file contents; it does not create parent
///   directories.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Expand the query's include patterns minus its exclude patterns
    async fn glob(&self, query: &CandidateQuery) -> RuntimeResult<Vec<PathBuf>>;

    /// Write a file to the filesystem
    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()>;

    /// Get the current working directory
    fn get_cwd(&self) -> RuntimeResult<PathBuf>;
}
