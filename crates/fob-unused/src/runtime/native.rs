//! Native Runtime Implementation
//!
//! Glob expansion walks each include root with `walkdir` and filters entries
//! through the compiled [`CandidateQuery`]. Excluded directories are pruned
//! during the walk and dangling symlinks are skipped. All blocking work runs
//! on tokio's blocking pool.

// NativeRuntime wraps std::fs directly
#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use indexmap::IndexSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::debug;
use walkdir::WalkDir;

use crate::candidates::CandidateQuery;
use crate::runtime::{Runtime, RuntimeError, RuntimeResult};

/// Native filesystem Runtime implementation using `std::fs` and `walkdir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    pub fn new() -> Self {
        Self
    }
}

/// Blocking glob expansion shared by [`NativeRuntime::glob`].
///
/// Roots that do not exist produce no matches. Entries are visited in
/// file-name order so repeated runs enumerate identically.
pub fn expand(query: &CandidateQuery) -> RuntimeResult<Vec<PathBuf>> {
    let mut found: IndexSet<PathBuf> = IndexSet::new();

    for root in query.roots() {
        if !root.exists() {
            continue;
        }

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(entry.file_type().is_dir() && query.excludes(entry.path())));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if is_dangling_symlink(&e) => {
                    debug!(
                        "[fob-unused] skipping dangling symlink {}",
                        e.path().unwrap_or(root).display()
                    );
                    continue;
                }
                Err(e) => {
                    return Err(RuntimeError::Walk {
                        path: e.path().unwrap_or(root).to_path_buf(),
                        message: e.to_string(),
                    });
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if query.is_match(entry.path()) {
                found.insert(entry.into_path());
            }
        }
    }

    Ok(found.into_iter().collect())
}

/// A link whose target is missing. Any other walk error is real.
fn is_dangling_symlink(err: &walkdir::Error) -> bool {
    let target_missing = err
        .io_error()
        .is_some_and(|io| io.kind() == ErrorKind::NotFound);

    target_missing
        && err.path().is_some_and(|path| {
            path.symlink_metadata()
                .is_ok_and(|meta| meta.file_type().is_symlink())
        })
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn glob(&self, query: &CandidateQuery) -> RuntimeResult<Vec<PathBuf>> {
        let query = query.clone();

        task::spawn_blocking(move || expand(&query))
            .await
            .map_err(|e| RuntimeError::Other(format!("Task join error: {}", e)))?
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let path = path.to_path_buf();
        let content = content.to_vec();

        task::spawn_blocking(move || {
            std::fs::write(&path, content)
                .map_err(|e| RuntimeError::Io(format!("Failed to write {}: {}", path.display(), e)))
        })
        .await
        .map_err(|e| RuntimeError::Other(format!("Task join error: {}", e)))?
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        std::env::current_dir().map_err(|e| RuntimeError::Io(e.to_string()))
    }
}
