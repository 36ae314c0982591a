//! Test utilities for fob-unused.
//!
//! `MemoryRuntime` serves candidate discovery from an in-memory file list
//! and records report writes, so tests can drive both sides of the
//! discovery/build race deterministically.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::candidates::CandidateQuery;
use crate::runtime::{Runtime, RuntimeError, RuntimeResult};

/// Holds `glob` until released.
#[derive(Debug, Clone)]
pub struct GlobGate {
    notify: Arc<Notify>,
}

impl GlobGate {
    /// Let the pending (or next) `glob` call complete
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

/// In-memory runtime with scripted files and failure injection.
///
/// ## Usage Example
///
/// ```rust,ignore
/// use fob_unused::runtime::test_utils::MemoryRuntime;
///
/// let runtime = MemoryRuntime::new("/project").with_files(["src/a.ts", "src/b.ts"]);
/// let (runtime, gate) = runtime.gated();
/// // ... start discovery, finish a build, then:
/// gate.release();
/// ```
#[derive(Debug)]
pub struct MemoryRuntime {
    cwd: PathBuf,
    files: Vec<PathBuf>,
    gate: Option<Arc<Notify>>,
    glob_error: Option<String>,
    fail_writes: bool,
    writes: Mutex<Vec<(PathBuf, String)>>,
}

impl MemoryRuntime {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: Vec::new(),
            gate: None,
            glob_error: None,
            fail_writes: false,
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Files visible to `glob`, in enumeration order. Relative paths are
    /// joined onto the runtime's cwd.
    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.files
            .extend(files.into_iter().map(|file| self.cwd.join(file.as_ref())));
        self
    }

    /// Make `glob` wait until the returned gate is released
    pub fn gated(mut self) -> (Self, GlobGate) {
        let notify = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&notify));
        (self, GlobGate { notify })
    }

    /// Make `glob` fail with an I/O error
    pub fn fail_glob(mut self, message: impl Into<String>) -> Self {
        self.glob_error = Some(message.into());
        self
    }

    /// Make every `write_file` fail
    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Contents of the most recent write to `path`
    pub fn last_write(&self, path: &Path) -> Option<String> {
        self.writes
            .lock()
            .iter()
            .rev()
            .find(|(target, _)| target == path)
            .map(|(_, content)| content.clone())
    }

    /// Number of writes to `path`
    pub fn write_count(&self, path: &Path) -> usize {
        self.writes
            .lock()
            .iter()
            .filter(|(target, _)| target == path)
            .count()
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn glob(&self, query: &CandidateQuery) -> RuntimeResult<Vec<PathBuf>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if let Some(message) = &self.glob_error {
            return Err(RuntimeError::Io(message.clone()));
        }

        Ok(self
            .files
            .iter()
            .filter(|file| query.is_match(file))
            .cloned()
            .collect())
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        if self.fail_writes {
            return Err(RuntimeError::Io(format!(
                "Failed to write {}: permission denied",
                path.display()
            )));
        }

        self.writes.lock().push((
            path.to_path_buf(),
            String::from_utf8_lossy(content).into_owned(),
        ));
        Ok(())
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}
