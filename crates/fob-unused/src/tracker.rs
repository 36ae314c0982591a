//! The unused-files tracker
//!
//! [`UnusedFiles`] ties the pieces together for one set of options:
//!
//! ```text
//! new() ──spawn──▶ discovery (glob) ──┐
//!                                     ├──▶ Reconciler ──▶ ReportWriter ──▶ output file
//! host: on_build_finished(modules) ───┘
//! ```
//!
//! Discovery starts as soon as the tracker is constructed and runs on the
//! ambient tokio runtime. The host calls [`UnusedFiles::on_build_finished`]
//! once per completed build. Whichever side finishes last writes the report.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::candidates;
use crate::config::{ResolvedOptions, UnusedFilesOptions};
use crate::error::{ConfigError, Result, UnusedError};
use crate::reconciler::{Reconciler, Trigger};
use crate::report::{ReportWriter, UnusedReport};
use crate::runtime::Runtime;
use crate::usage::ResolvedModule;

/// Result of a build-finished signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Candidates were available; the report was computed and a write attempted.
    Reported { report: UnusedReport, written: bool },
    /// Discovery is still running; the report is written when it completes.
    Deferred,
}

#[derive(Debug)]
struct Shared {
    options: UnusedFilesOptions,
    resolved: ResolvedOptions,
    reconciler: Mutex<Reconciler>,
    writer: ReportWriter,
}

/// Detects files matched by the configured patterns that no build uses.
///
/// # Example
///
/// ```rust,no_run
/// use fob_unused::{ModuleInfo, UnusedFiles, UnusedFilesOptions};
///
/// # async fn example() -> fob_unused::Result<()> {
/// let tracker = UnusedFiles::new(UnusedFilesOptions::new().exclude("src/**/*.test.ts"))?;
///
/// // Called by the bundler integration after every build
/// tracker
///     .on_build_finished(vec![ModuleInfo::file("/project/src/index.ts")])
///     .await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UnusedFiles {
    shared: Arc<Shared>,
    discovery: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl UnusedFiles {
    /// Create a tracker backed by the native filesystem
    #[cfg(not(target_family = "wasm"))]
    pub fn new(options: UnusedFilesOptions) -> Result<Self> {
        Self::with_runtime(
            options,
            Arc::new(crate::runtime::native::NativeRuntime::new()),
        )
    }

    /// Create a tracker backed by `runtime`.
    ///
    /// Options are validated synchronously; candidate discovery is spawned
    /// only once they are known to be good.
    ///
    /// # Errors
    ///
    /// - `UnusedError::Config` for malformed options or glob patterns
    /// - `UnusedError::NoRuntime` when called outside a tokio runtime
    pub fn with_runtime(options: UnusedFilesOptions, runtime: Arc<dyn Runtime>) -> Result<Self> {
        let cwd = runtime
            .get_cwd()
            .map_err(|e| ConfigError::invalid_value("cwd", e.to_string()))?;
        let resolved = options.resolve(&cwd)?;
        let handle = tokio::runtime::Handle::try_current().map_err(|_| UnusedError::NoRuntime)?;

        let shared = Arc::new(Shared {
            writer: ReportWriter::new(Arc::clone(&runtime), resolved.output_file.clone()),
            options,
            resolved,
            reconciler: Mutex::new(Reconciler::new()),
        });

        debug!(
            "[fob-unused] discovering candidates under {}",
            shared.resolved.cwd.display()
        );
        let task = handle.spawn(discover(Arc::clone(&shared), runtime));

        Ok(Self {
            shared,
            discovery: Mutex::new(Some(task)),
        })
    }

    pub fn options(&self) -> &UnusedFilesOptions {
        &self.shared.options
    }

    /// Absolute path the report is written to
    pub fn output_file(&self) -> &Path {
        self.shared.writer.output_file()
    }

    /// Whether candidate discovery has completed
    pub fn is_ready(&self) -> bool {
        self.shared.reconciler.lock().is_ready()
    }

    /// Whether a report is waiting on candidate discovery
    pub fn is_pending(&self) -> bool {
        self.shared.reconciler.lock().is_pending()
    }

    pub fn used_count(&self) -> usize {
        self.shared.reconciler.lock().used().len()
    }

    /// Record one used file. Adding a file twice is a no-op.
    pub fn add_used(&self, path: impl AsRef<Path>) -> bool {
        self.shared.reconciler.lock().add_used(path.as_ref())
    }

    /// Current unused set without writing anything
    pub fn unused(&self) -> Option<UnusedReport> {
        self.shared.reconciler.lock().unused()
    }

    /// Entry point for the host pipeline, called once per completed build.
    ///
    /// Records every module with a resource path, then either writes the
    /// report or, if discovery is still running, leaves it to discovery.
    /// Write failures are logged and never returned.
    pub async fn on_build_finished<I>(&self, modules: I) -> BuildOutcome
    where
        I: IntoIterator,
        I::Item: ResolvedModule,
    {
        let trigger = {
            let mut reconciler = self.shared.reconciler.lock();
            let collected = reconciler.collect(modules);
            debug!(
                "[fob-unused] build finished: {} modules with paths, {} used files total",
                collected,
                reconciler.used().len()
            );
            reconciler.build_finished()
        };

        match trigger {
            Trigger::Deferred => BuildOutcome::Deferred,
            Trigger::Reconcile(report) => {
                let written = self.shared.writer.persist(&report).await;
                BuildOutcome::Reported { report, written }
            }
        }
    }

    /// Wait for candidate discovery, including any deferred report write.
    ///
    /// Only the first call observes the outcome; later calls return `Ok(())`.
    ///
    /// # Errors
    ///
    /// - `UnusedError::Enumeration` if globbing failed
    /// - `UnusedError::Task` if the discovery task panicked or was cancelled
    pub async fn wait_for_candidates(&self) -> Result<()> {
        let task = self.discovery.lock().take();
        match task {
            Some(task) => task.await.map_err(|e| UnusedError::Task(e.to_string()))?,
            None => Ok(()),
        }
    }
}

async fn discover(shared: Arc<Shared>, runtime: Arc<dyn Runtime>) -> Result<()> {
    let candidates = match candidates::discover(runtime, &shared.resolved.query).await {
        Ok(candidates) => candidates,
        Err(err) => {
            error!("[fob-unused] {err}; no unused-files report will be written");
            return Err(err);
        }
    };

    let deferred = shared.reconciler.lock().candidates_available(candidates);
    if let Some(report) = deferred {
        debug!("[fob-unused] writing deferred report");
        shared.writer.persist(&report).await;
    }

    Ok(())
}
