//! # fob-unused
//!
//! Finds files that match a set of glob patterns but never make it into a
//! build's module graph.
//!
//! Two things run concurrently for every [`UnusedFiles`] instance:
//!
//! - **Candidate discovery** expands the include/exclude patterns into the set
//!   of files that *could* be used. It starts at construction and runs once.
//! - **Usage collection** records the files the bundler actually resolved,
//!   fed by the host after every completed build.
//!
//! The [`Reconciler`] joins the two. Whichever finishes last computes
//! `candidates \ used` and hands it to the [`ReportWriter`], which writes a
//! pretty-printed JSON array of absolute paths to the configured output file.
//!
//! This crate does not bundle anything itself. Bundler integrations (see
//! `fob-plugin-unused`) call [`UnusedFiles::on_build_finished`] with the
//! modules of each build.
//!
//! ## Logging
//!
//! The crate emits `tracing` events and installs no subscriber.

pub mod candidates;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod report;
pub mod runtime;
pub mod tracker;
pub mod usage;

pub use candidates::{CandidateQuery, CandidateSet};
pub use config::{
    DEFAULT_OUTPUT_FILE, ResolvedOptions, UnusedConfigDiscovery, UnusedFilesOptions,
};
pub use error::{ConfigError, Result, UnusedError, WriteError};
pub use reconciler::{CandidateState, Reconciler, Trigger};
pub use report::{ReportWriter, UnusedReport};
pub use runtime::{Runtime, RuntimeError, RuntimeResult};
pub use tracker::{BuildOutcome, UnusedFiles};
pub use usage::{ModuleInfo, ResolvedModule, UsedSet, resource_path};

#[cfg(not(target_family = "wasm"))]
pub use runtime::native::NativeRuntime;
