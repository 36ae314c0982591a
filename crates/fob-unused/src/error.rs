//! Error types for unused-file detection

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::runtime::RuntimeError;

pub type Result<T> = std::result::Result<T, UnusedError>;

/// Errors raised while building or loading [`UnusedFilesOptions`](crate::UnusedFilesOptions).
///
/// These are raised synchronously, before any asynchronous discovery starts.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid option `{field}`")]
    #[diagnostic(code(fob::unused::invalid_option))]
    InvalidValue {
        field: String,
        #[help]
        hint: Option<String>,
    },

    #[error("invalid glob pattern `{pattern}`: {source}")]
    #[diagnostic(
        code(fob::unused::invalid_pattern),
        help("Patterns use glob syntax relative to the project root, e.g. \"src/**\"")
    )]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("unused-files config not found")]
    #[diagnostic(
        code(fob::unused::config_not_found),
        help("Add an [unused] table to fob.toml or a fob.unused field to package.json")
    )]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            hint: Some(hint.into()),
        }
    }
}

/// Failure to persist a report. Always caught and logged by the writer.
#[derive(Debug, Error, Diagnostic)]
pub enum WriteError {
    #[error("failed to serialize unused-files report: {0}")]
    #[diagnostic(code(fob::unused::serialize))]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write unused-files report to {path}: {source}")]
    #[diagnostic(code(fob::unused::write))]
    Runtime {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },
}

/// Crate-level error type
#[derive(Debug, Error, Diagnostic)]
pub enum UnusedError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// Candidate discovery failed; no report is produced for this run.
    #[error("candidate discovery failed: {0}")]
    #[diagnostic(code(fob::unused::enumeration))]
    Enumeration(#[source] RuntimeError),

    #[error("candidate discovery task failed: {0}")]
    #[diagnostic(code(fob::unused::task))]
    Task(String),

    #[error("no tokio runtime available to run candidate discovery")]
    #[diagnostic(
        code(fob::unused::no_runtime),
        help("Construct UnusedFiles from within a tokio runtime")
    )]
    NoRuntime,
}
