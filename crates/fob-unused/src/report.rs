//! Report serialization and persistence

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::WriteError;
use crate::runtime::Runtime;

/// Candidate files no build has pulled in, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UnusedReport {
    files: Vec<PathBuf>,
}

impl UnusedReport {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|file| file == path)
    }

    /// JSON array of paths, pretty-printed with two-space indentation.
    pub fn to_json(&self) -> Result<String, WriteError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl IntoIterator for UnusedReport {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Persists reports to the configured output file.
///
/// Writes are independent: two reconciliations in quick succession race and
/// the last one to finish wins.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    runtime: Arc<dyn Runtime>,
    output_file: PathBuf,
}

impl ReportWriter {
    pub fn new(runtime: Arc<dyn Runtime>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            output_file: output_file.into(),
        }
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Serialize and write, returning any failure to the caller.
    pub async fn write(&self, report: &UnusedReport) -> Result<(), WriteError> {
        let json = report.to_json()?;
        self.runtime
            .write_file(&self.output_file, json.as_bytes())
            .await
            .map_err(|source| WriteError::Runtime {
                path: self.output_file.clone(),
                source,
            })
    }

    /// Write the report, logging failures instead of returning them.
    ///
    /// Returns whether the report reached the output file.
    pub async fn persist(&self, report: &UnusedReport) -> bool {
        match self.write(report).await {
            Ok(()) => {
                info!(
                    "[fob-unused] {} unused files written to {}",
                    report.len(),
                    self.output_file.display()
                );
                true
            }
            Err(err) => {
                error!("[fob-unused] {err}");
                false
            }
        }
    }
}
