//! Options for unused-file detection
//!
//! Options are captured once, at construction, and never change for the
//! lifetime of an [`UnusedFiles`](crate::UnusedFiles) instance. They can be
//! built in code, deserialized from a `serde_json::Value`, or discovered from
//! `fob.toml` / `package.json`.

use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::candidates::CandidateQuery;
use crate::error::ConfigError;

/// Default output file name, relative to the project root.
pub const DEFAULT_OUTPUT_FILE: &str = "unused";

fn default_include() -> Vec<String> {
    vec!["src/**".to_string()]
}

fn default_output_file() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_FILE)
}

/// User-facing options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedFilesOptions {
    /// Glob patterns of files to check
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns removed from the checked set
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Where the report is written. Relative paths resolve against `cwd`.
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Project root patterns are anchored to. Defaults to the current directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl Default for UnusedFilesOptions {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: Vec::new(),
            output_file: default_output_file(),
            cwd: None,
        }
    }
}

impl UnusedFilesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the include patterns
    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the exclude patterns
    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Add one include pattern
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    /// Add one exclude pattern
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = path.into();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Create from serde_json::Value (for programmatic config from a host)
    ///
    /// Missing keys take their defaults; unknown keys are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use fob_unused::UnusedFilesOptions;
    /// use serde_json::json;
    ///
    /// let options = UnusedFilesOptions::from_value(json!({
    ///     "include": ["src/**", "styles/**"],
    ///     "outputFile": "reports/unused.json"
    /// }))
    /// .unwrap();
    /// assert_eq!(options.include.len(), 2);
    /// assert!(options.exclude.is_empty());
    /// ```
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let object = match &value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(ConfigError::invalid_value(
                    "options",
                    format!("expected an object, found {}", type_name(other)),
                ));
            }
        };

        for field in ["include", "exclude"] {
            if let Some(patterns) = object.get(field) {
                check_patterns(field, patterns)?;
            }
        }
        if let Some(output) = object.get("outputFile") {
            if !output.is_string() {
                return Err(ConfigError::invalid_value(
                    "outputFile",
                    format!("expected a string path, found {}", type_name(output)),
                ));
            }
        }

        serde_json::from_value(value).map_err(|e| ConfigError::invalid_value("options", e.to_string()))
    }

    /// Validate patterns and pin every path against the project root.
    ///
    /// `fallback_cwd` is used when no `cwd` option was given.
    pub fn resolve(&self, fallback_cwd: &Path) -> Result<ResolvedOptions, ConfigError> {
        let cwd = match &self.cwd {
            Some(cwd) => fallback_cwd.join(cwd).clean(),
            None => fallback_cwd.to_path_buf(),
        };
        let output_file = cwd.join(&self.output_file).clean();
        let query = CandidateQuery::compile(&cwd, &self.include, &self.exclude)?;

        Ok(ResolvedOptions {
            cwd,
            output_file,
            query,
        })
    }
}

fn check_patterns(field: &str, value: &Value) -> Result<(), ConfigError> {
    let Value::Array(items) = value else {
        return Err(ConfigError::invalid_value(
            field,
            format!("expected an array of glob patterns, found {}", type_name(value)),
        ));
    };

    if let Some((index, item)) = items.iter().enumerate().find(|(_, item)| !item.is_string()) {
        return Err(ConfigError::invalid_value(
            field,
            format!("entry {index} must be a string, found {}", type_name(item)),
        ));
    }

    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Options after validation: absolute paths and compiled patterns.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub cwd: PathBuf,
    pub output_file: PathBuf,
    pub query: CandidateQuery,
}

/// File-based options discovery
///
/// Looks for an `[unused]` table in `fob.toml`, then a `fob.unused` object
/// in `package.json`.
///
/// # Example
///
/// ```no_run
/// use fob_unused::UnusedConfigDiscovery;
///
/// let options = UnusedConfigDiscovery::new(".").load().unwrap();
/// ```
pub struct UnusedConfigDiscovery {
    root: PathBuf,
}

impl UnusedConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find the raw options value without deserializing it
    #[allow(clippy::disallowed_methods)]
    pub fn find(&self) -> Result<Option<Value>, ConfigError> {
        let toml_path = self.root.join("fob.toml");
        if toml_path.exists() {
            let content = std::fs::read_to_string(&toml_path)?;
            let parsed: toml::Value = toml::from_str(&content).map_err(|e| {
                ConfigError::invalid_value("fob.toml", format!("Invalid TOML syntax: {e}"))
            })?;
            if let Some(section) = parsed.get("unused") {
                let value = serde_json::to_value(section).map_err(|e| {
                    ConfigError::invalid_value("fob.toml", format!("TOML to JSON conversion failed: {e}"))
                })?;
                return Ok(Some(value));
            }
        }

        let pkg_path = self.root.join("package.json");
        if pkg_path.exists() {
            let content = std::fs::read_to_string(&pkg_path)?;
            let parsed: Value = serde_json::from_str(&content).map_err(|e| {
                ConfigError::invalid_value("package.json", format!("Invalid JSON: {e}"))
            })?;
            if let Some(section) = parsed.get("fob").and_then(|fob| fob.get("unused")) {
                if !section.is_null() {
                    return Ok(Some(section.clone()));
                }
            }
        }

        Ok(None)
    }

    /// Load options from the discovered file.
    ///
    /// A relative or missing `cwd` is anchored to the discovery root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no options section exists.
    pub fn load(&self) -> Result<UnusedFilesOptions, ConfigError> {
        let value = self.find()?.ok_or(ConfigError::NotFound)?;
        let mut options = UnusedFilesOptions::from_value(value)?;
        options.cwd = Some(match options.cwd.take() {
            Some(cwd) => self.root.join(cwd),
            None => self.root.clone(),
        });
        Ok(options)
    }
}
