//! Candidate discovery
//!
//! The candidate set is every file matched by the include patterns minus
//! those matched by the exclude patterns, regardless of whether any build
//! pulls it in. Patterns are anchored to the project root and compiled once,
//! up front, so a malformed pattern fails construction instead of the
//! background discovery.
//!
//! Anchored patterns and walk roots are lexically normalized, so `..` in a
//! pattern yields the same absolute paths a bundler reports for the file.
//! An exclude pattern that matches a directory removes everything below it.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use indexmap::IndexSet;
use path_clean::PathClean;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ConfigError, UnusedError};
use crate::runtime::Runtime;

/// All files that could be used, in discovery order.
pub type CandidateSet = IndexSet<PathBuf>;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Compiled include/exclude patterns anchored to a project root.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    roots: Vec<PathBuf>,
    include: GlobSet,
    exclude: GlobSet,
}

impl CandidateQuery {
    /// Compile patterns relative to `cwd`.
    ///
    /// A leading `./` is ignored; absolute patterns are used as-is.
    pub fn compile(cwd: &Path, include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        let cwd = cwd.clean();
        let cwd = cwd.as_path();
        let mut roots: Vec<PathBuf> = Vec::new();
        let mut include_set = GlobSetBuilder::new();
        for pattern in include {
            include_set.add(build_glob(cwd, pattern)?);

            let root = literal_root(cwd, pattern);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }

        let mut exclude_set = GlobSetBuilder::new();
        for pattern in exclude {
            exclude_set.add(build_glob(cwd, pattern)?);
        }

        Ok(Self {
            roots,
            include: build_set(include_set, include)?,
            exclude: build_set(exclude_set, exclude)?,
        })
    }

    /// Directories (or single files) that must be walked to find matches.
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    /// True if `path` is matched by an include pattern and neither it nor
    /// any of its parent directories is excluded.
    pub fn is_match(&self, path: &Path) -> bool {
        self.include.is_match(path) && !path.ancestors().any(|p| self.excludes(p))
    }

    /// True if `path` itself matches an exclude pattern. Walkers use this to
    /// prune excluded directories.
    pub fn excludes(&self, path: &Path) -> bool {
        self.exclude.is_match(path)
    }
}

fn strip_dot_slash(pattern: &str) -> &str {
    pattern.strip_prefix("./").unwrap_or(pattern)
}

fn anchor(cwd: &Path, pattern: &str) -> String {
    let pattern = strip_dot_slash(pattern);
    let anchored = if Path::new(pattern).is_absolute() {
        PathBuf::from(pattern)
    } else {
        let root = globset::escape(&cwd.to_string_lossy());
        PathBuf::from(format!("{}/{}", root.trim_end_matches('/'), pattern))
    };

    anchored.clean().to_string_lossy().into_owned()
}

fn build_glob(cwd: &Path, pattern: &str) -> Result<globset::Glob, ConfigError> {
    GlobBuilder::new(&anchor(cwd, pattern))
        .literal_separator(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn build_set(builder: GlobSetBuilder, patterns: &[String]) -> Result<GlobSet, ConfigError> {
    builder.build().map_err(|source| ConfigError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}

/// Longest leading run of literal components, joined onto `cwd`.
fn literal_root(cwd: &Path, pattern: &str) -> PathBuf {
    let pattern = Path::new(strip_dot_slash(pattern));
    let mut root = if pattern.is_absolute() {
        PathBuf::new()
    } else {
        cwd.to_path_buf()
    };

    for component in pattern.components() {
        if let Component::Normal(part) = component {
            if part.to_string_lossy().contains(GLOB_META) {
                break;
            }
        }
        root.push(component);
    }

    root.clean()
}

/// Run discovery through the runtime and collect the results in order.
pub async fn discover(
    runtime: Arc<dyn Runtime>,
    query: &CandidateQuery,
) -> Result<CandidateSet, UnusedError> {
    let files = runtime.glob(query).await.map_err(UnusedError::Enumeration)?;
    let candidates: CandidateSet = files.into_iter().collect();
    debug!("[fob-unused] discovered {} candidate files", candidates.len());
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn roots_stop_at_first_glob_component() {
        let cwd = Path::new("/project");
        let query = CandidateQuery::compile(
            cwd,
            &strings(&["src/**", "./lib/*.ts", "assets/{img,css}/**"]),
            &[],
        )
        .unwrap();

        let roots: Vec<&Path> = query.roots().collect();
        assert_eq!(
            roots,
            vec![
                Path::new("/project/src"),
                Path::new("/project/lib"),
                Path::new("/project/assets"),
            ]
        );
    }

    #[test]
    fn duplicate_roots_are_walked_once() {
        let query =
            CandidateQuery::compile(Path::new("/p"), &strings(&["src/**/*.ts", "src/**"]), &[])
                .unwrap();
        assert_eq!(query.roots().count(), 1);
    }

    #[test]
    fn literal_pattern_roots_at_the_file_itself() {
        let query =
            CandidateQuery::compile(Path::new("/p"), &strings(&["index.html"]), &[]).unwrap();
        assert_eq!(query.roots().next(), Some(Path::new("/p/index.html")));
        assert!(query.is_match(Path::new("/p/index.html")));
    }

    #[test]
    fn matching_applies_exclusions() {
        let query = CandidateQuery::compile(
            Path::new("/p"),
            &strings(&["src/**"]),
            &strings(&["src/b.ts"]),
        )
        .unwrap();

        assert!(query.is_match(Path::new("/p/src/a.ts")));
        assert!(!query.is_match(Path::new("/p/src/b.ts")));
        assert!(!query.is_match(Path::new("/p/other/a.ts")));
    }

    #[test]
    fn absolute_patterns_are_not_reanchored() {
        let query =
            CandidateQuery::compile(Path::new("/p"), &strings(&["/elsewhere/**"]), &[]).unwrap();
        assert!(query.is_match(Path::new("/elsewhere/x.ts")));
        assert_eq!(query.roots().next(), Some(Path::new("/elsewhere")));
    }

    #[test]
    fn project_root_metacharacters_are_escaped() {
        let query =
            CandidateQuery::compile(Path::new("/work/[app]"), &strings(&["src/**"]), &[]).unwrap();
        assert!(query.is_match(Path::new("/work/[app]/src/main.ts")));
        assert!(!query.is_match(Path::new("/work/a/src/main.ts")));
    }

    #[test]
    fn excluded_directory_removes_its_subtree() {
        let query = CandidateQuery::compile(
            Path::new("/p"),
            &strings(&["src/**"]),
            &strings(&["src/legacy", "**/node_modules"]),
        )
        .unwrap();

        assert!(query.excludes(Path::new("/p/src/legacy")));
        assert!(!query.is_match(Path::new("/p/src/legacy/old.ts")));
        assert!(!query.is_match(Path::new("/p/src/legacy/deep/older.ts")));
        assert!(!query.is_match(Path::new("/p/src/node_modules/dep/index.js")));
        assert!(query.is_match(Path::new("/p/src/legacy.ts")));
        assert!(query.is_match(Path::new("/p/src/a.ts")));
    }

    #[test]
    fn parent_directory_patterns_are_normalized() {
        let query = CandidateQuery::compile(
            Path::new("/repo/app"),
            &strings(&["../shared/**", "./src/../lib/*.ts"]),
            &strings(&["../shared/generated/**"]),
        )
        .unwrap();

        let roots: Vec<&Path> = query.roots().collect();
        assert_eq!(roots, vec![Path::new("/repo/shared"), Path::new("/repo/app/lib")]);
        assert!(query.is_match(Path::new("/repo/shared/x.ts")));
        assert!(query.is_match(Path::new("/repo/app/lib/util.ts")));
        assert!(!query.is_match(Path::new("/repo/shared/generated/api.ts")));
    }

    #[test]
    fn unclean_project_root_is_normalized() {
        let query =
            CandidateQuery::compile(Path::new("/repo/./app/../web"), &strings(&["src/**"]), &[])
                .unwrap();
        assert_eq!(query.roots().next(), Some(Path::new("/repo/web/src")));
        assert!(query.is_match(Path::new("/repo/web/src/main.ts")));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = CandidateQuery::compile(Path::new("/p"), &strings(&["src/[oops"]), &[])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "src/[oops"));
    }
}
