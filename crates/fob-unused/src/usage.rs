//! Used-file collection
//!
//! A build reports the modules it resolved. Most carry a resource path
//! directly; concatenated modules wrap a root module that does. Anything
//! else (runtime helpers, virtual modules) has no file on disk and is
//! skipped without complaint.

use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// A module as seen by the host build pipeline.
pub trait ResolvedModule {
    /// Path of the file this module was loaded from, if any
    fn resource(&self) -> Option<&Path>;

    /// Root module of a concatenated module
    fn root_module(&self) -> Option<&dyn ResolvedModule> {
        None
    }
}

impl<T: ResolvedModule + ?Sized> ResolvedModule for &T {
    fn resource(&self) -> Option<&Path> {
        (**self).resource()
    }

    fn root_module(&self) -> Option<&dyn ResolvedModule> {
        (**self).root_module()
    }
}

/// Extract the on-disk path of a resolved module.
///
/// Tries the module's own resource, then its root module's resource. Only
/// one level of wrapping is inspected.
pub fn resource_path<M: ResolvedModule + ?Sized>(module: &M) -> Option<&Path> {
    non_empty(module.resource())
        .or_else(|| non_empty(module.root_module().and_then(|root| root.resource())))
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|path| !path.as_os_str().is_empty())
}

/// Plain module descriptor for hosts that do not have their own module type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    resource: Option<PathBuf>,
    root_module: Option<Box<ModuleInfo>>,
}

impl ModuleInfo {
    /// A module loaded directly from `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            resource: Some(path.into()),
            root_module: None,
        }
    }

    /// A concatenated module whose root module was loaded from a file
    pub fn concatenated(root: ModuleInfo) -> Self {
        Self {
            resource: None,
            root_module: Some(Box::new(root)),
        }
    }

    /// A module with no file behind it
    pub fn synthetic() -> Self {
        Self::default()
    }
}

impl ResolvedModule for ModuleInfo {
    fn resource(&self) -> Option<&Path> {
        self.resource.as_deref()
    }

    fn root_module(&self) -> Option<&dyn ResolvedModule> {
        self.root_module
            .as_deref()
            .map(|root| root as &dyn ResolvedModule)
    }
}

/// Files the build actually pulled in. Only ever grows.
#[derive(Debug, Clone, Default)]
pub struct UsedSet {
    files: FxHashSet<PathBuf>,
}

impl UsedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a used file. Returns false if it was already recorded.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.files.insert(path.into())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Record every module of a finished build that has a resource path.
    ///
    /// Returns how many modules contributed a path.
    pub fn collect<I>(&mut self, modules: I) -> usize
    where
        I: IntoIterator,
        I::Item: ResolvedModule,
    {
        let mut seen = 0;
        for module in modules {
            if let Some(path) = resource_path(&module) {
                self.insert(path);
                seen += 1;
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_resource_is_extracted() {
        let module = ModuleInfo::file("/p/src/a.ts");
        assert_eq!(resource_path(&module), Some(Path::new("/p/src/a.ts")));
    }

    #[test]
    fn concatenated_module_uses_root_resource() {
        let module = ModuleInfo::concatenated(ModuleInfo::file("/p/src/entry.ts"));
        assert_eq!(resource_path(&module), Some(Path::new("/p/src/entry.ts")));
    }

    #[test]
    fn synthetic_modules_have_no_path() {
        assert_eq!(resource_path(&ModuleInfo::synthetic()), None);
        assert_eq!(
            resource_path(&ModuleInfo::concatenated(ModuleInfo::synthetic())),
            None
        );
    }

    #[test]
    fn only_one_level_of_wrapping_is_inspected() {
        let module = ModuleInfo::concatenated(ModuleInfo::concatenated(ModuleInfo::file(
            "/p/src/deep.ts",
        )));
        assert_eq!(resource_path(&module), None);
    }

    #[test]
    fn empty_resource_is_skipped() {
        assert_eq!(resource_path(&ModuleInfo::file("")), None);
    }

    #[test]
    fn empty_resource_falls_back_to_root_module() {
        let module = ModuleInfo {
            resource: Some(PathBuf::new()),
            root_module: Some(Box::new(ModuleInfo::file("/p/src/entry.ts"))),
        };
        assert_eq!(resource_path(&module), Some(Path::new("/p/src/entry.ts")));
    }

    #[test]
    fn insertion_is_idempotent() {
        let mut used = UsedSet::new();
        assert!(used.insert("/p/src/a.ts"));
        assert!(!used.insert("/p/src/a.ts"));
        assert_eq!(used.len(), 1);
        assert!(used.contains(Path::new("/p/src/a.ts")));
    }

    #[test]
    fn collect_skips_modules_without_paths() {
        let modules = vec![
            ModuleInfo::file("/p/src/a.ts"),
            ModuleInfo::synthetic(),
            ModuleInfo::concatenated(ModuleInfo::file("/p/src/b.ts")),
            ModuleInfo::file("/p/src/a.ts"),
        ];

        let mut used = UsedSet::new();
        assert_eq!(used.collect(&modules), 3);
        assert_eq!(used.len(), 2);
    }
}
