//! Rolldown plugin for unused-file detection
//!
//! Hooks [`fob_unused::UnusedFiles`] into the Rolldown pipeline. Every
//! `generate_bundle` call is treated as one finished build: the ids of all
//! rendered modules are handed to the tracker, which writes the report once
//! candidate discovery is done.
//!
//! ## Architecture
//!
//! ```text
//! plugin construction ──▶ glob discovery (background)
//!                                │
//! generate_bundle() ──▶ chunk module ids ──▶ UnusedFiles ──▶ unused report
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_plugin_unused::FobUnusedPlugin;
//! use fob_unused::UnusedFilesOptions;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = UnusedFilesOptions::new()
//!     .exclude("src/**/*.test.ts")
//!     .with_output_file("reports/unused.json");
//! let plugin = Arc::new(FobUnusedPlugin::new(options)?);
//! // Register with your Rolldown bundler configuration
//! # Ok(())
//! # }
//! ```

use fob_unused::{ModuleInfo, UnusedFiles, UnusedFilesOptions};
use rolldown_common::Output;
use rolldown_plugin::{HookGenerateBundleArgs, HookNoopReturn, HookUsage, Plugin, PluginContext};
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Rolldown plugin that reports files matched by the configured patterns
/// but absent from every bundle.
///
/// The plugin never fails a build. Report write errors are logged by the
/// tracker.
#[derive(Debug, Clone)]
pub struct FobUnusedPlugin {
    tracker: Arc<UnusedFiles>,
}

impl FobUnusedPlugin {
    /// Create the plugin and start candidate discovery.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(options: UnusedFilesOptions) -> fob_unused::Result<Self> {
        Ok(Self::from_tracker(Arc::new(UnusedFiles::new(options)?)))
    }

    /// Wrap an existing tracker, e.g. one backed by a custom runtime
    pub fn from_tracker(tracker: Arc<UnusedFiles>) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &Arc<UnusedFiles> {
        &self.tracker
    }
}

/// Describe a Rolldown module id.
///
/// Virtual modules (`\0`-prefixed, `rolldown:` runtime) and relative ids
/// have no file on disk. Query and hash suffixes are dropped.
pub fn module_info(id: &str) -> ModuleInfo {
    if id.starts_with('\0') || id.starts_with("rolldown:") {
        return ModuleInfo::synthetic();
    }

    let path = id.split(['?', '#']).next().unwrap_or(id);
    if Path::new(path).is_absolute() {
        ModuleInfo::file(path)
    } else {
        ModuleInfo::synthetic()
    }
}

/// Collect module descriptors for every rendered module in the bundle
pub fn bundle_modules<'a>(bundle: impl IntoIterator<Item = &'a Output>) -> Vec<ModuleInfo> {
    let mut modules = Vec::new();
    for output in bundle {
        if let Output::Chunk(chunk) = output {
            modules.extend(
                chunk
                    .modules
                    .keys
                    .iter()
                    .map(|module_id| module_info(module_id.as_ref())),
            );
        }
    }
    modules
}

impl Plugin for FobUnusedPlugin {
    fn name(&self) -> Cow<'static, str> {
        "fob-unused".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::GenerateBundle
    }

    /// Treat each generated bundle as one finished build
    fn generate_bundle(
        &self,
        _ctx: &PluginContext,
        args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let modules = bundle_modules(args.bundle.iter());
        let tracker = Arc::clone(&self.tracker);

        async move {
            debug!("[fob-unused] bundle generated with {} modules", modules.len());
            tracker.on_build_finished(modules).await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcstr::ArcStr;
    use fob_unused::runtime::test_utils::MemoryRuntime;
    use fob_unused::{resource_path, BuildOutcome};
    use rolldown_common::{ModuleId, Modules, OutputAsset, OutputChunk, RenderedModule};

    fn chunk(ids: &[&str]) -> Output {
        let keys: Vec<ModuleId> = ids.iter().map(|id| ModuleId::new(*id)).collect();
        let values = ids
            .iter()
            .map(|_| Arc::new(RenderedModule::new(None, Vec::new(), 0)))
            .collect();

        Output::Chunk(Arc::new(OutputChunk {
            name: ArcStr::from("main"),
            filename: ArcStr::from("main.js"),
            code: String::new(),
            map: None,
            sourcemap_filename: None,
            preliminary_filename: "main.js".to_string(),
            is_entry: true,
            is_dynamic_entry: false,
            facade_module_id: None,
            module_ids: keys.clone(),
            imports: Vec::new(),
            dynamic_imports: Vec::new(),
            exports: Vec::new(),
            modules: Modules { keys, values },
        }))
    }

    fn asset() -> Output {
        Output::Asset(Arc::new(OutputAsset {
            names: vec![],
            original_file_names: vec!["/p/src/logo.svg".to_string()],
            filename: ArcStr::from("logo.svg"),
            source: String::from("<svg/>").into(),
        }))
    }

    #[test]
    fn plugin_metadata() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        let tracker = UnusedFiles::with_runtime(
            UnusedFilesOptions::default(),
            Arc::new(MemoryRuntime::new("/p")),
        )
        .unwrap();

        let plugin = FobUnusedPlugin::from_tracker(Arc::new(tracker));
        assert_eq!(plugin.name(), "fob-unused");
    }

    #[test]
    fn absolute_ids_are_files() {
        let info = module_info("/p/src/a.ts");
        assert_eq!(resource_path(&info), Some(Path::new("/p/src/a.ts")));
    }

    #[test]
    fn query_and_hash_suffixes_are_stripped() {
        let info = module_info("/p/src/styles.css?inline");
        assert_eq!(resource_path(&info), Some(Path::new("/p/src/styles.css")));

        let info = module_info("/p/src/icon.svg#symbol");
        assert_eq!(resource_path(&info), Some(Path::new("/p/src/icon.svg")));
    }

    #[test]
    fn virtual_ids_are_synthetic() {
        for id in ["\0commonjsHelpers.js", "rolldown:runtime", "react"] {
            assert_eq!(resource_path(&module_info(id)), None, "{id:?}");
        }
    }

    #[test]
    fn bundle_modules_reads_chunks_and_skips_assets() {
        let bundle = vec![
            chunk(&["/p/src/a.ts", "rolldown:runtime"]),
            asset(),
            chunk(&["/p/src/b.ts"]),
        ];

        let modules = bundle_modules(bundle.iter());
        let paths: Vec<&Path> = modules.iter().filter_map(|m| resource_path(m)).collect();
        assert_eq!(paths, vec![Path::new("/p/src/a.ts"), Path::new("/p/src/b.ts")]);
        assert_eq!(modules.len(), 3);
    }

    #[tokio::test]
    async fn bundled_ids_feed_the_tracker() {
        let runtime = Arc::new(
            MemoryRuntime::new("/p").with_files(["src/a.ts", "src/b.ts", "src/c.ts"]),
        );
        let tracker = Arc::new(
            UnusedFiles::with_runtime(UnusedFilesOptions::default(), runtime.clone()).unwrap(),
        );
        tracker.wait_for_candidates().await.unwrap();
        let plugin = FobUnusedPlugin::from_tracker(Arc::clone(&tracker));

        let bundle = vec![chunk(&["/p/src/a.ts", "\0virtual", "/p/src/c.ts?raw"])];
        let outcome = plugin
            .tracker()
            .on_build_finished(bundle_modules(bundle.iter()))
            .await;

        let BuildOutcome::Reported { report, written } = outcome else {
            panic!("expected a report");
        };
        assert!(written);
        assert_eq!(report.files(), &[Path::new("/p/src/b.ts").to_path_buf()]);
        assert!(runtime.last_write(Path::new("/p/unused")).is_some());
    }
}
