//! Engine configuration.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Default base name of isolated namespaces.
pub const DEFAULT_NAMESPACE_BASE: &str = "collab";

/// Configuration of a coordinator's runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Base name of the isolated storage prefix and file directory
    pub namespace_base: String,
    /// File namespace active before a run; isolated directories are created below `<files_root>/<namespace_base>/`
    pub files_root: PathBuf,
    /// Storage prefix active before a run
    pub storage_prefix: String,
    /// Modules never discovered, even when enabled
    pub disabled_modules: BTreeSet<String>,
    /// Leave isolated file directories on disk after a run
    pub keep_artifacts: bool,
    /// Install the scoped panic hook for the duration of a run
    pub capture_panics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace_base: DEFAULT_NAMESPACE_BASE.to_string(),
            files_root: std::env::temp_dir().join("concord"),
            storage_prefix: String::new(),
            disabled_modules: BTreeSet::new(),
            keep_artifacts: false,
            capture_panics: true,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace_base(mut self, base: impl Into<String>) -> Self {
        self.namespace_base = base.into();
        self
    }

    pub fn with_files_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.files_root = root.into();
        self
    }

    pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }

    /// Exclude a module from discovery
    pub fn disable_module(mut self, module: impl Into<String>) -> Self {
        self.disabled_modules.insert(module.into());
        self
    }

    pub fn with_keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }

    pub fn with_capture_panics(mut self, capture: bool) -> Self {
        self.capture_panics = capture;
        self
    }
}
