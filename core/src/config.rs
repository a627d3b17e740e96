//! # Resolver Configuration
//!
//! The one configuration object the resolution core accepts. It is built once
//! by the caller (from flags, a config file, or the environment) and passed
//! in; nothing inside the core reads process state.

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the default search directories, in the
/// platform's path-list syntax (`:`-separated on Unix, `;` on Windows).
pub const SEARCH_PATHS_ENV: &str = "OASREF_SEARCH_PATHS";

/// Default ceiling on referenced file size: 100 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Default ceiling on nested reference depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Settings for the path resolver and dereferencer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Fallback directories searched, in order, when a relative reference is
    /// not found next to the referencing document.
    pub search_paths: Vec<PathBuf>,
    /// Maximum number of nested references followed in one chain.
    pub max_depth: usize,
    /// Maximum size in bytes of any referenced file.
    pub max_file_size: u64,
    /// Apply the root-containment check to absolute references as well.
    ///
    /// Off by default: absolute references are treated as operator-trusted
    /// input and may point anywhere on disk.
    pub confine_absolute_paths: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            confine_absolute_paths: false,
        }
    }
}

impl ResolverConfig {
    /// Creates a config with explicit search paths and default limits.
    pub fn with_search_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Creates a config whose search paths come from `OASREF_SEARCH_PATHS`.
    pub fn from_env() -> Self {
        Self::default().or_env()
    }

    /// Fills empty search paths from the environment default.
    pub fn or_env(mut self) -> Self {
        if self.search_paths.is_empty() {
            self.search_paths = Self::env_search_paths();
        }
        self
    }

    /// Loads a YAML or JSON config file.
    ///
    /// Relative `searchPaths` entries are taken relative to the config
    /// file's directory.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::General(format!("Failed to read config {:?}: {}", path, e))
        })?;
        let mut config: ResolverConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::General(format!("Failed to parse config {:?}: {}", path, e))
        })?;
        if let Some(dir) = path.parent() {
            config.search_paths = config
                .search_paths
                .into_iter()
                .map(|p| if p.is_relative() { dir.join(p) } else { p })
                .collect();
        }
        Ok(config)
    }

    fn env_search_paths() -> Vec<PathBuf> {
        std::env::var_os(SEARCH_PATHS_ENV)
            .map(|raw| {
                std::env::split_paths(&raw)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
