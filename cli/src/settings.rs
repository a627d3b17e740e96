#![deny(missing_docs)]

//! # Resolver Settings
//!
//! Arguments shared by every command that reads a document, and their
//! mapping onto `ResolverConfig`.
//!
//! Precedence for search paths: `--search-path` flags, then the config file,
//! then `OASREF_SEARCH_PATHS`.

use crate::error::CliResult;
use oasref_core::ResolverConfig;
use std::path::PathBuf;

/// Input and resolution arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Root OpenAPI document (YAML or JSON).
    pub input: PathBuf,

    /// Fallback directory searched for referenced files. Repeat to add more;
    /// directories are searched in the order given.
    #[clap(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,

    /// Resolver config file (YAML/JSON with `searchPaths`, `maxDepth`, ...).
    #[clap(long, env = "OASREF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum nesting depth of references.
    #[clap(long)]
    pub max_depth: Option<usize>,

    /// Maximum size in bytes of any referenced file.
    #[clap(long)]
    pub max_file_size: Option<u64>,

    /// Reject absolute references that point outside the permitted directories.
    #[clap(long)]
    pub confine_absolute_paths: bool,
}

impl ResolveArgs {
    /// Builds the resolver configuration from flags, config file and environment.
    pub fn resolver_config(&self) -> CliResult<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::from_file(path)?,
            None => ResolverConfig::default(),
        };

        if !self.search_paths.is_empty() {
            config.search_paths = self.search_paths.clone();
        }
        let mut config = config.or_env();
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(size) = self.max_file_size {
            config.max_file_size = size;
        }
        if self.confine_absolute_paths {
            config.confine_absolute_paths = true;
        }

        tracing::debug!(?config, "resolver configuration");
        Ok(config)
    }
}
