#![deny(missing_docs)]

//! # Generator Trait
//!
//! Defines the interface a code/documentation emitter implements to consume
//! a fully dereferenced document.

use crate::error::AppResult;
use crate::node::Document;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Free-form options handed to a generator (e.g. `fileName=api.yaml`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Key/value options; each generator documents the keys it reads.
    pub options: BTreeMap<String, String>,
}

impl GeneratorConfig {
    /// Builds a config from `(key, value)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            options: pairs.into_iter().collect(),
        }
    }

    /// Returns an option value.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

/// A file produced by a generator, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Relative path of the file.
    pub path: PathBuf,
    /// File contents.
    pub contents: String,
}

/// A backend that emits a source tree from a resolved document.
///
/// Implementors never see `$ref` nodes: the document has already been fully
/// merged. New backends are added by registering them in a
/// [`GeneratorRegistry`](crate::generators::GeneratorRegistry); the resolution
/// core is untouched.
pub trait Generator: Send + Sync {
    /// Emits the files for `document`.
    ///
    /// # Arguments
    ///
    /// * `document` - The dereferenced document.
    /// * `config` - Generator-specific options.
    fn generate(&self, document: &Document, config: &GeneratorConfig)
        -> AppResult<Vec<GeneratedFile>>;
}
