#![deny(missing_docs)]

//! # oasref Core
//!
//! Resolves `$ref` references across multi-file OpenAPI documents and
//! produces one fully merged document for generators to consume.

/// Shared error types.
pub mod error;

/// Resolver configuration.
pub mod config;

/// Generic document tree.
pub mod node;

/// Reference parsing, path resolution and dereferencing.
pub mod oas;

/// Generator Interfaces.
pub mod generators;

use std::path::Path;

pub use config::ResolverConfig;
pub use error::{AppError, AppResult, ErrorKind, ResolveError, ResolveResult};
pub use generators::{Generator, GeneratorConfig, GeneratorRegistry};
pub use node::{Document, Mapping, Node, Number, Scalar, Timestamp};
pub use oas::{Dereferencer, PathResolver, Pointer, Reference};

/// Dereferences the document at `path` with `config`.
///
/// Convenience for one-shot callers; long-lived callers should keep a
/// [`Dereferencer`] around instead.
pub fn bundle_file(path: &Path, config: ResolverConfig) -> ResolveResult<Document> {
    Dereferencer::new(config).parse(path)
}
