#![deny(missing_docs)]

//! # OpenAPI Reference Resolution
//!
//! - **reference**: `$ref` and JSON Pointer parsing/lookup.
//! - **resolver**: Maps reference file parts to safe, existing paths.
//! - **deref**: Walks a document and merges every reference target in place.

pub mod deref;
pub mod reference;
pub mod resolver;

pub use deref::Dereferencer;
pub use reference::{Pointer, Reference};
pub use resolver::{PathResolver, ALLOWED_EXTENSIONS};
