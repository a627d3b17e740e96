#![deny(missing_docs)]

//! # Generators
//!
//! The seam between the resolution core and the emitters that consume its
//! output.
//!
//! - **traits**: Defines `Generator` for implementing new backends.
//! - **registry**: Looks generators up by `(language, framework)`.
//! - **bundle**: The built-in emitter writing the merged document back out.

pub mod bundle;
pub mod registry;
pub mod traits;

pub use bundle::{render_document, BundleFormat, BundleGenerator};
pub use registry::{write_generated_files, GeneratorKey, GeneratorRegistry};
pub use traits::{GeneratedFile, Generator, GeneratorConfig};
