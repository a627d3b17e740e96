//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace, and the
//! typed `ResolveError` raised by reference resolution.

use derive_more::{Display, From};
use std::path::PathBuf;

/// The category of a resolution failure.
///
/// Callers match on this instead of the full `ResolveError` when they only
/// need to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Empty input, disallowed extension, malformed or dangling pointer.
    InvalidReference,
    /// A candidate escapes every permitted root.
    PathTraversal,
    /// No candidate exists in the base directory or any search directory.
    ReferenceNotFound,
    /// The candidate exceeds the size ceiling.
    FileTooLarge,
    /// A `(file, pointer)` pair reappeared in the active call chain.
    CircularReference,
    /// Nested references exceeded the depth ceiling.
    MaxDepthExceeded,
    /// The raw text is not valid YAML/JSON.
    DecodeError,
    /// A filesystem read failed after the file was validated.
    Io,
}

/// A failure raised while resolving or dereferencing a `$ref`.
///
/// Every variant carries the offending reference string (or the document
/// path for decode failures) so callers can build diagnostics without
/// re-running resolution.
#[derive(Debug, Display)]
pub enum ResolveError {
    /// The reference is syntactically unusable or points at nothing.
    #[display("Invalid reference '{reference}': {reason}")]
    InvalidReference {
        /// The raw reference string.
        reference: String,
        /// Why the reference was rejected.
        reason: String,
    },

    /// The reference resolves outside every permitted root.
    #[display("Reference '{reference}' escapes the permitted directories (resolved to {attempted:?})")]
    PathTraversal {
        /// The raw reference string.
        reference: String,
        /// The path the reference resolved to.
        attempted: PathBuf,
    },

    /// No file matched in the base directory or any search directory.
    #[display("Reference '{reference}' not found (base directory {base_dir:?})")]
    ReferenceNotFound {
        /// The raw reference string.
        reference: String,
        /// The base directory in effect, if any.
        base_dir: Option<PathBuf>,
    },

    /// The referenced file is larger than the configured ceiling.
    #[display("Reference '{reference}' points to {path:?} which is {size} bytes (limit {limit})")]
    FileTooLarge {
        /// The raw reference string.
        reference: String,
        /// Canonical path of the oversized file.
        path: PathBuf,
        /// Actual file size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },

    /// The reference re-enters a `(file, pointer)` pair that is still being resolved.
    #[display("Circular reference '{reference}' ({path:?}#{pointer})")]
    CircularReference {
        /// The raw reference string.
        reference: String,
        /// The document that closes the cycle.
        path: PathBuf,
        /// The pointer within that document.
        pointer: String,
    },

    /// The reference chain is deeper than the configured ceiling.
    #[display("Reference '{reference}' exceeds the maximum nesting depth of {limit}")]
    MaxDepthExceeded {
        /// The raw reference string.
        reference: String,
        /// Configured ceiling.
        limit: usize,
    },

    /// The document text could not be decoded.
    #[display("Failed to decode {path:?}{}: {message}", location_suffix(*line, *column))]
    Decode {
        /// Path (real or virtual) of the document.
        path: PathBuf,
        /// 1-based line of the syntax error, when known.
        line: Option<usize>,
        /// 1-based column of the syntax error, when known.
        column: Option<usize>,
        /// Decoder message.
        message: String,
    },

    /// Reading a validated file failed.
    #[display("Failed to read {path:?}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

fn location_suffix(line: Option<usize>, column: Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {} column {}", l, c),
        (Some(l), None) => format!(" at line {}", l),
        _ => String::new(),
    }
}

impl ResolveError {
    /// Returns the failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::InvalidReference { .. } => ErrorKind::InvalidReference,
            ResolveError::PathTraversal { .. } => ErrorKind::PathTraversal,
            ResolveError::ReferenceNotFound { .. } => ErrorKind::ReferenceNotFound,
            ResolveError::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            ResolveError::CircularReference { .. } => ErrorKind::CircularReference,
            ResolveError::MaxDepthExceeded { .. } => ErrorKind::MaxDepthExceeded,
            ResolveError::Decode { .. } => ErrorKind::DecodeError,
            ResolveError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Returns the reference string the failure is about, if it has one.
    pub fn reference(&self) -> Option<&str> {
        match self {
            ResolveError::InvalidReference { reference, .. }
            | ResolveError::PathTraversal { reference, .. }
            | ResolveError::ReferenceNotFound { reference, .. }
            | ResolveError::FileTooLarge { reference, .. }
            | ResolveError::CircularReference { reference, .. }
            | ResolveError::MaxDepthExceeded { reference, .. } => Some(reference),
            ResolveError::Decode { .. } | ResolveError::Io { .. } => None,
        }
    }

    pub(crate) fn invalid(reference: &str, reason: impl Into<String>) -> Self {
        ResolveError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// Result alias for the resolution layer.
pub type ResolveResult<T> = Result<T, ResolveError>;
