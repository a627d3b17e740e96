#![deny(missing_docs)]

//! # Bundle Generator
//!
//! Writes the dereferenced document back out as one self-contained YAML or
//! JSON file.

use crate::error::{AppError, AppResult};
use crate::generators::traits::{GeneratedFile, Generator, GeneratorConfig};
use crate::node::Document;
use std::path::{Path, PathBuf};

/// Output syntax of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleFormat {
    /// YAML output.
    Yaml,
    /// Pretty-printed JSON output.
    Json,
}

impl BundleFormat {
    /// Infers the format from an output file extension, if recognizable.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(BundleFormat::Yaml),
            "json" => Some(BundleFormat::Json),
            _ => None,
        }
    }

    /// Default file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            BundleFormat::Yaml => "yaml",
            BundleFormat::Json => "json",
        }
    }
}

/// Serializes a document in the given format.
pub fn render_document(document: &Document, format: BundleFormat) -> AppResult<String> {
    match format {
        BundleFormat::Yaml => serde_yaml::to_string(document)
            .map_err(|e| AppError::General(format!("Failed to serialize YAML: {}", e))),
        BundleFormat::Json => serde_json::to_string_pretty(document)
            .map(|mut out| {
                out.push('\n');
                out
            })
            .map_err(|e| AppError::General(format!("Failed to serialize JSON: {}", e))),
    }
}

/// Emits a single bundled file.
///
/// Options:
/// * `fileName` - output file name (default `openapi.<ext>`).
pub struct BundleGenerator {
    format: BundleFormat,
}

impl BundleGenerator {
    /// Creates a bundle generator for `format`.
    pub fn new(format: BundleFormat) -> Self {
        Self { format }
    }
}

impl Generator for BundleGenerator {
    fn generate(
        &self,
        document: &Document,
        config: &GeneratorConfig,
    ) -> AppResult<Vec<GeneratedFile>> {
        let path = config
            .option("fileName")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("openapi.{}", self.format.extension())));
        Ok(vec![GeneratedFile {
            path,
            contents: render_document(document, self.format)?,
        }])
    }
}
