#![deny(missing_docs)]

//! # Generator Registry
//!
//! Maps `(language, framework)` keys to generator implementations.

use crate::error::{AppError, AppResult};
use crate::generators::bundle::{BundleFormat, BundleGenerator};
use crate::generators::traits::{GeneratedFile, Generator};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Lookup key for a generator. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeneratorKey {
    /// Target language (e.g. `rust`, `openapi`).
    pub language: String,
    /// Target framework (e.g. `actix`, `yaml`).
    pub framework: String,
}

impl GeneratorKey {
    /// Creates a normalized key.
    pub fn new(language: &str, framework: &str) -> Self {
        Self {
            language: language.trim().to_ascii_lowercase(),
            framework: framework.trim().to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for GeneratorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.language, self.framework)
    }
}

/// Registered generators.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: BTreeMap<GeneratorKey, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in bundle generators
    /// (`openapi/yaml` and `openapi/json`).
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("openapi", "yaml", BundleGenerator::new(BundleFormat::Yaml));
        registry.register("openapi", "json", BundleGenerator::new(BundleFormat::Json));
        registry
    }

    /// Registers (or replaces) the generator for `(language, framework)`.
    pub fn register<G>(&mut self, language: &str, framework: &str, generator: G)
    where
        G: Generator + 'static,
    {
        self.generators
            .insert(GeneratorKey::new(language, framework), Box::new(generator));
    }

    /// Looks a generator up.
    pub fn get(&self, language: &str, framework: &str) -> AppResult<&dyn Generator> {
        let key = GeneratorKey::new(language, framework);
        self.generators
            .get(&key)
            .map(|g| g.as_ref())
            .ok_or_else(|| {
                AppError::General(format!(
                    "No generator registered for '{}' (available: {})",
                    key,
                    self.keys()
                        .map(|k| k.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &GeneratorKey> {
        self.generators.keys()
    }
}

/// Writes generated files under `output_dir`, creating directories as needed.
///
/// Paths must be relative and must not contain `..`.
pub fn write_generated_files(output_dir: &Path, files: &[GeneratedFile]) -> AppResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let safe = file
            .path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(AppError::General(format!(
                "Generated file path {:?} must stay inside the output directory",
                file.path
            )));
        }
        let target = output_dir.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.contents)?;
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::traits::GeneratorConfig;
    use crate::node::{Document, Node};
    use tempfile::tempdir;

    struct NameEcho;

    impl Generator for NameEcho {
        fn generate(
            &self,
            document: &Document,
            _config: &GeneratorConfig,
        ) -> AppResult<Vec<GeneratedFile>> {
            let title = document.get("title").and_then(Node::as_str).unwrap_or("none");
            Ok(vec![GeneratedFile {
                path: PathBuf::from("src/title.txt"),
                contents: title.to_string(),
            }])
        }
    }

    #[test]
    fn test_builtin_keys() {
        let registry = GeneratorRegistry::with_builtin();
        let keys: Vec<String> = registry.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["openapi/json", "openapi/yaml"]);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut registry = GeneratorRegistry::new();
        registry.register("Rust", "Echo", NameEcho);
        assert!(registry.get("rust", "ECHO").is_ok());
    }

    #[test]
    fn test_unknown_generator_lists_available() {
        let registry = GeneratorRegistry::with_builtin();
        let err = registry.get("rust", "actix").err().unwrap();
        let msg = format!("{}", err);
        assert!(msg.contains("rust/actix"));
        assert!(msg.contains("openapi/yaml"));
    }

    #[test]
    fn test_write_generated_files() {
        let dir = tempdir().unwrap();
        let mut map = crate::node::Mapping::new();
        map.insert("title".into(), Node::string("Pets"));
        let doc = Node::Mapping(map);

        let mut registry = GeneratorRegistry::new();
        registry.register("rust", "echo", NameEcho);
        let files = registry
            .get("rust", "echo")
            .unwrap()
            .generate(&doc, &GeneratorConfig::default())
            .unwrap();
        let written = write_generated_files(dir.path(), &files).unwrap();

        assert_eq!(written, vec![dir.path().join("src/title.txt")]);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "Pets");
    }

    #[test]
    fn test_write_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let files = vec![GeneratedFile {
            path: PathBuf::from("../escape.txt"),
            contents: String::new(),
        }];
        assert!(write_generated_files(dir.path(), &files).is_err());
    }
}
