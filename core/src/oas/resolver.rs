#![deny(missing_docs)]

//! # Path Resolver
//!
//! Turns the file part of a `$ref` into one validated, canonical, existing
//! path.
//!
//! Relative references are resolved against the referencing document's
//! directory first, then searched for in the configured search directories.
//! Whatever is found must stay inside a permitted root (the base directory,
//! any extra root supplied by the caller, or a search directory), must carry
//! a `.yaml`/`.yml`/`.json` extension, and must not exceed the size ceiling.
//!
//! Absolute references skip the base-directory and search logic and, unless
//! `confine_absolute_paths` is set, the root-containment check as well. They
//! are treated as operator-trusted input. Callers that pass reference strings
//! from untrusted sources must enable the flag or filter absolute paths
//! themselves.

use crate::config::ResolverConfig;
use crate::error::{ResolveError, ResolveResult};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use url::Url;
use walkdir::WalkDir;

/// Extensions a referenced file may carry (ASCII case-insensitive).
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Resolves reference file parts to canonical paths.
///
/// Holds only immutable configuration, so one instance can be shared freely
/// between threads.
#[derive(Debug, Clone)]
pub struct PathResolver {
    config: ResolverConfig,
}

impl PathResolver {
    /// Creates a resolver.
    ///
    /// Search directories are canonicalized on every resolution, so one that
    /// is missing now is skipped and one created later is picked up.
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// The configuration this resolver was built with.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves `raw` (the file part of a reference) relative to `base_dir`.
    ///
    /// # Errors
    ///
    /// * `InvalidReference` - empty input, disallowed extension, remote URL,
    ///   or a relative path with no base directory.
    /// * `PathTraversal` - the path leaves every permitted root.
    /// * `ReferenceNotFound` - nothing matched.
    /// * `FileTooLarge` - the file exceeds `max_file_size`.
    pub fn resolve(&self, raw: &str, base_dir: Option<&Path>) -> ResolveResult<PathBuf> {
        self.resolve_with_roots(raw, base_dir, &[])
    }

    /// Like [`PathResolver::resolve`], with additional permitted roots.
    ///
    /// The dereferencer passes the top-level document's directory here so
    /// nested documents may reach siblings elsewhere in the same tree.
    pub fn resolve_with_roots(
        &self,
        raw: &str,
        base_dir: Option<&Path>,
        extra_roots: &[PathBuf],
    ) -> ResolveResult<PathBuf> {
        if raw.is_empty() {
            return Err(ResolveError::invalid(raw, "reference path is empty"));
        }

        let sanitized = sanitize(raw)?;
        check_extension(raw, &sanitized)?;

        if sanitized.is_absolute() {
            let canonical = canonical_existing(raw, &sanitized, base_dir)?;
            if self.config.confine_absolute_paths {
                let base = base_dir.map(canonical_or_absolute);
                let roots = self.permitted_roots(base.as_deref(), extra_roots);
                ensure_contained(raw, &canonical, &roots)?;
            }
            tracing::debug!(reference = raw, path = ?canonical, "resolved absolute reference");
            return self.check_size(raw, canonical);
        }

        let base_dir = base_dir.ok_or_else(|| {
            ResolveError::invalid(raw, "relative reference without a base directory")
        })?;
        let base = canonical_or_absolute(base_dir);
        let roots = self.permitted_roots(Some(&base), extra_roots);

        let joined = base.join(&sanitized);
        let lexical = normalize_lexically(&joined);
        if !roots.iter().any(|root| lexical.starts_with(root)) {
            return Err(ResolveError::PathTraversal {
                reference: raw.to_string(),
                attempted: lexical,
            });
        }

        let candidate = if joined.exists() {
            joined
        } else {
            self.search(&sanitized).ok_or_else(|| ResolveError::ReferenceNotFound {
                reference: raw.to_string(),
                base_dir: Some(base_dir.to_path_buf()),
            })?
        };

        let canonical = canonical_existing(raw, &candidate, Some(base_dir))?;
        ensure_contained(raw, &canonical, &roots)?;
        tracing::debug!(reference = raw, path = ?canonical, "resolved relative reference");
        self.check_size(raw, canonical)
    }

    /// Validates an operator-supplied document path (the top-level input).
    ///
    /// The same extension, existence and size policy applies; containment
    /// does not, as with any absolute reference.
    pub fn validate_file(&self, path: &Path) -> ResolveResult<PathBuf> {
        let label = path.display().to_string();
        check_extension(&label, path)?;
        let absolute = canonical_or_absolute(path);
        let canonical = canonical_existing(&label, &absolute, None)?;
        self.check_size(&label, canonical)
    }

    fn permitted_roots(&self, base: Option<&Path>, extra_roots: &[PathBuf]) -> Vec<PathBuf> {
        base.map(Path::to_path_buf)
            .into_iter()
            .chain(extra_roots.iter().map(|r| canonical_or_absolute(r)))
            .chain(self.config.search_paths.iter().map(|dir| canonical_or_absolute(dir)))
            .collect()
    }

    /// Searches each search directory in order: first `dir/<path>`, then a
    /// pre-order walk (entries sorted by name) for a file with the same name.
    fn search(&self, relative: &Path) -> Option<PathBuf> {
        let file_name = relative.file_name()?;
        self.config
            .search_paths
            .iter()
            .find_map(|dir| search_root(dir, relative, file_name))
    }

    fn check_size(&self, raw: &str, canonical: PathBuf) -> ResolveResult<PathBuf> {
        let metadata = fs::metadata(&canonical).map_err(|source| ResolveError::Io {
            path: canonical.clone(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(ResolveError::ReferenceNotFound {
                reference: raw.to_string(),
                base_dir: canonical.parent().map(Path::to_path_buf),
            });
        }
        if metadata.len() > self.config.max_file_size {
            return Err(ResolveError::FileTooLarge {
                reference: raw.to_string(),
                path: canonical,
                size: metadata.len(),
                limit: self.config.max_file_size,
            });
        }
        Ok(canonical)
    }
}

fn search_root(dir: &Path, relative: &Path, file_name: &OsStr) -> Option<PathBuf> {
    if !dir.is_dir() {
        tracing::trace!(dir = ?dir, "skipping unreadable search directory");
        return None;
    }

    let direct = dir.join(relative);
    if direct.is_file() {
        return Some(direct);
    }

    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_name() == file_name && entry.path().is_file())
        .map(|entry| entry.into_path())
}

/// Strips null bytes, maps `file://` URLs to paths and normalizes separators.
fn sanitize(raw: &str) -> ResolveResult<PathBuf> {
    let cleaned: String = raw.chars().filter(|c| *c != '\0').collect();

    if cleaned.starts_with("file:") {
        let url = Url::parse(&cleaned)
            .map_err(|e| ResolveError::invalid(raw, format!("malformed file URL: {}", e)))?;
        return url
            .to_file_path()
            .map_err(|_| ResolveError::invalid(raw, "file URL does not name a local path"));
    }
    if cleaned.contains("://") {
        return Err(ResolveError::invalid(
            raw,
            "remote references are not supported",
        ));
    }

    let normalized = cleaned.replace('\\', "/");
    if normalized.is_empty() {
        return Err(ResolveError::invalid(raw, "reference path is empty"));
    }
    Ok(PathBuf::from(normalized))
}

fn check_extension(raw: &str, path: &Path) -> ResolveResult<()> {
    let allowed = path
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false);
    if allowed {
        Ok(())
    } else {
        Err(ResolveError::invalid(
            raw,
            format!(
                "extension must be one of {}",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        ))
    }
}

fn canonical_existing(raw: &str, path: &Path, base_dir: Option<&Path>) -> ResolveResult<PathBuf> {
    fs::canonicalize(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ResolveError::ReferenceNotFound {
            reference: raw.to_string(),
            base_dir: base_dir.map(Path::to_path_buf),
        },
        _ => ResolveError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn ensure_contained(raw: &str, canonical: &Path, roots: &[PathBuf]) -> ResolveResult<()> {
    if roots.iter().any(|root| canonical.starts_with(root)) {
        Ok(())
    } else {
        Err(ResolveError::PathTraversal {
            reference: raw.to_string(),
            attempted: canonical.to_path_buf(),
        })
    }
}

/// Canonical form when the path exists, otherwise an absolute lexical form.
pub(crate) fn canonical_or_absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .map(|p| normalize_lexically(&p))
        .unwrap_or_else(|_| normalize_lexically(path))
}

/// Resolves `.` and `..` without touching the filesystem. `..` never climbs
/// above the root.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_resolves_sibling_file() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("test.yaml"), "a: 1\n");

        let resolver = PathResolver::new(ResolverConfig::default());
        let resolved = resolver.resolve("test.yaml", Some(dir.path())).unwrap();
        assert_eq!(resolved, fs::canonicalize(dir.path().join("test.yaml")).unwrap());
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("secret.txt"), "x");

        let resolver = PathResolver::new(ResolverConfig::default());
        for raw in ["secret.txt", "missing.exe", "noext", "archive.yaml.bak"] {
            let err = resolver.resolve(raw, Some(dir.path())).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidReference, "{}", raw);
        }
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("UPPER.YAML"), "a: 1\n");

        let resolver = PathResolver::new(ResolverConfig::default());
        assert!(resolver.resolve("UPPER.YAML", Some(dir.path())).is_ok());
    }

    #[test]
    fn test_empty_reference_is_invalid() {
        let resolver = PathResolver::new(ResolverConfig::default());
        let err = resolver.resolve("", Some(Path::new("."))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[test]
    fn test_remote_reference_is_invalid() {
        let resolver = PathResolver::new(ResolverConfig::default());
        let err = resolver
            .resolve("https://example.com/openapi.yaml", Some(Path::new(".")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[test]
    fn test_file_url_is_accepted() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("doc.json");
        write(&file, "{}");

        let url = Url::from_file_path(&file).unwrap();
        let resolver = PathResolver::new(ResolverConfig::default());
        let resolved = resolver.resolve(url.as_str(), None).unwrap();
        assert_eq!(resolved, fs::canonicalize(&file).unwrap());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(ResolverConfig::default());
        let err = resolver.resolve("nope.yaml", Some(dir.path())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    }

    #[test]
    fn test_file_too_large() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("big.json"), &" ".repeat(64));

        let config = ResolverConfig {
            max_file_size: 16,
            ..ResolverConfig::default()
        };
        let err = PathResolver::new(config)
            .resolve("big.json", Some(dir.path()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileTooLarge);
        match err {
            ResolveError::FileTooLarge { size, limit, .. } => {
                assert_eq!(size, 64);
                assert_eq!(limit, 16);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_directory_named_like_a_document_is_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("folder.yaml")).unwrap();

        let resolver = PathResolver::new(ResolverConfig::default());
        let err = resolver.resolve("folder.yaml", Some(dir.path())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    }

    #[test]
    fn test_confined_absolute_path_outside_roots_is_traversal() {
        let outside = tempdir().unwrap();
        let file = outside.path().join("outside.yaml");
        write(&file, "a: 1\n");
        let base = tempdir().unwrap();

        let config = ResolverConfig {
            confine_absolute_paths: true,
            ..ResolverConfig::default()
        };
        let err = PathResolver::new(config)
            .resolve(file.to_str().unwrap(), Some(base.path()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathTraversal);
    }

    #[test]
    fn test_search_prefers_direct_subpath() {
        let base = tempdir().unwrap();
        let search = tempdir().unwrap();
        write(&search.path().join("a/user.yaml"), "from: a\n");
        write(&search.path().join("schemas/user.yaml"), "from: schemas\n");

        let resolver = PathResolver::new(ResolverConfig::with_search_paths([search.path()]));
        let resolved = resolver.resolve("schemas/user.yaml", Some(base.path())).unwrap();
        assert_eq!(
            resolved,
            fs::canonicalize(search.path().join("schemas/user.yaml")).unwrap()
        );
    }

    #[test]
    fn test_search_walks_in_name_order() {
        let base = tempdir().unwrap();
        let search = tempdir().unwrap();
        write(&search.path().join("b/common.yaml"), "from: b\n");
        write(&search.path().join("a/nested/common.yaml"), "from: a\n");

        let resolver = PathResolver::new(ResolverConfig::with_search_paths([search.path()]));
        let resolved = resolver.resolve("common.yaml", Some(base.path())).unwrap();
        assert_eq!(
            resolved,
            fs::canonicalize(search.path().join("a/nested/common.yaml")).unwrap()
        );
    }

    #[test]
    fn test_missing_search_directory_is_skipped() {
        let base = tempdir().unwrap();
        let search = tempdir().unwrap();
        write(&search.path().join("common.yaml"), "a: 1\n");

        let resolver = PathResolver::new(ResolverConfig::with_search_paths([
            base.path().join("does-not-exist"),
            search.path().to_path_buf(),
        ]));
        assert!(resolver.resolve("common.yaml", Some(base.path())).is_ok());
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d.yaml")),
            PathBuf::from("/a/c/d.yaml")
        );
        assert_eq!(
            normalize_lexically(Path::new("/a/../../../etc/x.yaml")),
            PathBuf::from("/etc/x.yaml")
        );
    }
}
