#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Splits `$ref` strings into their document and pointer parts, and walks
//! pointers through a decoded document.

use crate::error::{ResolveError, ResolveResult};
use crate::node::Node;
use percent_encoding::percent_decode_str;
use std::fmt;

/// A parsed `$ref` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    /// The original string.
    pub raw: &'a str,
    /// The document part before `#`. Empty for same-document references.
    pub document: &'a str,
    /// The pointer after `#`.
    pub pointer: Pointer,
}

impl<'a> Reference<'a> {
    /// Parses `<file-part>#<pointer-part>`.
    ///
    /// Without a `#` the whole target document is referenced.
    pub fn parse(raw: &'a str) -> ResolveResult<Self> {
        let (document, fragment) = match raw.split_once('#') {
            Some((doc, frag)) => (doc, frag),
            None => (raw, ""),
        };
        if raw.trim().is_empty() {
            return Err(ResolveError::invalid(raw, "reference is empty"));
        }
        let pointer =
            Pointer::parse(fragment).map_err(|reason| ResolveError::invalid(raw, reason))?;
        Ok(Reference {
            raw,
            document: document.trim(),
            pointer,
        })
    }

    /// Returns `true` for references into the current document.
    pub fn is_local(&self) -> bool {
        self.document.is_empty()
    }
}

/// A decoded JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer {
    segments: Vec<String>,
}

impl Pointer {
    /// Parses a pointer fragment (the text after `#`).
    ///
    /// `""` and `"/"` both address the whole document. Anything else must
    /// start with `/`.
    pub fn parse(fragment: &str) -> Result<Self, String> {
        if fragment.is_empty() || fragment == "/" {
            return Ok(Pointer::default());
        }
        if !fragment.starts_with('/') {
            return Err(format!("pointer '{}' must start with '/'", fragment));
        }
        let segments = fragment[1..]
            .split('/')
            .map(decode_pointer_segment)
            .collect();
        Ok(Pointer { segments })
    }

    /// Decoded segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` when the pointer addresses the whole document.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walks the pointer through `root`.
    ///
    /// `reference` is only used for error reporting.
    pub fn lookup<'n>(&self, root: &'n Node, reference: &str) -> ResolveResult<&'n Node> {
        let mut current = root;
        for (depth, segment) in self.segments.iter().enumerate() {
            current = match current {
                Node::Mapping(map) => map.get(segment),
                Node::Sequence(items) => parse_index(segment).and_then(|i| items.get(i)),
                Node::Scalar(_) => None,
            }
            .ok_or_else(|| {
                let at = Pointer {
                    segments: self.segments[..=depth].to_vec(),
                };
                ResolveError::invalid(reference, format!("pointer segment '{}' not found", at))
            })?;
        }
        Ok(current)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

/// Array indices are plain decimal without leading zeros.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty()
        || !segment.bytes().all(|b| b.is_ascii_digit())
        || (segment.len() > 1 && segment.starts_with('0'))
    {
        return None;
    }
    segment.parse().ok()
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent-encoding).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::node::decode_document;
    use std::path::Path;

    fn doc() -> Node {
        decode_document(
            "components:\n  schemas:\n    User Profile:\n      type: object\n    a/b:\n      type: string\n  list:\n    - first\n    - second\n",
            Path::new("doc.yaml"),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_external_reference() {
        let r = Reference::parse("./schemas/common.yaml#/components/schemas/Error").unwrap();
        assert_eq!(r.document, "./schemas/common.yaml");
        assert_eq!(r.pointer.segments(), ["components", "schemas", "Error"]);
        assert!(!r.is_local());
    }

    #[test]
    fn test_parse_local_and_whole_document() {
        let local = Reference::parse("#/components").unwrap();
        assert!(local.is_local());

        let whole = Reference::parse("common.yaml").unwrap();
        assert!(whole.pointer.is_root());

        let slash = Reference::parse("common.yaml#/").unwrap();
        assert!(slash.pointer.is_root());
    }

    #[test]
    fn test_malformed_pointer_is_invalid() {
        let err = Reference::parse("common.yaml#components").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert_eq!(err.reference(), Some("common.yaml#components"));
    }

    #[test]
    fn test_empty_reference_is_invalid() {
        let err = Reference::parse("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[test]
    fn test_decode_pointer_segment_percent_encoding() {
        let decoded = decode_pointer_segment("User%20Profile~1details");
        assert_eq!(decoded, "User Profile/details");
    }

    #[test]
    fn test_lookup_escaped_and_indexed_segments() {
        let root = doc();
        let p = Pointer::parse("/components/schemas/User%20Profile").unwrap();
        assert_eq!(
            p.lookup(&root, "#").unwrap().get("type").and_then(Node::as_str),
            Some("object")
        );

        let escaped = Pointer::parse("/components/schemas/a~1b/type").unwrap();
        assert_eq!(escaped.lookup(&root, "#").unwrap().as_str(), Some("string"));

        let index = Pointer::parse("/components/list/1").unwrap();
        assert_eq!(index.lookup(&root, "#").unwrap().as_str(), Some("second"));
    }

    #[test]
    fn test_lookup_missing_segment_reports_prefix() {
        let root = doc();
        let p = Pointer::parse("/components/missing/deeper").unwrap();
        let err = p.lookup(&root, "#/components/missing/deeper").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert!(err.to_string().contains("'/components/missing'"));
    }

    #[test]
    fn test_lookup_rejects_bad_indices() {
        let root = doc();
        for bad in ["/components/list/2", "/components/list/01", "/components/list/-"] {
            let p = Pointer::parse(bad).unwrap();
            assert!(p.lookup(&root, bad).is_err(), "{} should not resolve", bad);
        }
    }
}
