#![deny(missing_docs)]

//! # Reference Dereferencer
//!
//! Decodes a document and replaces every `$ref` node with a deep copy of its
//! target, following references into other files through the
//! [`PathResolver`].
//!
//! All bookkeeping for one call (active `(file, pointer)` pairs, nesting
//! depth, decoded files, finished targets) lives in a `VisitState` that is
//! created at the start of `parse`/`parse_content` and threaded down the
//! recursion by `&mut`. Nothing is stored on the `Dereferencer`, so a single
//! instance can serve concurrent callers.

use crate::config::ResolverConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::node::{decode_document, Document, Mapping, Node, Scalar};
use crate::oas::reference::{Pointer, Reference};
use crate::oas::resolver::{canonical_or_absolute, PathResolver};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The key under which a reference target is tracked.
type VisitKey = (PathBuf, Pointer);

/// Per-call resolution state.
#[derive(Default)]
struct VisitState {
    /// Targets currently being expanded, i.e. the active call chain.
    active: HashSet<VisitKey>,
    /// Number of references currently being followed.
    depth: usize,
    /// Decoded files, keyed by canonical path.
    documents: HashMap<PathBuf, Rc<Node>>,
    /// Fully expanded targets.
    finished: HashMap<VisitKey, Node>,
    /// Roots permitted for the whole call (the top-level document's directory).
    roots: Vec<PathBuf>,
}

/// The document a node was read from.
#[derive(Clone)]
struct Frame {
    document: Rc<Node>,
    path: PathBuf,
    base_dir: Option<PathBuf>,
}

impl Frame {
    fn new(document: Rc<Node>, path: PathBuf) -> Self {
        let base_dir = path.parent().map(Path::to_path_buf);
        Self {
            document,
            path,
            base_dir,
        }
    }
}

/// Produces fully merged documents from multi-file sources.
#[derive(Debug, Clone)]
pub struct Dereferencer {
    resolver: PathResolver,
}

impl Dereferencer {
    /// Creates a dereferencer with its own resolver.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_resolver(PathResolver::new(config))
    }

    /// Creates a dereferencer around an existing resolver.
    pub fn with_resolver(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// The path resolver used for external references.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Reads, decodes and dereferences the document at `path`.
    ///
    /// # Errors
    ///
    /// Any `ResolveError`: the top-level path is checked with the same
    /// extension/existence/size policy as references, then decode and
    /// resolution failures propagate unchanged.
    pub fn parse(&self, path: &Path) -> ResolveResult<Document> {
        let canonical = self.resolver.validate_file(path)?;
        let mut state = VisitState::default();
        let document = load(&canonical, &mut state)?;
        self.dereference_root(Frame::new(document, canonical), state)
    }

    /// Decodes and dereferences `text` as if it had been read from `virtual_path`.
    ///
    /// The virtual path picks the syntax (by extension) and anchors relative
    /// references (its directory becomes the base directory).
    pub fn parse_content(&self, text: &str, virtual_path: &Path) -> ResolveResult<Document> {
        let identity = canonical_or_absolute(virtual_path);
        let document = Rc::new(decode_document(text, virtual_path)?);
        let mut state = VisitState::default();
        state.documents.insert(identity.clone(), Rc::clone(&document));
        self.dereference_root(Frame::new(document, identity), state)
    }

    fn dereference_root(&self, frame: Frame, mut state: VisitState) -> ResolveResult<Document> {
        state.roots = frame.base_dir.iter().cloned().collect();
        let key = (frame.path.clone(), Pointer::default());
        state.active.insert(key);
        tracing::debug!(document = ?frame.path, "dereferencing document");
        let document = Rc::clone(&frame.document);
        self.walk(&document, &frame, &mut state)
    }

    fn walk(&self, node: &Node, frame: &Frame, state: &mut VisitState) -> ResolveResult<Node> {
        match node {
            Node::Mapping(map) => match map.get("$ref") {
                Some(Node::Scalar(Scalar::String(reference))) => {
                    let target = self.follow(reference, frame, state)?;
                    if map.len() == 1 {
                        return Ok(target);
                    }
                    self.overlay_siblings(target, map, frame, state)
                }
                _ => {
                    let mut out = Mapping::with_capacity(map.len());
                    for (key, value) in map {
                        out.insert(key.clone(), self.walk(value, frame, state)?);
                    }
                    Ok(Node::Mapping(out))
                }
            },
            Node::Sequence(items) => items
                .iter()
                .map(|item| self.walk(item, frame, state))
                .collect::<ResolveResult<Vec<_>>>()
                .map(Node::Sequence),
            Node::Scalar(_) => Ok(node.clone()),
        }
    }

    /// Keys next to a `$ref` (e.g. `description`) override the target's.
    /// They are dropped when the target is not a mapping.
    fn overlay_siblings(
        &self,
        target: Node,
        map: &Mapping,
        frame: &Frame,
        state: &mut VisitState,
    ) -> ResolveResult<Node> {
        match target {
            Node::Mapping(mut resolved) => {
                for (key, value) in map.iter().filter(|(key, _)| key.as_str() != "$ref") {
                    resolved.insert(key.clone(), self.walk(value, frame, state)?);
                }
                Ok(Node::Mapping(resolved))
            }
            other => Ok(other),
        }
    }

    fn follow(&self, reference: &str, frame: &Frame, state: &mut VisitState) -> ResolveResult<Node> {
        let parsed = Reference::parse(reference)?;
        let limit = self.resolver.config().max_depth;

        state.depth += 1;
        let result = if state.depth > limit {
            Err(ResolveError::MaxDepthExceeded {
                reference: reference.to_string(),
                limit,
            })
        } else {
            self.follow_parsed(&parsed, frame, state)
        };
        state.depth -= 1;
        result
    }

    fn follow_parsed(
        &self,
        reference: &Reference<'_>,
        frame: &Frame,
        state: &mut VisitState,
    ) -> ResolveResult<Node> {
        let path = if reference.is_local() {
            frame.path.clone()
        } else {
            self.resolver.resolve_with_roots(
                reference.document,
                frame.base_dir.as_deref(),
                &state.roots,
            )?
        };

        let key = (path, reference.pointer.clone());
        if let Some(done) = state.finished.get(&key) {
            return Ok(done.clone());
        }
        if state.active.contains(&key) {
            return Err(ResolveError::CircularReference {
                reference: reference.raw.to_string(),
                path: key.0,
                pointer: key.1.to_string(),
            });
        }

        tracing::trace!(reference = reference.raw, depth = state.depth, "following reference");
        state.active.insert(key.clone());
        let result = self.expand_target(reference, frame, &key.0, state);
        state.active.remove(&key);

        let node = result?;
        state.finished.insert(key, node.clone());
        Ok(node)
    }

    fn expand_target(
        &self,
        reference: &Reference<'_>,
        frame: &Frame,
        path: &Path,
        state: &mut VisitState,
    ) -> ResolveResult<Node> {
        let target_frame = if reference.is_local() {
            frame.clone()
        } else {
            Frame::new(load(path, state)?, path.to_path_buf())
        };
        let target = reference
            .pointer
            .lookup(&target_frame.document, reference.raw)?;
        self.walk(target, &target_frame, state)
    }
}

fn load(path: &Path, state: &mut VisitState) -> ResolveResult<Rc<Node>> {
    if let Some(document) = state.documents.get(path) {
        return Ok(Rc::clone(document));
    }
    let text = fs::read_to_string(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = Rc::new(decode_document(&text, path)?);
    state
        .documents
        .insert(path.to_path_buf(), Rc::clone(&document));
    Ok(document)
}
