//! [DocumentGraph] is the composition root of the documentation model.
//!
//! A graph owns its root [Leaf] and the [EntityRegistry] that builds every node below it. Building
//! a graph constructs the root only; consumers walk it by calling [LeafNode::get] (or
//! [DocumentGraph::lookup]) and each step materializes just the fields it touches.
//!
//! ```rust
//! use leafdoc::{graph::DocumentGraph, model::LeafKind};
//!
//! let graph = DocumentGraph::from_json_str(
//!     LeafKind::Function,
//!     r#"{"name": "foo", "arguments": [{"name": "x", "type": "int"}]}"#,
//! )?;
//! assert_eq!(graph.lookup("name")?.as_str(), Some("foo"));
//! assert_eq!(graph.lookup("arguments.x.type")?.as_str(), Some("int"));
//! # Ok::<(), leafdoc::LeafDocError>(())
//! ```

use std::{fs::read_to_string, path::Path, rc::Rc, rc::Weak};

use crate::{
    error::LeafDocError,
    leaf::{FieldValue, Leaf, LeafNode},
    model::LeafKind,
    record::RawRecord,
    registry::EntityRegistry,
};

/// Separator between path segments in [DocumentGraph::lookup].
pub const PATH_SEPARATOR: char = '.';

#[derive(Debug)]
pub struct DocumentGraph {
    registry: Rc<EntityRegistry>,
    root: Leaf,
}

impl DocumentGraph {
    /// Build a graph rooted at a `kind` leaf using the built-in registry.
    pub fn build(kind: LeafKind, record: RawRecord) -> Result<Self, LeafDocError> {
        DocumentGraph::build_with(Rc::new(EntityRegistry::create()), kind, record)
    }

    /// Build a graph rooted at a `kind` leaf using `registry`.
    pub fn build_with(
        registry: Rc<EntityRegistry>,
        kind: LeafKind,
        record: RawRecord,
    ) -> Result<Self, LeafDocError> {
        tracing::debug!(
            "[DocumentGraph::build] root {} with {} raw fields",
            kind,
            record.len()
        );
        let root = registry.build(kind, &record, Weak::new())?;
        Ok(DocumentGraph { registry, root })
    }

    pub fn function(record: RawRecord) -> Result<Self, LeafDocError> {
        DocumentGraph::build(LeafKind::Function, record)
    }

    pub fn usage(record: RawRecord) -> Result<Self, LeafDocError> {
        DocumentGraph::build(LeafKind::Usage, record)
    }

    pub fn from_json_str(kind: LeafKind, content: &str) -> Result<Self, LeafDocError> {
        DocumentGraph::build(kind, RawRecord::from_json_str(content)?)
    }

    pub fn from_toml_str(kind: LeafKind, content: &str) -> Result<Self, LeafDocError> {
        DocumentGraph::build(kind, RawRecord::from_toml_str(content)?)
    }

    /// Read a root record from a `.json` or `.toml` file.
    pub fn from_path<P: AsRef<Path>>(
        registry: Rc<EntityRegistry>,
        kind: LeafKind,
        path: P,
    ) -> Result<Self, LeafDocError> {
        let record = read_record(path)?;
        DocumentGraph::build_with(registry, kind, record)
    }

    pub fn root(&self) -> &Leaf {
        &self.root
    }

    pub fn kind(&self) -> LeafKind {
        self.root.kind()
    }

    pub fn registry(&self) -> &Rc<EntityRegistry> {
        &self.registry
    }

    /// Walk a dotted path from the root.
    ///
    /// A segment names a field while the walk is on a leaf, and a child's key while it is on a
    /// map, so `arguments.x.type` reads field `arguments`, entry `x`, then that argument's `type`.
    /// An empty path, or one with an empty segment (`a..b`, `.a`, `a.`), is rejected.
    pub fn lookup(&self, path: &str) -> Result<&FieldValue, LeafDocError> {
        lookup(&self.root, path)
    }
}

/// [DocumentGraph::lookup] starting from any leaf.
pub fn lookup<'a>(leaf: &'a LeafNode, path: &str) -> Result<&'a FieldValue, LeafDocError> {
    if let Some(position) = path.split(PATH_SEPARATOR).position(str::is_empty) {
        return Err(LeafDocError::NotFound(format!(
            "empty segment {position} in path '{path}'"
        )));
    }
    let mut segments = path.split(PATH_SEPARATOR);
    let first = segments
        .next()
        .ok_or_else(|| LeafDocError::NotFound(format!("empty path '{path}'")))?;
    let mut current = leaf.get(first)?;
    while let Some(segment) = segments.next() {
        let next_leaf: &LeafNode = match current {
            FieldValue::Leaf(child) => {
                current = child.get(segment)?;
                continue;
            }
            FieldValue::Map(map) => map.get(segment).map(|entry| &**entry).ok_or_else(|| {
                LeafDocError::NotFound(format!("no entry '{segment}' in path '{path}'"))
            })?,
            other => {
                return Err(LeafDocError::NotFound(format!(
                    "cannot descend into '{other}' at '{segment}' in path '{path}'"
                )))
            }
        };
        current = match segments.next() {
            Some(field) => next_leaf.get(field)?,
            None => {
                return Err(LeafDocError::NotFound(format!(
                    "path '{path}' ends on an entry, not a field"
                )))
            }
        };
    }
    Ok(current)
}

/// Parse a raw record from a file, by extension.
pub fn read_record<P: AsRef<Path>>(path: P) -> Result<RawRecord, LeafDocError> {
    let path = path.as_ref();
    tracing::debug!("Reading {:?}", path);
    let content = read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => RawRecord::from_json_str(&content),
        Some("toml") => RawRecord::from_toml_str(&content),
        _ => Err(LeafDocError::Serialization(format!(
            "unsupported record file: {}",
            path.display()
        ))),
    }
}
