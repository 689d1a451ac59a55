//! [LeafNode] is the base of every typed node in the documentation graph.
//!
//! A leaf is built from a [RawRecord] and an optional parent. Construction only filters the record
//! down to the kind's known keys; every field is resolved on first [LeafNode::get] and cached in a
//! write-once cell, so deep or self-referential documentation trees are only walked as far as a
//! consumer actually asks.
//!
//! Leaves are reference counted ([Leaf] is an [Rc]). Parents hold their children through their own
//! resolved fields; children hold their parent through a [Weak] link that is only ever used for
//! upward navigation.

use once_cell::unsync::OnceCell;
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use crate::{
    error::LeafDocError,
    model::LeafKind,
    record::{RawRecord, NAME_FIELD},
    registry::{EntityRegistry, FieldShape, LeafSchema},
};

/// Shared handle to a leaf entity.
pub type Leaf = Rc<LeafNode>;

/// A materialized field value.
#[derive(Clone, Debug)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// Structured input passed through untouched.
    Raw(Value),
    Leaf(Leaf),
    Map(LeafMap),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            FieldValue::Raw(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            FieldValue::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&LeafMap> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Identity passthrough for declared fields without a processor.
    pub fn passthrough(value: &Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::String(s) => FieldValue::Str(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Raw(value.clone()),
            },
            other => FieldValue::Raw(other.clone()),
        }
    }

    /// The value a field resolves to when the raw record does not supply it.
    pub fn default_for(shape: FieldShape) -> FieldValue {
        match shape {
            FieldShape::Plural => FieldValue::Map(LeafMap::new()),
            FieldShape::Scalar | FieldShape::Singular => FieldValue::Null,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Str(s) => write!(f, "{s}"),
            FieldValue::Raw(v) => write!(f, "{v}"),
            FieldValue::Leaf(leaf) => write!(f, "{leaf}"),
            FieldValue::Map(map) => {
                write!(f, "[{}]", map.keys().collect::<Vec<_>>().join(", "))
            }
        }
    }
}

/// Children keyed by name, iterated in insertion order.
///
/// Re-inserting an existing name replaces the entry in place: the later value wins and the key
/// keeps the position of its first appearance.
#[derive(Clone, Debug, Default)]
pub struct LeafMap {
    entries: Vec<(String, Leaf)>,
    index: HashMap<String, usize>,
}

impl LeafMap {
    pub fn new() -> Self {
        LeafMap::default()
    }

    /// Insert `leaf` under `name`, returning the replaced entry if the name was taken.
    pub fn insert(&mut self, name: String, leaf: Leaf) -> Option<Leaf> {
        match self.index.get(&name) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx].1, leaf)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, leaf));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Leaf> {
        self.index.get(name).map(|&idx| &self.entries[idx].1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Leaf> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Leaf)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A node of the documentation graph. See the module documentation.
pub struct LeafNode {
    schema: Rc<LeafSchema>,
    registry: Rc<EntityRegistry>,
    raw: RawRecord,
    resolved: Vec<OnceCell<FieldValue>>,
    parent: Weak<LeafNode>,
    this: Weak<LeafNode>,
}

impl LeafNode {
    /// Construct a leaf without resolving any of its fields. Keys of `record` that the schema does
    /// not declare are dropped.
    pub(crate) fn new(
        registry: Rc<EntityRegistry>,
        schema: Rc<LeafSchema>,
        record: &RawRecord,
        parent: Weak<LeafNode>,
    ) -> Leaf {
        let ignored = record.unknown_keys(schema.known_keys());
        if !ignored.is_empty() {
            tracing::trace!(
                "[LeafNode::new] {} ignores unknown keys: {:?}",
                schema.kind(),
                ignored
            );
        }
        let raw = record.restrict(schema.known_keys());
        let resolved = (0..schema.len()).map(|_| OnceCell::new()).collect();
        Rc::new_cyclic(|this| LeafNode {
            schema,
            registry,
            raw,
            resolved,
            parent,
            this: this.clone(),
        })
    }

    pub fn kind(&self) -> LeafKind {
        self.schema.kind()
    }

    pub fn schema(&self) -> &LeafSchema {
        &self.schema
    }

    pub fn registry(&self) -> &Rc<EntityRegistry> {
        &self.registry
    }

    /// The known-key subset of the input record.
    pub fn raw(&self) -> &RawRecord {
        &self.raw
    }

    pub fn known_keys(&self) -> impl Iterator<Item = &str> {
        self.schema.known_keys()
    }

    /// True iff `field` is a known key of this kind, whether or not it has been resolved.
    pub fn has(&self, field: &str) -> bool {
        self.schema.position(field).is_some()
    }

    pub fn is_resolved(&self, field: &str) -> bool {
        self.schema
            .position(field)
            .map(|idx| self.resolved[idx].get().is_some())
            .unwrap_or(false)
    }

    /// Resolve `field`, or return its cached value.
    ///
    /// Fails with [LeafDocError::UnknownField] when `field` is not declared for this kind. A failed
    /// resolution leaves the field unresolved.
    pub fn get(&self, field: &str) -> Result<&FieldValue, LeafDocError> {
        let idx = self
            .schema
            .position(field)
            .ok_or_else(|| LeafDocError::UnknownField {
                kind: self.kind(),
                field: field.to_string(),
            })?;
        self.resolved[idx].get_or_try_init(|| self.resolve(idx))
    }

    fn resolve(&self, idx: usize) -> Result<FieldValue, LeafDocError> {
        let spec = self.schema.field_at(idx);
        tracing::trace!("[LeafNode::resolve] {}.{}", self.kind(), spec.name());
        match self.raw.get(spec.name()) {
            None | Some(Value::Null) => Ok(FieldValue::default_for(spec.shape())),
            Some(value) => match spec.processor() {
                Some(processor) => processor(self, spec.name(), value),
                None => Ok(FieldValue::passthrough(value)),
            },
        }
    }

    /// The resolved `name` field, when this kind declares one and it holds a string.
    pub fn name(&self) -> Option<&str> {
        if !self.has(NAME_FIELD) {
            return None;
        }
        self.get(NAME_FIELD).ok().and_then(FieldValue::as_str)
    }

    /// The enclosing entity, or `None` for a root (or once the graph holding the parent is gone).
    pub fn parent(&self) -> Option<Leaf> {
        self.parent.upgrade()
    }

    /// Nearest enclosing entity of `kind`.
    pub fn ancestor(&self, kind: LeafKind) -> Option<Leaf> {
        let mut current = self.parent();
        while let Some(node) = current {
            if node.kind() == kind {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// Weak handle to this node, handed to children as their parent link.
    pub(crate) fn downgrade(&self) -> Weak<LeafNode> {
        self.this.clone()
    }
}

impl fmt::Debug for LeafNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafNode")
            .field("kind", &self.kind())
            .field("raw", &self.raw)
            .field(
                "resolved",
                &self
                    .schema
                    .known_keys()
                    .zip(self.resolved.iter())
                    .filter(|(_, cell)| cell.get().is_some())
                    .map(|(k, _)| k)
                    .collect::<Vec<_>>(),
            )
            .field("has_parent", &(self.parent.strong_count() > 0))
            .finish()
    }
}

impl fmt::Display for LeafNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw.name() {
            Some(name) => write!(f, "<{} {}>", self.kind(), name),
            None => write!(f, "<{}>", self.kind()),
        }
    }
}
