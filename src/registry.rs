// Entity registry for leaf schemas
//
// Each leaf kind is described by a LeafSchema: its ordered known keys, the shape of every field,
// and the processor that materializes it. The EntityRegistry maps kinds to schemas and is the
// factory that turns raw sub-records into child leaves.

use serde_json::Value;
use std::{
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use crate::{
    error::LeafDocError,
    leaf::{FieldValue, Leaf, LeafMap, LeafNode},
    model::{self, LeafKind},
    record::{value_type, RawRecord, NAME_FIELD},
};

/// Processor signature: the leaf being resolved, the field name, and the field's raw value.
pub type FieldProcessorFn = dyn Fn(&LeafNode, &str, &Value) -> Result<FieldValue, LeafDocError>;
pub type FieldProcessor = Rc<FieldProcessorFn>;

/// What a field holds, which also decides its value when the raw record omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A plain value. Missing resolves to `Null`.
    Scalar,
    /// A single child entity. Missing resolves to `Null`.
    Singular,
    /// Children keyed by name. Missing resolves to an empty map.
    Plural,
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldShape::Scalar => "scalar",
            FieldShape::Singular => "singular",
            FieldShape::Plural => "plural",
        };
        write!(f, "{label}")
    }
}

#[derive(Clone)]
pub struct FieldSpec {
    name: String,
    shape: FieldShape,
    processor: Option<FieldProcessor>,
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    pub fn processor(&self) -> Option<&FieldProcessorFn> {
        self.processor.as_deref()
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("processed", &self.processor.is_some())
            .finish()
    }
}

/// Known keys of one leaf kind, in declaration order, with their processors.
#[derive(Clone, Debug)]
pub struct LeafSchema {
    kind: LeafKind,
    fields: Vec<FieldSpec>,
}

impl LeafSchema {
    pub fn new(kind: LeafKind) -> Self {
        LeafSchema {
            kind,
            fields: Vec::new(),
        }
    }

    /// Declare a field resolved by identity passthrough.
    pub fn field(self, name: &str, shape: FieldShape) -> Self {
        self.declare(name, shape, None)
    }

    /// Declare a field resolved by `processor`.
    pub fn processed<F>(self, name: &str, shape: FieldShape, processor: F) -> Self
    where
        F: Fn(&LeafNode, &str, &Value) -> Result<FieldValue, LeafDocError> + 'static,
    {
        self.declare(name, shape, Some(Rc::new(processor)))
    }

    fn declare(mut self, name: &str, shape: FieldShape, processor: Option<FieldProcessor>) -> Self {
        let spec = FieldSpec {
            name: name.to_string(),
            shape,
            processor,
        };
        match self.position(name) {
            Some(idx) => self.fields[idx] = spec,
            None => self.fields.push(spec),
        }
        self
    }

    /// Swap the processor of an already declared field.
    pub fn set_processor<F>(&mut self, name: &str, processor: F) -> Result<(), LeafDocError>
    where
        F: Fn(&LeafNode, &str, &Value) -> Result<FieldValue, LeafDocError> + 'static,
    {
        let idx = self
            .position(name)
            .ok_or_else(|| LeafDocError::UnknownField {
                kind: self.kind,
                field: name.to_string(),
            })?;
        self.fields[idx].processor = Some(Rc::new(processor));
        Ok(())
    }

    pub fn kind(&self) -> LeafKind {
        self.kind
    }

    pub fn known_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field_at(&self, idx: usize) -> &FieldSpec {
        &self.fields[idx]
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Schemas by kind, and the factory for leaves of those kinds.
///
/// Leaves keep an [Rc] to the registry that built them so that their processors can construct
/// children of other kinds.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    schemas: HashMap<LeafKind, Rc<LeafSchema>>,
}

impl EntityRegistry {
    /// Registry without any schema.
    pub fn empty() -> Self {
        EntityRegistry::default()
    }

    /// Registry with the built-in documentation model.
    pub fn create() -> Self {
        let mut registry = EntityRegistry::empty();
        for schema in model::builtin_schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Register a schema under its kind. An existing schema for that kind is overwritten.
    pub fn register(&mut self, schema: LeafSchema) {
        let kind = schema.kind();
        if self.schemas.contains_key(&kind) {
            tracing::info!(
                "[EntityRegistry::register] Overwriting existing schema: {}",
                kind
            );
        }
        self.schemas.insert(kind, Rc::new(schema));
    }

    pub fn schema(&self, kind: LeafKind) -> Option<Rc<LeafSchema>> {
        self.schemas.get(&kind).cloned()
    }

    /// Mutable access to a registered schema, cloning it if leaves already share it.
    pub fn schema_mut(&mut self, kind: LeafKind) -> Option<&mut LeafSchema> {
        self.schemas.get_mut(&kind).map(Rc::make_mut)
    }

    pub fn kinds(&self) -> Vec<LeafKind> {
        let mut kinds: Vec<LeafKind> = self.schemas.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Construct one leaf of `kind` from `record`. Nothing is resolved yet.
    pub fn build(
        self: &Rc<Self>,
        kind: LeafKind,
        record: &RawRecord,
        parent: Weak<LeafNode>,
    ) -> Result<Leaf, LeafDocError> {
        let schema = self
            .schema(kind)
            .ok_or(LeafDocError::UnregisteredKind(kind))?;
        Ok(LeafNode::new(self.clone(), schema, record, parent))
    }

    /// Build the single child stored in `parent.field`.
    pub fn build_one(
        self: &Rc<Self>,
        kind: LeafKind,
        value: &Value,
        parent: &LeafNode,
        field: &str,
    ) -> Result<Leaf, LeafDocError> {
        match value {
            Value::Object(map) => {
                let record = RawRecord::from(map.clone());
                self.build(kind, &record, parent.downgrade())
            }
            other => Err(LeafDocError::MalformedSubRecord {
                kind: parent.kind(),
                field: field.to_string(),
                index: 0,
                reason: format!("expected a record, found {}", value_type(other)),
            }),
        }
    }

    /// Build the children stored in `parent.field`, keyed by each sub-record's `name`.
    ///
    /// Sub-records are visited in input order. When two share a name the later one replaces the
    /// earlier one. Any entry that is not a record, or whose `name` is missing, null or structured,
    /// fails the whole field. See [RawRecord::name_key] for how scalar names become keys.
    pub fn build_many(
        self: &Rc<Self>,
        kind: LeafKind,
        value: &Value,
        parent: &LeafNode,
        field: &str,
    ) -> Result<LeafMap, LeafDocError> {
        let items: Vec<&Value> = match value {
            Value::Array(list) => list.iter().collect(),
            Value::Object(map) => map.values().collect(),
            other => {
                return Err(LeafDocError::MalformedSubRecord {
                    kind: parent.kind(),
                    field: field.to_string(),
                    index: 0,
                    reason: format!("expected a list of records, found {}", value_type(other)),
                })
            }
        };

        let mut children = LeafMap::new();
        for (index, item) in items.into_iter().enumerate() {
            let malformed = |reason: String| LeafDocError::MalformedSubRecord {
                kind: parent.kind(),
                field: field.to_string(),
                index,
                reason,
            };
            let record = match item {
                Value::Object(map) => RawRecord::from(map.clone()),
                other => {
                    return Err(malformed(format!(
                        "expected a record, found {}",
                        value_type(other)
                    )))
                }
            };
            let Some(name) = record.name_key() else {
                return Err(malformed(match record.get(NAME_FIELD) {
                    None | Some(Value::Null) => "missing `name`".to_string(),
                    Some(other) => {
                        format!("`name` must be a scalar, found {}", value_type(other))
                    }
                }));
            };
            let child = self.build(kind, &record, parent.downgrade())?;
            if children.insert(name.clone(), child).is_some() {
                tracing::trace!(
                    "[EntityRegistry::build_many] {}.{}: '{}' replaced by a later entry",
                    parent.kind(),
                    field,
                    name
                );
            }
        }
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_log::test;

    fn widget_registry() -> Rc<EntityRegistry> {
        let mut registry = EntityRegistry::empty();
        registry.register(
            LeafSchema::new(LeafKind::Function)
                .field("name", FieldShape::Scalar)
                .processed("arguments", FieldShape::Plural, |leaf, field, value| {
                    Ok(FieldValue::Map(leaf.registry().build_many(
                        LeafKind::Argument,
                        value,
                        leaf,
                        field,
                    )?))
                }),
        );
        registry.register(
            LeafSchema::new(LeafKind::Argument)
                .field("name", FieldShape::Scalar)
                .field("v", FieldShape::Scalar),
        );
        Rc::new(registry)
    }

    #[test]
    fn test_builtin_kinds_registered() {
        let registry = EntityRegistry::create();
        assert_eq!(registry.kinds().len(), 7);
        for kind in LeafKind::ALL {
            assert!(registry.schema(*kind).is_some(), "missing schema for {kind}");
        }
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = EntityRegistry::empty();
        registry.register(LeafSchema::new(LeafKind::Hook).field("name", FieldShape::Scalar));
        registry.register(
            LeafSchema::new(LeafKind::Hook)
                .field("name", FieldShape::Scalar)
                .field("type", FieldShape::Scalar),
        );
        let schema = registry.schema(LeafKind::Hook).unwrap();
        assert_eq!(schema.known_keys().collect::<Vec<_>>(), vec!["name", "type"]);
    }

    #[test]
    fn test_redeclared_field_keeps_position() {
        let schema = LeafSchema::new(LeafKind::Argument)
            .field("name", FieldShape::Scalar)
            .field("type", FieldShape::Scalar)
            .field("name", FieldShape::Singular);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.field_at(0).shape(), FieldShape::Singular);
    }

    #[test]
    fn test_set_processor_rejects_undeclared_field() {
        let mut schema = LeafSchema::new(LeafKind::Argument).field("name", FieldShape::Scalar);
        let err = schema
            .set_processor("type", |_, _, _| Ok(FieldValue::Null))
            .unwrap_err();
        assert!(matches!(err, LeafDocError::UnknownField { .. }));
    }

    #[test]
    fn test_build_unregistered_kind() {
        let registry = Rc::new(EntityRegistry::empty());
        let err = registry
            .build(LeafKind::Usage, &RawRecord::new(), Weak::new())
            .unwrap_err();
        assert_eq!(err, LeafDocError::UnregisteredKind(LeafKind::Usage));
    }

    #[test]
    fn test_last_write_wins() {
        let registry = widget_registry();
        let record = RawRecord::from_value(json!({
            "name": "f",
            "arguments": [{"name": "a", "v": 1}, {"name": "b", "v": 2}, {"name": "a", "v": 3}]
        }))
        .unwrap();
        let root = registry.build(LeafKind::Function, &record, Weak::new()).unwrap();
        let arguments = root.get("arguments").unwrap().as_map().unwrap();
        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        let a = arguments.get("a").unwrap();
        assert_eq!(a.get("v").unwrap().as_int(), Some(3));
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let registry = widget_registry();
        let record = RawRecord::from_value(json!({
            "arguments": [{"name": "a"}, {"v": 2}]
        }))
        .unwrap();
        let root = registry.build(LeafKind::Function, &record, Weak::new()).unwrap();
        let err = root.get("arguments").unwrap_err();
        match err {
            LeafDocError::MalformedSubRecord { field, index, .. } => {
                assert_eq!(field, "arguments");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!root.is_resolved("arguments"));
    }

    #[test]
    fn test_non_record_entries_are_malformed() {
        let registry = widget_registry();
        let record = RawRecord::from_value(json!({"arguments": ["x"]})).unwrap();
        let root = registry.build(LeafKind::Function, &record, Weak::new()).unwrap();
        assert!(matches!(
            root.get("arguments"),
            Err(LeafDocError::MalformedSubRecord { index: 0, .. })
        ));

        let record = RawRecord::from_value(json!({"arguments": "x"})).unwrap();
        let root = registry.build(LeafKind::Function, &record, Weak::new()).unwrap();
        assert!(matches!(
            root.get("arguments"),
            Err(LeafDocError::MalformedSubRecord { .. })
        ));
    }

    #[test]
    fn test_scalar_names_become_keys() {
        let registry = widget_registry();
        let record = RawRecord::from_value(json!({
            "arguments": [{"name": 5, "v": 1}, {"name": "init"}, {"name": 2.5}, {"name": true}]
        }))
        .unwrap();
        let root = registry.build(LeafKind::Function, &record, Weak::new()).unwrap();
        let arguments = root.get("arguments").unwrap().as_map().unwrap();
        assert_eq!(
            arguments.keys().collect::<Vec<_>>(),
            vec!["5", "init", "2.5", "1"]
        );
        assert_eq!(arguments.get("5").unwrap().get("v").unwrap().as_int(), Some(1));
    }

    #[test]
    fn test_structured_or_null_name_is_malformed() {
        let registry = widget_registry();
        for (name, reason) in [
            (json!(null), "missing `name`"),
            (json!(["a"]), "`name` must be a scalar, found list"),
            (json!({"first": "a"}), "`name` must be a scalar, found record"),
        ] {
            let record =
                RawRecord::from_value(json!({"arguments": [{"name": "ok"}, {"name": name}]}))
                    .unwrap();
            let root = registry.build(LeafKind::Function, &record, Weak::new()).unwrap();
            match root.get("arguments") {
                Err(LeafDocError::MalformedSubRecord {
                    index, reason: r, ..
                }) => {
                    assert_eq!(index, 1);
                    assert_eq!(r, reason);
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn test_keyed_object_iterates_values() {
        let registry = widget_registry();
        let record = RawRecord::from_value(json!({
            "arguments": {"0": {"name": "x"}, "1": {"name": "y"}}
        }))
        .unwrap();
        let root = registry.build(LeafKind::Function, &record, Weak::new()).unwrap();
        let arguments = root.get("arguments").unwrap().as_map().unwrap();
        assert_eq!(arguments.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }
}
