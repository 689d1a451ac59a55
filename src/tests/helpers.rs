//! Shared test utilities for leaf and model testing

use crate::{
    leaf::{FieldValue, LeafNode},
    model::LeafKind,
    record::RawRecord,
    registry::EntityRegistry,
};
use serde_json::Value;
use std::{cell::Cell, rc::Rc};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Helper function to create a record from a JSON literal
pub fn record(value: Value) -> RawRecord {
    RawRecord::from_value(value).unwrap()
}

/// The function record used across the leaf tests
pub fn sample_function() -> RawRecord {
    record(serde_json::json!({
        "name": "foo",
        "namespace": "Bar",
        "line": 10,
        "end_line": 20,
        "arguments": [{"name": "x"}, {"name": "y"}],
        "hooks": [{"name": "init"}],
        "doc": {"description": "desc"}
    }))
}

/// Built-in registry whose `function.name` processor counts its invocations.
///
/// Returns the registry and the shared counter.
pub fn counting_registry() -> (Rc<EntityRegistry>, Rc<Cell<usize>>) {
    init_logging();

    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut registry = EntityRegistry::create();
    let schema = registry.schema_mut(LeafKind::Function).unwrap();
    schema
        .set_processor("name", move |_leaf: &LeafNode, _field: &str, value: &Value| {
            counter.set(counter.get() + 1);
            Ok(FieldValue::passthrough(value))
        })
        .unwrap();
    (Rc::new(registry), calls)
}

/// Built-in registry, shared
pub fn builtin_registry() -> Rc<EntityRegistry> {
    init_logging();
    Rc::new(EntityRegistry::create())
}
