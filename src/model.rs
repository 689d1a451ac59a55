//! The documentation model: leaf kinds, their known keys, and the field processors that turn raw
//! extractor output into typed values.
//!
//! | kind       | known keys                                                                  |
//! |------------|-----------------------------------------------------------------------------|
//! | `function` | name, namespace, aliases, line, end_line, arguments, doc, hooks, uses       |
//! | `method`   | the `function` keys plus final, abstract, static, visibility                |
//! | `usage`    | functions, methods                                                          |
//! | `argument` | name, default, type                                                         |
//! | `docblock` | description, long_description, tags                                        |
//! | `hook`     | name, line, end_line, type, arguments, doc                                  |
//! | `alias`    | name, namespace, line                                                       |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

use crate::{
    error::LeafDocError,
    leaf::{FieldValue, LeafNode},
    record::value_type,
    registry::{FieldShape, LeafSchema},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafKind {
    Function,
    Method,
    Usage,
    Argument,
    DocBlock,
    Hook,
    Alias,
}

impl LeafKind {
    pub const ALL: &'static [LeafKind] = &[
        LeafKind::Function,
        LeafKind::Method,
        LeafKind::Usage,
        LeafKind::Argument,
        LeafKind::DocBlock,
        LeafKind::Hook,
        LeafKind::Alias,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeafKind::Function => "function",
            LeafKind::Method => "method",
            LeafKind::Usage => "usage",
            LeafKind::Argument => "argument",
            LeafKind::DocBlock => "docblock",
            LeafKind::Hook => "hook",
            LeafKind::Alias => "alias",
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LeafKind {
    type Err = LeafDocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeafKind::ALL
            .iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| LeafDocError::Serialization(format!("unknown leaf kind '{s}'")))
    }
}

/// Schemas for every built-in kind.
pub fn builtin_schemas() -> Vec<LeafSchema> {
    vec![
        function_schema(),
        method_schema(),
        usage_schema(),
        argument_schema(),
        docblock_schema(),
        hook_schema(),
        alias_schema(),
    ]
}

pub fn function_schema() -> LeafSchema {
    LeafSchema::new(LeafKind::Function)
        .field("name", FieldShape::Scalar)
        .field("namespace", FieldShape::Scalar)
        .processed("aliases", FieldShape::Plural, children(LeafKind::Alias))
        .processed("line", FieldShape::Scalar, coerce_int)
        .processed("end_line", FieldShape::Scalar, coerce_int)
        .processed("arguments", FieldShape::Plural, children(LeafKind::Argument))
        .processed("doc", FieldShape::Singular, child(LeafKind::DocBlock))
        .processed("hooks", FieldShape::Plural, children(LeafKind::Hook))
        .processed("uses", FieldShape::Singular, uses)
}

pub fn method_schema() -> LeafSchema {
    LeafSchema::new(LeafKind::Method)
        .field("name", FieldShape::Scalar)
        .field("namespace", FieldShape::Scalar)
        .processed("aliases", FieldShape::Plural, children(LeafKind::Alias))
        .processed("line", FieldShape::Scalar, coerce_int)
        .processed("end_line", FieldShape::Scalar, coerce_int)
        .processed("final", FieldShape::Scalar, coerce_bool)
        .processed("abstract", FieldShape::Scalar, coerce_bool)
        .processed("static", FieldShape::Scalar, coerce_bool)
        .field("visibility", FieldShape::Scalar)
        .processed("arguments", FieldShape::Plural, children(LeafKind::Argument))
        .processed("doc", FieldShape::Singular, child(LeafKind::DocBlock))
        .processed("hooks", FieldShape::Plural, children(LeafKind::Hook))
        .processed("uses", FieldShape::Singular, uses)
}

pub fn usage_schema() -> LeafSchema {
    LeafSchema::new(LeafKind::Usage)
        .processed("functions", FieldShape::Plural, children(LeafKind::Function))
        .processed("methods", FieldShape::Plural, children(LeafKind::Method))
}

pub fn argument_schema() -> LeafSchema {
    LeafSchema::new(LeafKind::Argument)
        .field("name", FieldShape::Scalar)
        .field("default", FieldShape::Scalar)
        .field("type", FieldShape::Scalar)
}

pub fn docblock_schema() -> LeafSchema {
    LeafSchema::new(LeafKind::DocBlock)
        .field("description", FieldShape::Scalar)
        .field("long_description", FieldShape::Scalar)
        // Tags repeat (several @param), so they are not keyed by name.
        .field("tags", FieldShape::Scalar)
}

pub fn hook_schema() -> LeafSchema {
    LeafSchema::new(LeafKind::Hook)
        .field("name", FieldShape::Scalar)
        .processed("line", FieldShape::Scalar, coerce_int)
        .processed("end_line", FieldShape::Scalar, coerce_int)
        .field("type", FieldShape::Scalar)
        .field("arguments", FieldShape::Scalar)
        .processed("doc", FieldShape::Singular, child(LeafKind::DocBlock))
}

pub fn alias_schema() -> LeafSchema {
    LeafSchema::new(LeafKind::Alias)
        .field("name", FieldShape::Scalar)
        .field("namespace", FieldShape::Scalar)
        .processed("line", FieldShape::Scalar, coerce_int)
}

/// Processor building a map of `kind` children from a list of sub-records.
pub fn children(
    kind: LeafKind,
) -> impl Fn(&LeafNode, &str, &Value) -> Result<FieldValue, LeafDocError> + 'static {
    move |leaf, field, value| {
        Ok(FieldValue::Map(
            leaf.registry().build_many(kind, value, leaf, field)?,
        ))
    }
}

/// Processor building a single `kind` child from a sub-record.
pub fn child(
    kind: LeafKind,
) -> impl Fn(&LeafNode, &str, &Value) -> Result<FieldValue, LeafDocError> + 'static {
    move |leaf, field, value| {
        Ok(FieldValue::Leaf(
            leaf.registry().build_one(kind, value, leaf, field)?,
        ))
    }
}

/// `uses` holds one usage record, or a list of usage records keyed by name.
pub fn uses(leaf: &LeafNode, field: &str, value: &Value) -> Result<FieldValue, LeafDocError> {
    let registry = leaf.registry();
    match value {
        Value::Array(_) => Ok(FieldValue::Map(registry.build_many(
            LeafKind::Usage,
            value,
            leaf,
            field,
        )?)),
        _ => Ok(FieldValue::Leaf(registry.build_one(
            LeafKind::Usage,
            value,
            leaf,
            field,
        )?)),
    }
}

/// Line numbers and other integers: numbers, or strings holding one.
pub fn coerce_int(
    leaf: &LeafNode,
    field: &str,
    value: &Value,
) -> Result<FieldValue, LeafDocError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(FieldValue::Int)
        .ok_or_else(|| invalid(leaf, field, value, "integer"))
}

/// Flags: booleans, 0/1, or their string spellings.
pub fn coerce_bool(
    leaf: &LeafNode,
    field: &str,
    value: &Value,
) -> Result<FieldValue, LeafDocError> {
    parse_bool(value)
        .map(FieldValue::Bool)
        .ok_or_else(|| invalid(leaf, field, value, "boolean"))
}

/// The flag spellings accepted by [coerce_bool].
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn invalid(leaf: &LeafNode, field: &str, value: &Value, expected: &str) -> LeafDocError {
    LeafDocError::InvalidValue {
        kind: leaf.kind(),
        field: field.to_string(),
        reason: format!("expected {expected}, found {} {value}", value_type(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in LeafKind::ALL {
            assert_eq!(kind.as_str().parse::<LeafKind>().unwrap(), *kind);
        }
        assert_eq!("DocBlock".parse::<LeafKind>().unwrap(), LeafKind::DocBlock);
        assert!("class".parse::<LeafKind>().is_err());
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&LeafKind::DocBlock).unwrap(),
            "\"docblock\""
        );
        let kind: LeafKind = serde_json::from_str("\"hook\"").unwrap();
        assert_eq!(kind, LeafKind::Hook);
    }

    #[test]
    fn test_function_known_keys() {
        let schema = function_schema();
        assert_eq!(
            schema.known_keys().collect::<Vec<_>>(),
            vec![
                "name",
                "namespace",
                "aliases",
                "line",
                "end_line",
                "arguments",
                "doc",
                "hooks",
                "uses"
            ]
        );
    }
}
