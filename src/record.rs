//! [RawRecord] is the read-only view over the semi-structured input that leaf entities are built
//! from.
//!
//! Records arrive from an external documentation extractor as nested dictionaries and lists. They
//! are held as an ordered [serde_json] object so that JSON and TOML producers share one value
//! model, and so that iteration follows the producer's field order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

use crate::error::LeafDocError;

/// The field every plural sub-record is keyed by.
pub const NAME_FIELD: &str = "name";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        RawRecord(Map::new())
    }

    /// Wrap a JSON value. Only objects are records.
    pub fn from_value(value: Value) -> Result<Self, LeafDocError> {
        match value {
            Value::Object(map) => Ok(RawRecord(map)),
            other => Err(LeafDocError::Serialization(format!(
                "expected a record (object), found {}",
                value_type(&other)
            ))),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, LeafDocError> {
        let value: Value = serde_json::from_str(content)?;
        RawRecord::from_value(value)
    }

    /// Parse a TOML document. Tables become records, arrays of tables become lists of records.
    pub fn from_toml_str(content: &str) -> Result<Self, LeafDocError> {
        let table: toml::Table = toml::from_str(content)?;
        let value = serde_json::to_value(table)?;
        RawRecord::from_value(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The record's own `name` field, when it is a string.
    pub fn name(&self) -> Option<&str> {
        self.str(NAME_FIELD)
    }

    /// The key this record is filed under in a plural field.
    ///
    /// A string `name` is used as is, a number by its decimal text and a boolean as `1` or `0`. A
    /// missing, null or structured `name` gives no key.
    pub fn name_key(&self) -> Option<String> {
        match self.0.get(NAME_FIELD)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(u8::from(*b).to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this record holding only `keys`, in the record's own field order.
    pub fn restrict<'a, I>(&self, keys: I) -> RawRecord
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: Vec<&str> = keys.into_iter().collect();
        RawRecord(
            self.0
                .iter()
                .filter(|(k, _)| keep.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Keys present in this record but absent from `keys`.
    pub fn unknown_keys<'a, I>(&self, keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: Vec<&str> = keys.into_iter().collect();
        self.0
            .keys()
            .filter(|k| !known.contains(&k.as_str()))
            .cloned()
            .collect()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        RawRecord(map)
    }
}

impl TryFrom<Value> for RawRecord {
    type Error = LeafDocError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        RawRecord::from_value(value)
    }
}

impl FromStr for RawRecord {
    type Err = LeafDocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RawRecord::from_json_str(s)
    }
}

impl fmt::Display for RawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

/// Short type label for diagnostics.
pub fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "record",
    }
}
