use std::{fmt, io};

use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

use crate::model::LeafKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum LeafDocError {
    #[error("Unknown field '{field}' requested on {kind}")]
    UnknownField { kind: LeafKind, field: String },
    #[error("Malformed sub-record in {kind}.{field} at index {index}: {reason}")]
    MalformedSubRecord {
        kind: LeafKind,
        field: String,
        index: usize,
        reason: String,
    },
    #[error("Invalid value for {kind}.{field}: {reason}")]
    InvalidValue {
        kind: LeafKind,
        field: String,
        reason: String,
    },
    #[error("No schema registered for leaf kind {0}")]
    UnregisteredKind(LeafKind),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("File System error: {0}")]
    Io(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Custom error: {0}")]
    Custom(String),
}

impl LeafDocError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LeafDocError::UnknownField { .. } => StatusCode::BAD_REQUEST,
            LeafDocError::MalformedSubRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LeafDocError::InvalidValue { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LeafDocError::UnregisteredKind(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LeafDocError::NotFound(_) => StatusCode::NOT_FOUND,
            LeafDocError::PermissionDenied => StatusCode::FORBIDDEN,
            LeafDocError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LeafDocError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LeafDocError::Custom(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<toml::de::Error> for LeafDocError {
    fn from(src: toml::de::Error) -> LeafDocError {
        LeafDocError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for LeafDocError {
    fn from(src: toml::ser::Error) -> LeafDocError {
        LeafDocError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for LeafDocError {
    fn from(src: JsonError) -> LeafDocError {
        LeafDocError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for LeafDocError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => LeafDocError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => LeafDocError::PermissionDenied,
            _ => LeafDocError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for LeafDocError {
    fn from(x: fmt::Error) -> Self {
        LeafDocError::Custom(format!("{x}"))
    }
}
