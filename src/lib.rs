//! # leafdoc
//!
//! A Rust library for turning extracted documentation records into a lazily resolved, typed object
//! graph for reference documentation.
//!
//! ## Overview
//!
//! A documentation extractor emits nested dictionaries describing functions, methods, their
//! arguments, doc-blocks, hooks, and where each symbol is used. leafdoc turns such a record into a
//! graph of **leaf entities**. Each leaf knows which keys its kind recognizes, ignores the rest,
//! and materializes a field only when a consumer asks for it.
//!
//! ### Key Features
//!
//! - **Lazy resolution**: fields are processed on first access and cached; repeat reads return the
//!   same value without touching the raw input again
//! - **Known keys**: every kind declares the fields it understands. Requesting anything else is an
//!   error, while extra keys in the input are ignored so producers can grow their output freely
//! - **Typed children**: plural fields become name-keyed maps of child leaves, singular fields a
//!   single child, scalars are coerced (line numbers to integers, flags to booleans)
//! - **Parent links**: children point back at the entity that built them without owning it
//! - **Extensible schemas**: kinds are described by [`registry::LeafSchema`] values held in an
//!   [`registry::EntityRegistry`]; processors can be swapped and fields added at runtime
//!
//! ## Architecture
//!
//! - **[`record`]**: `RawRecord`, the read-only view over input dictionaries (JSON or TOML)
//! - **[`leaf`]**: `LeafNode`, `FieldValue`, `LeafMap`: lazy resolution and parent linkage
//! - **[`registry`]**: schemas and the factory building child leaves from sub-records
//! - **[`model`]**: the built-in kinds (`function`, `method`, `usage`, `argument`, `docblock`,
//!   `hook`, `alias`) and their field processors
//! - **[`graph`]**: `DocumentGraph`, the composition root, and dotted-path lookup
//! - **[`config`]**: model configuration and its TOML provider
//! - **[`options`]**: host option / user-meta store contracts
//!
//! ## Quick Start
//!
//! ```rust
//! use leafdoc::{graph::DocumentGraph, record::RawRecord};
//!
//! let record: RawRecord = r#"{
//!     "name": "foo",
//!     "namespace": "Bar",
//!     "line": 10,
//!     "end_line": 20,
//!     "arguments": [{"name": "x"}, {"name": "y"}],
//!     "hooks": [{"name": "init"}],
//!     "doc": {"description": "desc"}
//! }"#
//! .parse()?;
//!
//! let graph = DocumentGraph::function(record)?;
//! let root = graph.root();
//!
//! assert_eq!(root.get("name")?.as_str(), Some("foo"));
//! assert_eq!(root.get("line")?.as_int(), Some(10));
//!
//! let arguments = root.get("arguments")?.as_map().unwrap();
//! assert_eq!(arguments.keys().collect::<Vec<_>>(), vec!["x", "y"]);
//!
//! let doc = root.get("doc")?.as_leaf().unwrap();
//! assert_eq!(doc.get("description")?.as_str(), Some("desc"));
//! # Ok::<(), leafdoc::LeafDocError>(())
//! ```
//!
//! ## Errors
//!
//! All failures are [`LeafDocError`] values returned from the call that triggered them:
//!
//! - `UnknownField`: a field the kind does not declare was requested
//! - `MalformedSubRecord`: a plural entry without a `name`, or a child that is not a record
//! - `InvalidValue`: a scalar that cannot be coerced
//!
//! A failed resolution leaves the field unresolved and fails the whole field; nothing is silently
//! dropped.

pub mod config;
pub mod error;
pub mod graph;
pub mod leaf;
pub mod model;
pub mod options;
pub mod record;
pub mod registry;
#[cfg(test)]
mod tests;

pub use error::*;
