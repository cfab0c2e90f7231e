//! Reflect a type's structural description into a JSON Schema document.
//!
//! The walker visits a `Type` together with an instance `Value`, reads each
//! record member's `FieldDescriptor` from its tag, and produces a root
//! `SchemaNode` plus a deduplicated `definitions` registry.
//!
//! ```
//! use std::collections::HashMap;
//!
//! let schema = json_reflect::reflect(&HashMap::<String, i64>::new()).unwrap();
//! assert_eq!(
//!     serde_json::to_value(&schema.root).unwrap(),
//!     serde_json::json!({"type": "object", "patternProperties": {".*": {"type": "integer"}}})
//! );
//! ```
pub mod error;
pub mod reflect;
pub mod registry;
pub mod schema;
pub mod tags;
pub mod types;

pub use error::{Error, Result};
pub use reflect::{Reflector, apply_metadata, reflect};
pub use registry::Registry;
pub use schema::{BinaryEncoding, Schema, SchemaKind, SchemaNode};
pub use tags::{FieldDescriptor, ReadDescriptor, TagReader};
pub use types::{Capabilities, Field, RecordType, Reflect, Reflected, Type, Value};
