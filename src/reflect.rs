//! Reflection walker: type graph → schema tree + definitions.
//!
//! Dispatch order for every type (first match wins):
//! 1. optional: absent → synthesize the pointee's zero value, then unwrap;
//! 2. well-known scalars (timestamp, IP address, URI) → formatted string;
//! 3. capabilities, in the order of `capability::RULES`;
//! 4. structural kind (record, sequence, map, numbers, bool, string, any).
//!
//! Anything left over is an unsupported type and aborts the whole call.
pub mod capability;
mod collection;
mod metadata;
mod record;

use std::borrow::Cow;

use tracing::trace;

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::schema::{DRAFT_04, Schema, SchemaKind, SchemaNode};
use crate::tags::{ReadDescriptor, TagReader};
use crate::types::{Kind, Reflect, Type, Value};

pub use metadata::apply_metadata;

// ------------------------------- Options --------------------------------- //

/// Reflection options plus the source of field descriptors.
#[derive(Clone, Debug)]
pub struct Reflector<R = TagReader> {
    /// emitted as `additionalProperties` on every record node when set
    pub additional_properties: Option<bool>,
    /// register the root record too and make the document root a `$ref`
    pub reference_root: bool,
    /// `$schema` of the produced document
    pub schema_version: Option<String>,
    reader: R,
}

impl Default for Reflector {
    fn default() -> Self {
        Self {
            additional_properties: None,
            reference_root: false,
            schema_version: Some(DRAFT_04.to_string()),
            reader: TagReader,
        }
    }
}

impl Reflector {
    pub fn new() -> Self { Self::default() }
}

impl<R: ReadDescriptor> Reflector<R> {
    pub fn with_reader<S: ReadDescriptor>(self, reader: S) -> Reflector<S> {
        Reflector {
            additional_properties: self.additional_properties,
            reference_root: self.reference_root,
            schema_version: self.schema_version,
            reader,
        }
    }

    pub fn additional_properties(mut self, allow: bool) -> Self {
        self.additional_properties = Some(allow);
        self
    }

    pub fn reference_root(mut self, yes: bool) -> Self {
        self.reference_root = yes;
        self
    }

    pub fn schema_version(mut self, version: Option<String>) -> Self {
        self.schema_version = version;
        self
    }

    pub fn reflect<T: Reflect + ?Sized>(&self, value: &T) -> Result<Schema> {
        self.reflect_from_type(&T::reflect_type(), &value.to_value())
    }

    /// Reflect an explicit type/value pair. Each call builds its own registry.
    pub fn reflect_from_type(&self, ty: &Type, value: &Value) -> Result<Schema> {
        let mut walker = Walker {
            reader: &self.reader,
            additional_properties: self.additional_properties,
            registry: Registry::new(),
            embedding: Vec::new(),
        };
        let root = walker.walk(ty, Sample::given(value), !self.reference_root)?;
        Ok(Schema {
            version: self.schema_version.clone(),
            root,
            definitions: walker.registry.into_definitions()?,
        })
    }
}

/// Reflect `value` with default options.
pub fn reflect<T: Reflect + ?Sized>(value: &T) -> Result<Schema> {
    Reflector::default().reflect(value)
}

// -------------------------------- Sample --------------------------------- //

/// The instance a type is walked with. `synthesized` marks zero values made
/// up for shape inference; those never surface as `default`.
#[derive(Clone, Debug)]
pub(crate) struct Sample<'v> {
    value: Cow<'v, Value>,
    synthesized: bool,
}

impl<'v> Sample<'v> {
    pub(crate) fn given(value: &'v Value) -> Self {
        Self { value: Cow::Borrowed(value), synthesized: false }
    }

    pub(crate) fn owned(value: Value) -> Sample<'static> {
        Sample { value: Cow::Owned(value), synthesized: false }
    }

    pub(crate) fn zero(ty: &Type) -> Sample<'static> {
        Sample { value: Cow::Owned(ty.zero_value()), synthesized: true }
    }

    pub(crate) fn value(&self) -> &Value { &self.value }

    /// Same instance seen through a borrowed child value.
    pub(crate) fn child<'s>(&'s self, value: &'s Value) -> Sample<'s> {
        Sample { value: Cow::Borrowed(value), synthesized: self.synthesized }
    }

    /// The member `ident` of a record instance, or `ty`'s zero value.
    pub(crate) fn member<'s>(&'s self, ident: &str, ty: &Type) -> Sample<'s> {
        match self.value.member(ident) {
            Some(v) => self.child(v),
            None => Sample::zero(ty),
        }
    }

    /// Swap in `ty`'s zero value when the instance is not of that type.
    fn conform(self, ty: &Type) -> Self {
        if ty.kind.accepts(&self.value) { self } else { Sample::zero(ty) }
    }

    pub(crate) fn default_literal(&self) -> Option<serde_json::Value> {
        if self.synthesized || self.value.is_zero() { return None; }
        Some(self.value.to_json()).filter(|v| !v.is_null())
    }
}

// -------------------------------- Walker --------------------------------- //

pub(crate) struct Walker<'a> {
    reader: &'a dyn ReadDescriptor,
    additional_properties: Option<bool>,
    registry: Registry,
    /// records currently being folded into an enclosing record
    embedding: Vec<String>,
}

impl Walker<'_> {
    pub(crate) fn walk(&mut self, ty: &Type, sample: Sample<'_>, is_root: bool) -> Result<SchemaNode> {
        trace!(ty = %ty.display_name(), is_root, "walk");
        let sample = sample.conform(ty);

        if let Kind::Optional(inner) = &ty.kind {
            let absent = matches!(sample.value(), Value::Null);
            let inner_sample = if absent { Sample::zero(inner) } else { sample };
            return self.walk(inner, inner_sample, is_root);
        }

        if let Kind::WellKnown(known) = ty.kind {
            return Ok(SchemaNode::formatted_string(known.format()));
        }

        if let Some(node) = self.walk_capabilities(ty, &sample)? {
            return Ok(node);
        }

        match &ty.kind {
            Kind::Record(record) => self.walk_record(record, &sample, is_root),
            Kind::Array { elem, len } => self.walk_sequence(elem, Some(*len), &sample),
            Kind::Slice(elem) => self.walk_sequence(elem, None, &sample),
            Kind::Map { value, .. } => self.walk_map(value),
            Kind::Int(_) | Kind::Uint(_) => Ok(leaf(SchemaKind::Integer, &sample)),
            Kind::Float(_) => Ok(leaf(SchemaKind::Number, &sample)),
            Kind::Bool => Ok(leaf(SchemaKind::Boolean, &sample)),
            Kind::String => Ok(leaf(SchemaKind::String, &sample)),
            Kind::Any => Ok(SchemaNode { additional_properties: Some(true), ..SchemaNode::object() }),
            // optionals and well-known types returned above
            Kind::Opaque | Kind::Optional(_) | Kind::WellKnown(_) => {
                Err(Error::UnsupportedType { type_name: ty.display_name() })
            }
        }
    }
}

fn leaf(kind: SchemaKind, sample: &Sample<'_>) -> SchemaNode {
    SchemaNode { default: sample.default_literal(), ..SchemaNode::of_kind(kind) }
}
