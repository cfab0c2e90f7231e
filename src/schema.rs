//! Output side: the schema tree and the document that carries it.
//!
//! A `SchemaNode` is either a reference (`$ref` into `definitions`) or an
//! inline node with a `type` and the constraint keywords that fit that type.
//! Empty keywords never serialize, so the JSON stays as small as the node.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl SchemaKind {
    pub fn is_numeric(self) -> bool { matches!(self, Self::Integer | Self::Number) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryEncoding {
    Base64,
}

/// Hyper-schema media block; only the encoding is modelled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub binary_encoding: BinaryEncoding,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SchemaKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_: Vec<serde_json::Value>,

    // object
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub pattern_properties: IndexMap<String, SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,

    // array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    // string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,

    // number / integer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,

    // polymorphism
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,
}

impl SchemaNode {
    pub fn of_kind(kind: SchemaKind) -> Self { Self { kind: Some(kind), ..Self::default() } }

    pub fn object() -> Self { Self::of_kind(SchemaKind::Object) }

    /// `{"type": "string", "format": <format>}`
    pub fn formatted_string(format: &str) -> Self {
        Self { format: Some(format.to_string()), ..Self::of_kind(SchemaKind::String) }
    }

    pub fn binary() -> Self {
        Self {
            media: Some(Media { binary_encoding: BinaryEncoding::Base64 }),
            ..Self::of_kind(SchemaKind::String)
        }
    }

    pub fn reference(name: &str) -> Self {
        Self { ref_path: Some(format!("{DEFINITIONS_PREFIX}{name}")), ..Self::default() }
    }

    pub fn is_ref(&self) -> bool { self.ref_path.is_some() }

    /// Name behind a local `#/definitions/<name>` pointer.
    pub fn ref_name(&self) -> Option<&str> {
        self.ref_path.as_deref()?.strip_prefix(DEFINITIONS_PREFIX)
    }

    pub fn binary_encoding(&self) -> Option<BinaryEncoding> {
        self.media.as_ref().map(|m| m.binary_encoding)
    }

    /// Add to `required` keeping it a set.
    pub fn require(&mut self, name: &str) {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
    }
}

/// One complete, self-contained schema: a root node plus every definition
/// the root (transitively) points at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub root: SchemaNode,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, SchemaNode>,
}

impl Schema {
    /// Follow a root-level `$ref` (if any) to the node it names.
    pub fn resolve<'a>(&'a self, node: &'a SchemaNode) -> Option<&'a SchemaNode> {
        match node.ref_name() {
            Some(name) => self.definitions.get(name),
            None => Some(node),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
