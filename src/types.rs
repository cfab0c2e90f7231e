//! Reflection input: a static type description plus a runtime value.
//!
//! `Type` says what shape something has (and which capabilities it
//! advertises); `Value` is one instance of it. Record members resolve their
//! type lazily through a `fn() -> Type`, so a record that mentions itself is
//! still a finite description.
pub mod impls;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

pub use impls::Reflect;

// ------------------------------- Kinds ----------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntWidth { W8, W16, W32, W64, Size }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatWidth { F32, F64 }

/// Structurally composite types that map straight to a formatted string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WellKnown {
    Timestamp,
    IpAddr,
    Uri,
}

impl WellKnown {
    pub fn format(self) -> &'static str {
        match self {
            Self::Timestamp => "date-time",
            Self::IpAddr => "ipv4",
            Self::Uri => "uri",
        }
    }
}

#[derive(Clone, Debug)]
pub enum Kind {
    Bool,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
    String,
    /// open/dynamic value
    Any,
    Optional(Box<Type>),
    Array { elem: Box<Type>, len: usize },
    Slice(Box<Type>),
    Map { key: Box<Type>, value: Box<Type> },
    Record(Arc<RecordType>),
    WellKnown(WellKnown),
    /// no schema rule exists for it (functions, channels, ...)
    Opaque,
}

impl Kind {
    fn describe(&self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int(_) => "int",
            Kind::Uint(_) => "uint",
            Kind::Float(_) => "float",
            Kind::String => "string",
            Kind::Any => "any",
            Kind::Optional(_) => "optional",
            Kind::Array { .. } => "array",
            Kind::Slice(_) => "slice",
            Kind::Map { .. } => "map",
            Kind::Record(_) => "record",
            Kind::WellKnown(WellKnown::Timestamp) => "timestamp",
            Kind::WellKnown(WellKnown::IpAddr) => "ip address",
            Kind::WellKnown(WellKnown::Uri) => "uri",
            Kind::Opaque => "opaque",
        }
    }

    /// Whether `value` is an instance of this kind. A value that is not gets
    /// replaced by the type's zero value during the walk.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Kind::Any | Kind::WellKnown(_) | Kind::Opaque, _) => true,
            (Kind::Optional(_), Value::Null) => true,
            (Kind::Optional(inner), v) => inner.kind.accepts(v),
            (Kind::Bool, Value::Bool(_)) => true,
            (Kind::Int(_) | Kind::Uint(_), Value::Int(_) | Value::Uint(_)) => true,
            (Kind::Float(_), Value::Float(_) | Value::Int(_) | Value::Uint(_)) => true,
            (Kind::String, Value::String(_)) => true,
            (Kind::Array { .. } | Kind::Slice(_), Value::Seq(_)) => true,
            (Kind::Map { .. }, Value::Map(_)) => true,
            (Kind::Record(_), Value::Record(_)) => true,
            _ => false,
        }
    }
}

// ------------------------------- Records --------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility { Public, Private }

/// One structural member of a record, in declaration order.
#[derive(Clone, Debug)]
pub struct Field {
    pub ident: Cow<'static, str>,
    /// raw metadata, read by a `ReadDescriptor`
    pub tag: Cow<'static, str>,
    pub visibility: Visibility,
    /// included by composition; its members fold into the enclosing record
    pub embedded: bool,
    pub ty: fn() -> Type,
}

impl Field {
    pub fn new(ident: impl Into<Cow<'static, str>>, tag: impl Into<Cow<'static, str>>, ty: fn() -> Type) -> Self {
        Self {
            ident: ident.into(),
            tag: tag.into(),
            visibility: Visibility::Public,
            embedded: false,
            ty,
        }
    }

    pub fn private(mut self) -> Self { self.visibility = Visibility::Private; self }

    pub fn embedded(mut self) -> Self { self.embedded = true; self }

    pub fn is_public(&self) -> bool { self.visibility == Visibility::Public }
}

#[derive(Clone, Debug)]
pub struct RecordType {
    /// canonical name; the key in the definitions registry
    pub name: Cow<'static, str>,
    pub fields: Vec<Field>,
}

impl RecordType {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    pub fn field<T: Reflect + ?Sized>(self, ident: impl Into<Cow<'static, str>>, tag: impl Into<Cow<'static, str>>) -> Self {
        self.member(Field::new(ident, tag, T::reflect_type))
    }

    pub fn private_field<T: Reflect + ?Sized>(self, ident: impl Into<Cow<'static, str>>, tag: impl Into<Cow<'static, str>>) -> Self {
        self.member(Field::new(ident, tag, T::reflect_type).private())
    }

    /// Embed `T` by composition. Embedded members carry no tag of their own.
    pub fn embed<T: Reflect + ?Sized>(self, ident: impl Into<Cow<'static, str>>) -> Self {
        self.member(Field::new(ident, "", T::reflect_type).embedded())
    }

    pub fn member(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

// ----------------------------- Capabilities ------------------------------ //

/// Asks an instance for its alternatives / variants.
pub type Variants = fn(&Value) -> Vec<Reflected>;

/// The capabilities a type may advertise. Which one wins when several are
/// present is decided by the walker's rule table, not here.
#[derive(Clone, Copy, Default)]
pub struct Capabilities {
    /// code-generated (protobuf-style) enumeration
    pub proto_enum: bool,
    pub one_of: Option<Variants>,
    pub any_of: Option<Variants>,
    pub all_of: Option<Variants>,
    /// reflect another type in place of this one
    pub implicit: Option<fn(&Value) -> Reflected>,
    /// fixed list of allowed literal values
    pub enumerable: Option<Variants>,
}

impl Capabilities {
    pub fn is_empty(&self) -> bool {
        !self.proto_enum
            && self.one_of.is_none() && self.any_of.is_none() && self.all_of.is_none()
            && self.implicit.is_none() && self.enumerable.is_none()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("proto_enum", &self.proto_enum)
            .field("one_of", &self.one_of.is_some())
            .field("any_of", &self.any_of.is_some())
            .field("all_of", &self.all_of.is_some())
            .field("implicit", &self.implicit.is_some())
            .field("enumerable", &self.enumerable.is_some())
            .finish()
    }
}

// --------------------------------- Type ---------------------------------- //

#[derive(Clone, Debug)]
pub struct Type {
    pub name: Option<Cow<'static, str>>,
    pub kind: Kind,
    pub capabilities: Capabilities,
}

impl Type {
    pub fn of_kind(kind: Kind) -> Self {
        Self { name: None, kind, capabilities: Capabilities::default() }
    }

    pub fn bool() -> Self { Self::of_kind(Kind::Bool) }
    pub fn int(width: IntWidth) -> Self { Self::of_kind(Kind::Int(width)) }
    pub fn uint(width: IntWidth) -> Self { Self::of_kind(Kind::Uint(width)) }
    pub fn float(width: FloatWidth) -> Self { Self::of_kind(Kind::Float(width)) }
    pub fn string() -> Self { Self::of_kind(Kind::String) }
    pub fn any() -> Self { Self::of_kind(Kind::Any) }
    pub fn timestamp() -> Self { Self::of_kind(Kind::WellKnown(WellKnown::Timestamp)) }
    pub fn ip_addr() -> Self { Self::of_kind(Kind::WellKnown(WellKnown::IpAddr)) }
    pub fn uri() -> Self { Self::of_kind(Kind::WellKnown(WellKnown::Uri)) }

    pub fn optional(inner: Type) -> Self { Self::of_kind(Kind::Optional(Box::new(inner))) }
    pub fn slice(elem: Type) -> Self { Self::of_kind(Kind::Slice(Box::new(elem))) }

    pub fn array(elem: Type, len: usize) -> Self {
        Self::of_kind(Kind::Array { elem: Box::new(elem), len })
    }

    pub fn map(key: Type, value: Type) -> Self {
        Self::of_kind(Kind::Map { key: Box::new(key), value: Box::new(value) })
    }

    pub fn record(record: RecordType) -> Self {
        Self {
            name: Some(record.name.clone()),
            ..Self::of_kind(Kind::Record(Arc::new(record)))
        }
    }

    pub fn opaque(name: impl Into<Cow<'static, str>>) -> Self {
        Self::of_kind(Kind::Opaque).named(name)
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn proto_enum(mut self) -> Self { self.capabilities.proto_enum = true; self }
    pub fn one_of(mut self, variants: Variants) -> Self { self.capabilities.one_of = Some(variants); self }
    pub fn any_of(mut self, variants: Variants) -> Self { self.capabilities.any_of = Some(variants); self }
    pub fn all_of(mut self, variants: Variants) -> Self { self.capabilities.all_of = Some(variants); self }
    pub fn enumerable(mut self, variants: Variants) -> Self { self.capabilities.enumerable = Some(variants); self }

    pub fn implicit(mut self, stand_in: fn(&Value) -> Reflected) -> Self {
        self.capabilities.implicit = Some(stand_in);
        self
    }

    /// Canonical name if the type has one, otherwise its kind.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => self.kind.describe().to_string(),
        }
    }

    /// A single octet; slices of these are binary blobs.
    pub fn is_byte(&self) -> bool {
        matches!(self.kind, Kind::Uint(IntWidth::W8)) && self.capabilities.is_empty()
    }

    /// The uninitialized instance of this type, used to infer shape when no
    /// instance is available.
    pub fn zero_value(&self) -> Value {
        match &self.kind {
            Kind::Bool => Value::Bool(false),
            Kind::Int(_) => Value::Int(0),
            Kind::Uint(_) => Value::Uint(0),
            Kind::Float(_) => Value::Float(0.0),
            Kind::String => Value::String(String::new()),
            Kind::Array { elem, len } => Value::Seq((0..*len).map(|_| elem.zero_value()).collect()),
            Kind::Slice(_) => Value::Seq(Vec::new()),
            Kind::Map { .. } => Value::Map(Vec::new()),
            Kind::Record(record) => Value::Record(
                record.fields.iter()
                    .map(|f| (f.ident.to_string(), (f.ty)().zero_value()))
                    .collect()
            ),
            Kind::Any | Kind::Optional(_) | Kind::WellKnown(_) | Kind::Opaque => Value::Null,
        }
    }
}

// --------------------------------- Value --------------------------------- //

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// absent optional / empty dynamic value
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Seq(Vec<Value>),
    Map(Vec<(Value, Value)>),
    /// member values keyed by `Field::ident`
    Record(IndexMap<String, Value>),
}

impl Value {
    pub fn record<K: Into<String>>(members: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Record(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn member(&self, ident: &str) -> Option<&Value> {
        match self {
            Value::Record(members) => members.get(ident),
            _ => None,
        }
    }

    /// True for the zero value of any type; such values never become a
    /// schema `default`.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Uint(u) => *u == 0,
            Value::Float(f) => *f == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Seq(xs) => xs.iter().all(Value::is_zero),
            Value::Map(entries) => entries.is_empty(),
            Value::Record(members) => members.values().all(Value::is_zero),
        }
    }

    /// Literal rendering for `default` / `enum`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::from(*i),
            Value::Uint(u) => J::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(J::Number).unwrap_or(J::Null),
            Value::String(s) => J::String(s.clone()),
            Value::Seq(xs) => J::Array(xs.iter().map(Value::to_json).collect()),
            Value::Map(entries) => J::Object(
                entries.iter().map(|(k, v)| (k.key_string(), v.to_json())).collect()
            ),
            Value::Record(members) => J::Object(
                members.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
            ),
        }
    }

    fn key_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }
}

/// A value together with its type; what capability queries hand back.
#[derive(Clone, Debug)]
pub struct Reflected {
    pub ty: Type,
    pub value: Value,
}

impl Reflected {
    pub fn new(ty: Type, value: Value) -> Self { Self { ty, value } }

    pub fn of<T: Reflect + ?Sized>(value: &T) -> Self {
        Self { ty: T::reflect_type(), value: value.to_value() }
    }

    /// The zero instance of `T`.
    pub fn zero<T: Reflect + ?Sized>() -> Self {
        let ty = T::reflect_type();
        let value = ty.zero_value();
        Self { ty, value }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_type() -> Type {
        Type::record(
            RecordType::new("Node")
                .field::<String>("label", r#"json:"label""#)
                .field::<Vec<i64>>("weights", r#"json:"weights""#)
                .member(Field::new("next", r#"json:"next""#, || Type::optional(node_type())))
        )
    }

    #[test]
    fn zero_value_of_self_referential_record_terminates() {
        let zero = node_type().zero_value();
        assert_eq!(zero, Value::record([
            ("label", Value::String(String::new())),
            ("weights", Value::Seq(vec![])),
            ("next", Value::Null),
        ]));
        assert!(zero.is_zero());
    }

    #[test]
    fn fixed_arrays_zero_to_len_elements() {
        let ty = Type::array(Type::int(IntWidth::W32), 3);
        assert_eq!(ty.zero_value(), Value::Seq(vec![Value::Int(0); 3]));
    }

    #[test]
    fn is_zero_distinguishes_set_values() {
        assert!(!Value::Bool(true).is_zero());
        assert!(!Value::String("x".into()).is_zero());
        assert!(!Value::Seq(vec![Value::Int(0), Value::Int(2)]).is_zero());
        assert!(Value::Float(0.0).is_zero());
        assert!(Value::Map(vec![]).is_zero());
    }

    #[test]
    fn to_json_renders_literals() {
        let v = Value::record([
            ("name", Value::String("a".into())),
            ("tags", Value::Seq(vec![Value::Uint(1), Value::Float(1.5)])),
            ("attrs", Value::Map(vec![(Value::Int(3), Value::Bool(true))])),
        ]);
        assert_eq!(v.to_json(), json!({"name": "a", "tags": [1, 1.5], "attrs": {"3": true}}));
        assert_eq!(Value::Float(f64::NAN).to_json(), json!(null));
    }

    #[test]
    fn kinds_accept_matching_values_only() {
        assert!(Kind::Float(FloatWidth::F64).accepts(&Value::Int(1)));
        assert!(!Kind::String.accepts(&Value::Int(1)));
        assert!(Type::optional(Type::bool()).kind.accepts(&Value::Null));
        assert!(Type::optional(Type::bool()).kind.accepts(&Value::Bool(true)));
        assert!(!Type::optional(Type::bool()).kind.accepts(&Value::String("no".into())));
        assert!(Kind::Any.accepts(&Value::Seq(vec![])));
    }

    #[test]
    fn byte_detection_ignores_named_capability_types() {
        assert!(Type::uint(IntWidth::W8).is_byte());
        assert!(!Type::int(IntWidth::W8).is_byte());
        assert!(!Type::uint(IntWidth::W8).proto_enum().is_byte());
    }

    #[test]
    fn display_name_prefers_canonical_name() {
        assert_eq!(node_type().display_name(), "Node");
        assert_eq!(Type::slice(Type::string()).display_name(), "slice");
        assert_eq!(Type::opaque("fn()").display_name(), "fn()");
    }
}
