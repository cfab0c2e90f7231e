use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use indexmap::IndexMap;

use super::{FloatWidth, IntWidth, Type, Value};

/// A type that can describe itself to the walker.
///
/// `reflect_type` is the static description; `to_value` is the instance.
/// Records implement this by hand (or through a caller's own macro):
///
/// ```
/// use json_reflect::types::{Reflect, RecordType, Type, Value};
///
/// struct Grandfather { family_name: String }
///
/// impl Reflect for Grandfather {
///     fn reflect_type() -> Type {
///         Type::record(
///             RecordType::new("Grandfather")
///                 .field::<String>("family_name", r#"json:"family_name" jsonschema:"required""#)
///         )
///     }
///     fn to_value(&self) -> Value {
///         Value::record([("family_name", self.family_name.to_value())])
///     }
/// }
/// ```
pub trait Reflect {
    fn reflect_type() -> Type;
    fn to_value(&self) -> Value;
}

// ------------------------------ Primitives ------------------------------- //

macro_rules! reflect_int {
    ($($t:ty => $ctor:ident($width:ident) as $variant:ident($cast:ty)),* $(,)?) => {$(
        impl Reflect for $t {
            fn reflect_type() -> Type { Type::$ctor(IntWidth::$width) }
            fn to_value(&self) -> Value { Value::$variant(*self as $cast) }
        }
    )*};
}

reflect_int! {
    i8 => int(W8) as Int(i64),
    i16 => int(W16) as Int(i64),
    i32 => int(W32) as Int(i64),
    i64 => int(W64) as Int(i64),
    isize => int(Size) as Int(i64),
    u8 => uint(W8) as Uint(u64),
    u16 => uint(W16) as Uint(u64),
    u32 => uint(W32) as Uint(u64),
    u64 => uint(W64) as Uint(u64),
    usize => uint(Size) as Uint(u64),
}

impl Reflect for f32 {
    fn reflect_type() -> Type { Type::float(FloatWidth::F32) }
    fn to_value(&self) -> Value { Value::Float(f64::from(*self)) }
}

impl Reflect for f64 {
    fn reflect_type() -> Type { Type::float(FloatWidth::F64) }
    fn to_value(&self) -> Value { Value::Float(*self) }
}

impl Reflect for bool {
    fn reflect_type() -> Type { Type::bool() }
    fn to_value(&self) -> Value { Value::Bool(*self) }
}

impl Reflect for str {
    fn reflect_type() -> Type { Type::string() }
    fn to_value(&self) -> Value { Value::String(self.to_string()) }
}

impl Reflect for String {
    fn reflect_type() -> Type { Type::string() }
    fn to_value(&self) -> Value { Value::String(self.clone()) }
}

impl Reflect for char {
    fn reflect_type() -> Type { Type::string() }
    fn to_value(&self) -> Value { Value::String(self.to_string()) }
}

// ------------------------------ Wrappers --------------------------------- //

impl<T: Reflect + ?Sized> Reflect for &T {
    fn reflect_type() -> Type { T::reflect_type() }
    fn to_value(&self) -> Value { (**self).to_value() }
}

impl<T: Reflect + ?Sized> Reflect for Box<T> {
    fn reflect_type() -> Type { T::reflect_type() }
    fn to_value(&self) -> Value { (**self).to_value() }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect_type() -> Type { Type::optional(T::reflect_type()) }
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

// ------------------------------ Sequences -------------------------------- //

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect_type() -> Type { Type::slice(T::reflect_type()) }
    fn to_value(&self) -> Value { Value::Seq(self.iter().map(Reflect::to_value).collect()) }
}

impl<T: Reflect> Reflect for [T] {
    fn reflect_type() -> Type { Type::slice(T::reflect_type()) }
    fn to_value(&self) -> Value { Value::Seq(self.iter().map(Reflect::to_value).collect()) }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect_type() -> Type { Type::array(T::reflect_type(), N) }
    fn to_value(&self) -> Value { Value::Seq(self.iter().map(Reflect::to_value).collect()) }
}

// ------------------------------- Maps ------------------------------------ //

fn map_value<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> Value
where
    K: Reflect + 'a,
    V: Reflect + 'a,
{
    Value::Map(entries.map(|(k, v)| (k.to_value(), v.to_value())).collect())
}

impl<K: Reflect, V: Reflect, S> Reflect for HashMap<K, V, S> {
    fn reflect_type() -> Type { Type::map(K::reflect_type(), V::reflect_type()) }
    fn to_value(&self) -> Value { map_value(self.iter()) }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn reflect_type() -> Type { Type::map(K::reflect_type(), V::reflect_type()) }
    fn to_value(&self) -> Value { map_value(self.iter()) }
}

impl<K: Reflect, V: Reflect, S> Reflect for IndexMap<K, V, S> {
    fn reflect_type() -> Type { Type::map(K::reflect_type(), V::reflect_type()) }
    fn to_value(&self) -> Value { map_value(self.iter()) }
}

// ----------------------------- Well-known -------------------------------- //

impl<Tz> Reflect for chrono::DateTime<Tz>
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    fn reflect_type() -> Type { Type::timestamp() }
    fn to_value(&self) -> Value { Value::String(self.to_rfc3339()) }
}

impl Reflect for chrono::NaiveDateTime {
    fn reflect_type() -> Type { Type::timestamp() }
    fn to_value(&self) -> Value { Value::String(self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()) }
}

impl Reflect for IpAddr {
    fn reflect_type() -> Type { Type::ip_addr() }
    fn to_value(&self) -> Value { Value::String(self.to_string()) }
}

impl Reflect for Ipv4Addr {
    fn reflect_type() -> Type { Type::ip_addr() }
    fn to_value(&self) -> Value { Value::String(self.to_string()) }
}

impl Reflect for Ipv6Addr {
    fn reflect_type() -> Type { Type::ip_addr() }
    fn to_value(&self) -> Value { Value::String(self.to_string()) }
}

// ------------------------------ Dynamic ---------------------------------- //

impl Reflect for serde_json::Value {
    fn reflect_type() -> Type { Type::any() }
    fn to_value(&self) -> Value {
        use serde_json::Value as J;
        match self {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(*b),
            J::Number(n) => {
                if let Some(i) = n.as_i64() { Value::Int(i) }
                else if let Some(u) = n.as_u64() { Value::Uint(u) }
                else { Value::Float(n.as_f64().unwrap_or_default()) }
            }
            J::String(s) => Value::String(s.clone()),
            J::Array(xs) => Value::Seq(xs.iter().map(Reflect::to_value).collect()),
            J::Object(m) => Value::Map(
                m.iter().map(|(k, v)| (Value::String(k.clone()), v.to_value())).collect()
            ),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Kind, WellKnown};

    #[test]
    fn integers_keep_width_and_sign() {
        assert!(matches!(u8::reflect_type().kind, Kind::Uint(IntWidth::W8)));
        assert!(matches!(i32::reflect_type().kind, Kind::Int(IntWidth::W32)));
        assert_eq!((-4i16).to_value(), Value::Int(-4));
        assert_eq!(7usize.to_value(), Value::Uint(7));
    }

    #[test]
    fn option_is_optional_and_none_is_null() {
        assert!(matches!(Option::<bool>::reflect_type().kind, Kind::Optional(_)));
        assert_eq!(None::<bool>.to_value(), Value::Null);
        assert_eq!(Some(true).to_value(), Value::Bool(true));
    }

    #[test]
    fn arrays_carry_their_length() {
        match <[i32; 4]>::reflect_type().kind {
            Kind::Array { len, .. } => assert_eq!(len, 4),
            other => panic!("expected array, got {other:?}"),
        }
        assert!(matches!(Vec::<u8>::reflect_type().kind, Kind::Slice(_)));
    }

    #[test]
    fn well_known_types_are_tagged() {
        assert!(matches!(chrono::Utc::now().to_value(), Value::String(_)));
        assert!(matches!(
            chrono::DateTime::<chrono::Utc>::reflect_type().kind,
            Kind::WellKnown(WellKnown::Timestamp)
        ));
        assert!(matches!(IpAddr::reflect_type().kind, Kind::WellKnown(WellKnown::IpAddr)));
        assert_eq!(
            Ipv4Addr::new(10, 0, 0, 1).to_value(),
            Value::String("10.0.0.1".into())
        );
    }

    #[test]
    fn json_values_are_dynamic() {
        assert!(matches!(serde_json::Value::reflect_type().kind, Kind::Any));
        let v = serde_json::json!({"a": [1, -2, 2.5]});
        assert_eq!(v.to_value(), Value::Map(vec![(
            Value::String("a".into()),
            Value::Seq(vec![Value::Int(1), Value::Int(-2), Value::Float(2.5)]),
        )]));
    }
}
