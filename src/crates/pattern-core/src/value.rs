//! Dynamic values crossing the pattern boundary
//!
//! `DynamicValue` is the tagged union used for pattern parameters, context and
//! result metadata. It serializes to plain JSON with one extension: non-finite
//! floats, which JSON numbers cannot carry, are written as the string
//! sentinels `"Infinity"`, `"-Infinity"` and `"NaN"` and read back as floats.
//!
//! # Decoding precedence
//!
//! An untyped wire value is classified in the order Int, Float, String, Bool,
//! Array, Object, falling back to Null. For JSON numbers the lexeme decides
//! between the first two: `2` is an `Int`, while `2.0` and `2e0` are `Float`s.
//! Integers that do not fit in an `i64` fall through to `Float`.
//!
//! # Example
//!
//! ```rust
//! use pattern_core::value::{decode, encode, DynamicValue};
//!
//! let bytes = encode(&DynamicValue::Float(f64::INFINITY)).unwrap();
//! assert_eq!(bytes, br#""Infinity""#);
//!
//! let value = decode(&bytes).unwrap();
//! assert_eq!(value.as_f64(), Some(f64::INFINITY));
//! ```

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Wire sentinel for `f64::INFINITY`
pub const INFINITY_SENTINEL: &str = "Infinity";
/// Wire sentinel for `f64::NEG_INFINITY`
pub const NEG_INFINITY_SENTINEL: &str = "-Infinity";
/// Wire sentinel for `f64::NAN`
pub const NAN_SENTINEL: &str = "NaN";

/// String-keyed map of dynamic values
pub type DynamicMap = BTreeMap<String, DynamicValue>;

/// A JSON-like value with explicit support for non-finite floats
#[derive(Debug, Clone, Default)]
pub enum DynamicValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<DynamicValue>),
    Object(DynamicMap),
}

/// Structured decode failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to decode value at line {line}, column {column}: {message}")]
pub struct CodecError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Encode a value to wire bytes
pub fn encode(value: &DynamicValue) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode wire bytes into a value
///
/// Malformed input is reported as a [`CodecError`]; it is never coerced to
/// `Null`.
pub fn decode(bytes: &[u8]) -> Result<DynamicValue, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Map a sentinel string back to its float, if it is one
fn sentinel_to_float(s: &str) -> Option<f64> {
    match s {
        INFINITY_SENTINEL => Some(f64::INFINITY),
        NEG_INFINITY_SENTINEL => Some(f64::NEG_INFINITY),
        NAN_SENTINEL => Some(f64::NAN),
        _ => None,
    }
}

fn float_to_sentinel(f: f64) -> Option<&'static str> {
    if f.is_nan() {
        Some(NAN_SENTINEL)
    } else if f == f64::INFINITY {
        Some(INFINITY_SENTINEL)
    } else if f == f64::NEG_INFINITY {
        Some(NEG_INFINITY_SENTINEL)
    } else {
        None
    }
}

impl DynamicValue {
    /// Name of the variant, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DynamicValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DynamicMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`, writing non-finite floats as sentinels
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => Value::Number(n),
                None => Value::String(float_to_sentinel(*f).unwrap_or(NAN_SENTINEL).to_string()),
            },
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json_value).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for DynamicValue {
    /// Structural equality where NaN equals NaN, so sentinel round-trips compare equal
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => match float_to_sentinel(*f) {
                Some(sentinel) => serializer.serialize_str(sentinel),
                None => serializer.serialize_f64(*f),
            },
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => serializer.collect_seq(items),
            Self::Object(map) => serializer.collect_map(map),
        }
    }
}

struct DynamicValueVisitor;

impl<'de> Visitor<'de> for DynamicValueVisitor {
    type Value = DynamicValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DynamicValue, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => DynamicValue::Int(i),
            Err(_) => DynamicValue::Float(v as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DynamicValue, E> {
        Ok(match sentinel_to_float(v) {
            Some(f) => DynamicValue::Float(f),
            None => DynamicValue::String(v.to_string()),
        })
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<DynamicValue, E> {
        Ok(match sentinel_to_float(&v) {
            Some(f) => DynamicValue::Float(f),
            None => DynamicValue::String(v),
        })
    }

    fn visit_unit<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<DynamicValue, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DynamicValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(DynamicValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DynamicValue, A::Error> {
        let mut entries = DynamicMap::new();
        while let Some((key, value)) = map.next_entry::<String, DynamicValue>()? {
            entries.insert(key, value);
        }
        Ok(DynamicValue::Object(entries))
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DynamicValueVisitor)
    }
}

impl From<serde_json::Value> for DynamicValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => match sentinel_to_float(&s) {
                Some(f) => Self::Float(f),
                None => Self::String(s),
            },
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<bool> for DynamicValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for DynamicValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for DynamicValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u32> for DynamicValue {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for DynamicValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DynamicValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<DynamicValue>> for DynamicValue {
    fn from(v: Vec<DynamicValue>) -> Self {
        Self::Array(v)
    }
}

impl From<DynamicMap> for DynamicValue {
    fn from(v: DynamicMap) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: &DynamicValue) -> DynamicValue {
        decode(&encode(value).unwrap()).unwrap()
    }

    #[test]
    fn test_non_finite_sentinels_encode() {
        assert_eq!(
            encode(&DynamicValue::Float(f64::INFINITY)).unwrap(),
            br#""Infinity""#
        );
        assert_eq!(
            encode(&DynamicValue::Float(f64::NEG_INFINITY)).unwrap(),
            br#""-Infinity""#
        );
        assert_eq!(encode(&DynamicValue::Float(f64::NAN)).unwrap(), br#""NaN""#);
    }

    #[test]
    fn test_non_finite_roundtrip() {
        let inf = roundtrip(&DynamicValue::Float(f64::INFINITY));
        let f = inf.as_f64().unwrap();
        assert!(f.is_infinite() && f > 0.0);

        let neg = roundtrip(&DynamicValue::Float(f64::NEG_INFINITY));
        let f = neg.as_f64().unwrap();
        assert!(f.is_infinite() && f < 0.0);

        let nan = roundtrip(&DynamicValue::Float(f64::NAN));
        assert!(nan.as_f64().unwrap().is_nan());
        assert_eq!(nan, DynamicValue::Float(f64::NAN));
    }

    #[test]
    fn test_decode_precedence() {
        assert_eq!(decode(b"2").unwrap(), DynamicValue::Int(2));
        assert_eq!(decode(b"-17").unwrap(), DynamicValue::Int(-17));
        assert_eq!(decode(b"2.0").unwrap(), DynamicValue::Float(2.0));
        assert_eq!(decode(b"1.5e3").unwrap(), DynamicValue::Float(1500.0));
        assert_eq!(
            decode(br#""2""#).unwrap(),
            DynamicValue::String("2".to_string())
        );
        assert_eq!(decode(b"true").unwrap(), DynamicValue::Bool(true));
        assert_eq!(decode(b"null").unwrap(), DynamicValue::Null);
    }

    #[test]
    fn test_integer_beyond_i64_falls_through_to_float() {
        let value = decode(b"18446744073709551615").unwrap();
        assert_eq!(value.type_name(), "float");
    }

    #[test]
    fn test_float_lexeme_stays_float() {
        let value = roundtrip(&DynamicValue::Float(3.0));
        assert_eq!(value, DynamicValue::Float(3.0));
        assert_eq!(value.type_name(), "float");
    }

    #[test]
    fn test_nested_roundtrip() {
        let mut inner = DynamicMap::new();
        inner.insert("limit".to_string(), DynamicValue::Float(f64::NEG_INFINITY));
        inner.insert("empty".to_string(), DynamicValue::Object(DynamicMap::new()));

        let value = DynamicValue::Array(vec![
            DynamicValue::String(String::new()),
            DynamicValue::Array(vec![]),
            DynamicValue::Object(inner),
            DynamicValue::Int(i64::MIN),
        ]);

        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let err = decode(b"{\"a\": ").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.column > 0);

        assert!(decode(b"not json").is_err());
        assert!(decode(b"").is_err());
    }

    #[test]
    fn test_nan_equality() {
        assert_eq!(DynamicValue::Float(f64::NAN), DynamicValue::Float(f64::NAN));
        assert_ne!(DynamicValue::Float(1.0), DynamicValue::Int(1));
    }

    #[test]
    fn test_json_value_conversion() {
        let json = serde_json::json!({
            "count": 3,
            "ratio": 0.5,
            "upper": "Infinity",
            "tags": ["a", "b"],
            "flag": false
        });

        let value = DynamicValue::from(json);
        let obj = value.as_object().unwrap();
        assert_eq!(obj["count"], DynamicValue::Int(3));
        assert_eq!(obj["ratio"], DynamicValue::Float(0.5));
        assert_eq!(obj["upper"], DynamicValue::Float(f64::INFINITY));
        assert_eq!(obj["tags"].as_array().unwrap().len(), 2);
        assert_eq!(obj["flag"].as_bool(), Some(false));

        let back = value.to_json_value();
        assert_eq!(back["upper"], serde_json::json!("Infinity"));
        assert_eq!(back["count"], serde_json::json!(3));
    }

    #[test]
    fn test_display_is_compact_json() {
        let mut map = DynamicMap::new();
        map.insert("length".to_string(), DynamicValue::from("short"));
        assert_eq!(DynamicValue::Object(map).to_string(), r#"{"length":"short"}"#);
    }
}
