//! Extended JSON - the transport encoding for messages coming back from the
//! sandbox.
//!
//! Console payloads carry arbitrary values produced by user code, and plain
//! JSON cannot represent several of them (`undefined`, `NaN`, `Infinity`,
//! `-0`, functions). Those are written as tagged objects:
//!
//! ```text
//! undefined        {"$extended":"undefined"}
//! NaN              {"$extended":"NaN"}
//! Infinity         {"$extended":"Infinity"}
//! -Infinity        {"$extended":"-Infinity"}
//! -0               {"$extended":"-0"}
//! function foo(){} {"$extended":"function","name":"foo"}
//! ```
//!
//! A user object that itself owns a `$extended` key is wrapped as
//! `{"$extended":"object","value":{...}}`, so every value has exactly one
//! encoding and `decode(encode(v)) == v` holds for all of them.
//!
//! The `bootstrap.js` shim inside the execution context implements the
//! encoding half of the same scheme.

use crate::error::ProtocolError;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number};
use std::fmt;

/// Key marking a tagged value
pub const TAG: &str = "$extended";

/// Maximum nesting depth accepted by the decoder
const MAX_DEPTH: usize = 64;

/// Largest integer a JS number holds exactly (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A value as seen by the executed user code.
///
/// Objects keep their key order, matching how the sandbox enumerated them.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
    /// A function, identified by its name (may be empty)
    Function(String),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // NaN equals NaN here, and -0 is distinct from 0
            (Value::Number(a), Value::Number(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

fn tagged(kind: &str) -> serde_json::Value {
    let mut map = Map::new();
    map.insert(TAG.to_string(), serde_json::Value::String(kind.to_string()));
    serde_json::Value::Object(map)
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.is_nan() {
        return tagged("NaN");
    }
    if n.is_infinite() {
        return tagged(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if n == 0.0 && n.is_sign_negative() {
        return tagged("-0");
    }
    // Integral values are written without a fraction, as JS would
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl Value {
    /// Lower into plain JSON, tagging everything plain JSON cannot hold.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined => tagged("undefined"),
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(entries) => {
                let inner: Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect();
                if entries.iter().any(|(key, _)| key == TAG) {
                    let mut wrapper = Map::new();
                    wrapper.insert(TAG.to_string(), serde_json::Value::from("object"));
                    wrapper.insert("value".to_string(), serde_json::Value::Object(inner));
                    serde_json::Value::Object(wrapper)
                } else {
                    serde_json::Value::Object(inner)
                }
            }
            Value::Function(name) => {
                let mut map = Map::new();
                map.insert(TAG.to_string(), serde_json::Value::from("function"));
                map.insert("name".to_string(), serde_json::Value::String(name.clone()));
                serde_json::Value::Object(map)
            }
        }
    }

    /// Lift plain JSON back into a value, resolving tags.
    pub fn from_json(json: serde_json::Value) -> Result<Self, ProtocolError> {
        Self::from_json_at(json, 0)
    }

    fn from_json_at(json: serde_json::Value, depth: usize) -> Result<Self, ProtocolError> {
        if depth > MAX_DEPTH {
            return Err(ProtocolError::TooDeep(MAX_DEPTH));
        }

        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => Ok(Value::Number(n.as_f64().unwrap_or(f64::NAN))),
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| Self::from_json_at(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            serde_json::Value::Object(mut map) => match map.remove(TAG) {
                None => Self::entries_from_json(map, depth),
                Some(serde_json::Value::String(kind)) => match kind.as_str() {
                    "undefined" => Ok(Value::Undefined),
                    "NaN" => Ok(Value::Number(f64::NAN)),
                    "Infinity" => Ok(Value::Number(f64::INFINITY)),
                    "-Infinity" => Ok(Value::Number(f64::NEG_INFINITY)),
                    "-0" => Ok(Value::Number(-0.0)),
                    "function" => Ok(Value::Function(
                        map.get("name")
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    )),
                    "object" => match map.remove("value") {
                        Some(serde_json::Value::Object(inner)) => {
                            Self::entries_from_json(inner, depth)
                        }
                        _ => Err(ProtocolError::UnknownTag(kind)),
                    },
                    _ => Err(ProtocolError::UnknownTag(kind)),
                },
                Some(other) => Err(ProtocolError::UnknownTag(other.to_string())),
            },
        }
    }

    fn entries_from_json(
        map: Map<String, serde_json::Value>,
        depth: usize,
    ) -> Result<Self, ProtocolError> {
        map.into_iter()
            .map(|(key, value)| Ok((key, Self::from_json_at(value, depth + 1)?)))
            .collect::<Result<Vec<_>, ProtocolError>>()
            .map(Value::Object)
    }

    /// Encode as an extended JSON string.
    pub fn encode(&self) -> String {
        self.to_json().to_string()
    }

    /// Decode an extended JSON string.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json(json)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::from_json(json).map_err(D::Error::custom)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Console-style rendering: top-level strings print bare, nested ones quoted.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            other => write_nested(f, other),
        }
    }
}

fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Undefined => write!(f, "undefined"),
        Value::Null => write!(f, "null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Number(n) if n.is_nan() => write!(f, "NaN"),
        Value::Number(n) if n.is_infinite() => {
            write!(f, "{}", if *n > 0.0 { "Infinity" } else { "-Infinity" })
        }
        Value::Number(n) if *n == 0.0 && n.is_sign_negative() => write!(f, "-0"),
        Value::Number(n) => write!(f, "{}", n),
        Value::String(s) => write!(f, "{:?}", s),
        Value::Function(name) if name.is_empty() => write!(f, "[Function (anonymous)]"),
        Value::Function(name) => write!(f, "[Function: {}]", name),
        Value::Array(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_nested(f, item)?;
            }
            write!(f, "]")
        }
        Value::Object(entries) => {
            if entries.is_empty() {
                return write!(f, "{{}}");
            }
            write!(f, "{{ ")?;
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: ", key)?;
                write_nested(f, item)?;
            }
            write!(f, " }}")
        }
    }
}

/// Serialize any message type using the extended encoding for its values.
pub fn stringify<T: Serialize>(value: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(value)?)
}

/// Parse any message type, resolving extended tags inside its values.
pub fn parse<T: DeserializeOwned>(text: &str) -> Result<T, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_special_numbers_are_tagged() {
        assert_eq!(Value::Number(f64::NAN).encode(), r#"{"$extended":"NaN"}"#);
        assert_eq!(Value::Number(f64::INFINITY).encode(), r#"{"$extended":"Infinity"}"#);
        assert_eq!(Value::Number(f64::NEG_INFINITY).encode(), r#"{"$extended":"-Infinity"}"#);
        assert_eq!(Value::Number(-0.0).encode(), r#"{"$extended":"-0"}"#);
        assert_eq!(Value::Undefined.encode(), r#"{"$extended":"undefined"}"#);
    }

    #[test]
    fn test_integers_have_no_fraction() {
        assert_eq!(Value::Number(3.0).encode(), "3");
        assert_eq!(Value::Number(0.5).encode(), "0.5");
    }

    #[test]
    fn test_nan_survives_round_trip() {
        let value = Value::Array(vec![Value::Number(f64::NAN), Value::Undefined]);
        assert_eq!(Value::decode(&value.encode()).unwrap(), value);
    }

    #[test]
    fn test_user_object_with_tag_key_is_wrapped() {
        let value = Value::Object(vec![
            (TAG.to_string(), Value::from("NaN")),
            ("other".to_string(), Value::Number(1.0)),
        ]);
        let encoded = value.encode();
        assert!(encoded.starts_with(r#"{"$extended":"object","value":"#));
        assert_eq!(Value::decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_function_keeps_name() {
        let decoded = Value::decode(r#"{"$extended":"function","name":"render"}"#).unwrap();
        assert_eq!(decoded, Value::Function("render".to_string()));
        assert_eq!(decoded.to_string(), "[Function: render]");
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let result = Value::decode(r#"{"$extended":"Symbol"}"#);
        assert!(matches!(result, Err(ProtocolError::UnknownTag(tag)) if tag == "Symbol"));
    }

    #[test]
    fn test_depth_limit() {
        let mut text = String::from("1");
        for _ in 0..70 {
            text = format!("[{}]", text);
        }
        assert!(matches!(Value::decode(&text), Err(ProtocolError::TooDeep(_))));
    }

    #[test]
    fn test_object_key_order_is_kept() {
        let decoded = Value::decode(r#"{"b":1,"a":2}"#).unwrap();
        match decoded {
            Value::Object(entries) => {
                let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["b", "a"]);
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_display_matches_console_style() {
        let value = Value::Object(vec![
            ("name".to_string(), Value::from("Ada")),
            ("score".to_string(), Value::Number(f64::NAN)),
            ("tags".to_string(), Value::Array(vec![Value::Undefined])),
        ]);
        assert_eq!(value.to_string(), r#"{ name: "Ada", score: NaN, tags: [undefined] }"#);
        assert_eq!(Value::from("plain").to_string(), "plain");
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Undefined),
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<f64>().prop_map(Value::Number),
            prop_oneof![
                Just(f64::NAN),
                Just(f64::INFINITY),
                Just(f64::NEG_INFINITY),
                Just(-0.0)
            ]
            .prop_map(Value::Number),
            ".*".prop_map(Value::String),
            "[a-z]*".prop_map(Value::Function),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map(
                    prop_oneof![Just(TAG.to_string()), "[a-z]{1,6}"],
                    inner,
                    0..6
                )
                .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(value in arb_value()) {
            prop_assert_eq!(Value::decode(&value.encode()).unwrap(), value);
        }
    }
}
