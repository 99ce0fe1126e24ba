//! JSON interchange for [`Value`].
//!
//! Encoding is direct for every variant except timestamps, which become
//! RFC 3339 strings with an explicit `+00:00` offset. Decoding never
//! promotes strings or numbers to timestamps; that is a coercion decision.

use crate::error::DecodeError;
use crate::value::{ObjectMap, Value, format_timestamp};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

impl Value {
    /// Encode into a `serde_json::Value`.
    ///
    /// Infinities encode as the out-of-range literals `1e999` and `-1e999`,
    /// which decode back to infinity. NaN has no JSON form and becomes `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::Number(Number::from(*i)),
            Value::Float(f) => float_number(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Timestamp(ts) => serde_json::Value::String(format_timestamp(ts)),
            Value::Null => serde_json::Value::Null,
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }

    /// Encode as compact JSON text.
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Decode JSON text. Fails only when the text is not valid JSON.
    pub fn from_json(input: &str) -> Result<Self, DecodeError> {
        let raw: serde_json::Value = serde_json::from_str(input)?;
        Ok(Self::from_json_value(raw))
    }

    /// Convert an already parsed JSON document.
    ///
    /// Numbers that fit `i64` become `Integer`; every other number becomes
    /// `Float` by IEEE 754 parsing, so out-of-range literals saturate to
    /// infinity instead of failing.
    pub fn from_json_value(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => number_to_value(&n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json_value).collect())
            }
            serde_json::Value::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json_value(v)))
                    .collect::<ObjectMap>(),
            ),
        }
    }
}

fn float_number(f: f64) -> Option<Number> {
    if f.is_infinite() {
        let literal = if f > 0.0 { "1e999" } else { "-1e999" };
        // Needs `arbitrary_precision`; without it the literal fails to parse.
        serde_json::from_str(literal).ok()
    } else {
        Number::from_f64(f)
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        return Value::Integer(i);
    }
    match n.to_string().parse::<f64>() {
        Ok(f) => Value::Float(f),
        Err(_) => n.as_f64().map_or(Value::Null, Value::Float),
    }
}

impl From<serde_json::Value> for Value {
    fn from(raw: serde_json::Value) -> Self {
        Value::from_json_value(raw)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) => match float_number(*f) {
                Some(n) => n.serialize(serializer),
                None => serializer.serialize_unit(),
            },
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Timestamp(ts) => serializer.serialize_str(&format_timestamp(ts)),
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(item)?;
                }
                out.end()
            }
        }
    }
}

/// Deserializes through `serde_json::Value` so number handling matches
/// [`Value::from_json_value`] exactly.
///
/// With serde_json's `arbitrary_precision` feature enabled, numbers that pass
/// through a buffering container (`#[serde(untagged)]`, `#[serde(flatten)]`,
/// internally tagged enums) arrive as serde_json's private single-key marker
/// map and decode here as a `Map`, not a number. Deserialize `Value` directly
/// or as a plain struct field.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from_json_value(raw))
    }
}
