//! # JSON and Serde Bridge
//!
//! Converts between dynamic JSON and native values so application structs can
//! be stored through `serde`. JSON numbers follow the integer rule: a number
//! with no fractional part inside the safe integer range becomes an integer,
//! everything else a double.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Number, Value as Json};

use super::errors::{CodecError, CodecResult};
use super::types::{Fields, Value};

/// Largest integer a double represents exactly (2^53 - 1)
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl Value {
    /// Convert dynamic JSON into a native value
    pub fn from_json(json: Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(b),
            Json::Number(n) => number_to_value(&n),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from_json).collect()),
            Json::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert into dynamic JSON
    ///
    /// Lossy for kinds JSON has no type for: timestamps become RFC 3339
    /// strings, bytes base64 strings, references relative paths.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Integer(i) => Json::Number((*i).into()),
            Value::Double(d) => match Number::from_f64(*d) {
                Some(n) => Json::Number(n),
                None if d.is_nan() => Json::String("NaN".to_string()),
                None if *d > 0.0 => Json::String("Infinity".to_string()),
                None => Json::String("-Infinity".to_string()),
            },
            Value::Timestamp(ts) => Json::String(ts.to_string()),
            Value::String(s) => Json::String(s.clone()),
            Value::Bytes(bytes) => Json::String(STANDARD.encode(bytes)),
            Value::Reference(path) => Json::String(path.relative_name()),
            Value::GeoPoint(point) => json!({
                "latitude": point.latitude(),
                "longitude": point.longitude(),
            }),
            Value::Array(values) => Json::Array(values.iter().map(Value::to_json).collect()),
            Value::Map(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// Convert any serialisable value
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> CodecResult<Value> {
        Ok(Value::from_json(serde_json::to_value(value)?))
    }

    /// Deserialise into an application type
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> CodecResult<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

/// Convert a serialisable struct into a document field map
pub fn to_fields<T: Serialize + ?Sized>(value: &T) -> CodecResult<Fields> {
    match Value::from_serialize(value)? {
        Value::Map(fields) => Ok(fields),
        other => Err(CodecError::Unsupported(format!(
            "document data must be a map, got {}",
            other.kind()
        ))),
    }
}

/// Deserialise a document field map into an application type
pub fn from_fields<T: DeserializeOwned>(fields: &Fields) -> CodecResult<T> {
    Value::Map(fields.clone()).deserialize_into()
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        return Value::Integer(i);
    }
    // u64 above i64::MAX lands here and becomes a double
    let f = n.as_f64().unwrap_or(f64::NAN);
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        Value::Integer(f as i64)
    } else {
        Value::Double(f)
    }
}
