//! # Typed Value Envelope
//!
//! The wire representation of a value: a JSON object with exactly one
//! `xxxValue` tag. Payloads stay in their wire form here (integers as
//! decimal strings on the wire, bytes as base64, references as resource
//! names); `codec` turns them into native values.

use std::collections::BTreeMap;

use serde_json::{json, Map, Number, Value as Json};

use super::errors::{CodecError, CodecResult};

/// Wire field map
pub type TypedFields = BTreeMap<String, TypedValue>;

/// A value as carried in REST payloads
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    /// RFC 3339 text
    Timestamp(String),
    String(String),
    /// Standard base64 text
    Bytes(String),
    /// Full document resource name
    Reference(String),
    GeoPoint { latitude: f64, longitude: f64 },
    Array(Vec<TypedValue>),
    Map(TypedFields),
}

impl TypedValue {
    /// The envelope tag this value serialises under
    pub fn tag(&self) -> &'static str {
        match self {
            TypedValue::Null => "nullValue",
            TypedValue::Boolean(_) => "booleanValue",
            TypedValue::Integer(_) => "integerValue",
            TypedValue::Double(_) => "doubleValue",
            TypedValue::Timestamp(_) => "timestampValue",
            TypedValue::String(_) => "stringValue",
            TypedValue::Bytes(_) => "bytesValue",
            TypedValue::Reference(_) => "referenceValue",
            TypedValue::GeoPoint { .. } => "geoPointValue",
            TypedValue::Array(_) => "arrayValue",
            TypedValue::Map(_) => "mapValue",
        }
    }

    /// Serialise to the JSON envelope
    pub fn to_json(&self) -> Json {
        let payload = match self {
            TypedValue::Null => Json::Null,
            TypedValue::Boolean(b) => Json::Bool(*b),
            TypedValue::Integer(i) => Json::String(i.to_string()),
            TypedValue::Double(d) => double_to_json(*d),
            TypedValue::Timestamp(s)
            | TypedValue::String(s)
            | TypedValue::Bytes(s)
            | TypedValue::Reference(s) => Json::String(s.clone()),
            TypedValue::GeoPoint {
                latitude,
                longitude,
            } => json!({
                "latitude": double_to_json(*latitude),
                "longitude": double_to_json(*longitude),
            }),
            TypedValue::Array(values) => {
                if values.is_empty() {
                    json!({})
                } else {
                    json!({ "values": values.iter().map(TypedValue::to_json).collect::<Vec<_>>() })
                }
            }
            TypedValue::Map(fields) => {
                if fields.is_empty() {
                    json!({})
                } else {
                    json!({ "fields": fields_to_json(fields) })
                }
            }
        };

        let mut envelope = Map::with_capacity(1);
        envelope.insert(self.tag().to_string(), payload);
        Json::Object(envelope)
    }

    /// Parse a JSON envelope
    ///
    /// Unknown tags fail with `CodecError::UnknownVariant`; nothing is
    /// silently defaulted.
    pub fn from_json(json: &Json) -> CodecResult<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| CodecError::MalformedEnvelope(format!("expected object, got {}", json)))?;

        let mut entries = obj.iter();
        let (tag, payload) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => {
                return Err(CodecError::MalformedEnvelope("empty envelope".to_string()));
            }
            (Some(_), Some(_)) => {
                let tags: Vec<&str> = obj.keys().map(String::as_str).collect();
                return Err(CodecError::MalformedEnvelope(format!(
                    "multiple tags: {}",
                    tags.join(", ")
                )));
            }
        };

        match tag.as_str() {
            "nullValue" => Ok(TypedValue::Null),
            "booleanValue" => payload
                .as_bool()
                .map(TypedValue::Boolean)
                .ok_or_else(|| malformed(tag, payload)),
            "integerValue" => parse_integer(payload).map(TypedValue::Integer),
            "doubleValue" => parse_double(payload).map(TypedValue::Double),
            "timestampValue" => expect_str(tag, payload).map(TypedValue::Timestamp),
            "stringValue" => expect_str(tag, payload).map(TypedValue::String),
            "bytesValue" => expect_str(tag, payload).map(TypedValue::Bytes),
            "referenceValue" => expect_str(tag, payload).map(TypedValue::Reference),
            "geoPointValue" => {
                let obj = payload.as_object().ok_or_else(|| malformed(tag, payload))?;
                // Zero coordinates are omitted by the server
                let coord = |name: &str| match obj.get(name) {
                    Some(v) => parse_double(v),
                    None => Ok(0.0),
                };
                Ok(TypedValue::GeoPoint {
                    latitude: coord("latitude")?,
                    longitude: coord("longitude")?,
                })
            }
            "arrayValue" => {
                let obj = payload.as_object().ok_or_else(|| malformed(tag, payload))?;
                match obj.get("values") {
                    None => Ok(TypedValue::Array(Vec::new())),
                    Some(Json::Array(items)) => items
                        .iter()
                        .map(TypedValue::from_json)
                        .collect::<CodecResult<Vec<_>>>()
                        .map(TypedValue::Array),
                    Some(other) => Err(malformed(tag, other)),
                }
            }
            "mapValue" => {
                let obj = payload.as_object().ok_or_else(|| malformed(tag, payload))?;
                match obj.get("fields") {
                    None => Ok(TypedValue::Map(TypedFields::new())),
                    Some(Json::Object(fields)) => fields_from_json(fields).map(TypedValue::Map),
                    Some(other) => Err(malformed(tag, other)),
                }
            }
            other => Err(CodecError::UnknownVariant(other.to_string())),
        }
    }
}

/// Serialise a wire field map
pub fn fields_to_json(fields: &TypedFields) -> Map<String, Json> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}

/// Parse a wire field map
pub fn fields_from_json(fields: &Map<String, Json>) -> CodecResult<TypedFields> {
    fields
        .iter()
        .map(|(k, v)| TypedValue::from_json(v).map(|tv| (k.clone(), tv)))
        .collect()
}

fn double_to_json(d: f64) -> Json {
    match Number::from_f64(d) {
        Some(n) => Json::Number(n),
        None if d.is_nan() => Json::String("NaN".to_string()),
        None if d > 0.0 => Json::String("Infinity".to_string()),
        None => Json::String("-Infinity".to_string()),
    }
}

fn parse_integer(payload: &Json) -> CodecResult<i64> {
    match payload {
        Json::String(s) => s
            .parse::<i64>()
            .map_err(|_| CodecError::InvalidInteger(s.clone())),
        Json::Number(n) => n
            .as_i64()
            .ok_or_else(|| CodecError::InvalidInteger(n.to_string())),
        other => Err(CodecError::InvalidInteger(other.to_string())),
    }
}

fn parse_double(payload: &Json) -> CodecResult<f64> {
    match payload {
        Json::Number(n) => n
            .as_f64()
            .ok_or_else(|| CodecError::InvalidDouble(n.to_string())),
        Json::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => Err(CodecError::InvalidDouble(s.clone())),
        },
        other => Err(CodecError::InvalidDouble(other.to_string())),
    }
}

fn expect_str(tag: &str, payload: &Json) -> CodecResult<String> {
    payload
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(tag, payload))
}

fn malformed(tag: &str, payload: &Json) -> CodecError {
    CodecError::MalformedEnvelope(format!("{}: unexpected payload {}", tag, payload))
}
