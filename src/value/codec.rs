//! # Value Codec
//!
//! Bidirectional mapping between native `Value`s and wire `TypedValue`s.
//! Both directions are pure; the only failures are payloads that cannot be
//! represented on the other side.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::errors::{CodecError, CodecResult};
use super::typed::{TypedFields, TypedValue};
use super::types::{Fields, GeoPoint, Timestamp, Value};
use crate::path::DocumentPath;

/// Encode a native value into its wire envelope
pub fn encode(value: &Value) -> CodecResult<TypedValue> {
    Ok(match value {
        Value::Null => TypedValue::Null,
        Value::Boolean(b) => TypedValue::Boolean(*b),
        Value::Integer(i) => TypedValue::Integer(*i),
        Value::Double(d) => TypedValue::Double(*d),
        Value::Timestamp(ts) => TypedValue::Timestamp(ts.to_rfc3339()?),
        Value::String(s) => TypedValue::String(s.clone()),
        Value::Bytes(bytes) => TypedValue::Bytes(STANDARD.encode(bytes)),
        Value::Reference(path) => TypedValue::Reference(path.resource_name()),
        Value::GeoPoint(point) => TypedValue::GeoPoint {
            latitude: point.latitude(),
            longitude: point.longitude(),
        },
        Value::Array(values) => TypedValue::Array(
            values.iter().map(encode).collect::<CodecResult<Vec<_>>>()?,
        ),
        Value::Map(fields) => TypedValue::Map(encode_fields(fields)?),
    })
}

/// Decode a wire envelope into a native value
pub fn decode(value: &TypedValue) -> CodecResult<Value> {
    Ok(match value {
        TypedValue::Null => Value::Null,
        TypedValue::Boolean(b) => Value::Boolean(*b),
        TypedValue::Integer(i) => Value::Integer(*i),
        TypedValue::Double(d) => Value::Double(*d),
        TypedValue::Timestamp(text) => Value::Timestamp(Timestamp::parse(text)?),
        TypedValue::String(s) => Value::String(s.clone()),
        TypedValue::Bytes(text) => Value::Bytes(
            STANDARD
                .decode(text)
                .map_err(|e| CodecError::InvalidBytes(e.to_string()))?,
        ),
        TypedValue::Reference(name) => Value::Reference(DocumentPath::parse(name)?),
        TypedValue::GeoPoint {
            latitude,
            longitude,
        } => Value::GeoPoint(GeoPoint::new(*latitude, *longitude)?),
        TypedValue::Array(values) => {
            Value::Array(values.iter().map(decode).collect::<CodecResult<Vec<_>>>()?)
        }
        TypedValue::Map(fields) => Value::Map(decode_fields(fields)?),
    })
}

/// Encode a document field map; absent keys stay absent
pub fn encode_fields(fields: &Fields) -> CodecResult<TypedFields> {
    fields
        .iter()
        .map(|(k, v)| encode(v).map(|tv| (k.clone(), tv)))
        .collect()
}

/// Decode a document field map
pub fn decode_fields(fields: &TypedFields) -> CodecResult<Fields> {
    fields
        .iter()
        .map(|(k, v)| decode(v).map(|nv| (k.clone(), nv)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::DatabaseId;
    use crate::value::types::fields;

    fn round_trip(value: Value) -> Value {
        decode(&encode(&value).unwrap()).unwrap()
    }

    #[test]
    fn test_scalars_round_trip() {
        for value in [
            Value::Null,
            Value::Boolean(true),
            Value::Integer(i64::MIN),
            Value::Integer(i64::MAX),
            Value::Double(0.1),
            Value::Double(-0.0),
            Value::String("héllo".to_string()),
            Value::Bytes(vec![0, 255, 1, 254]),
        ] {
            assert_eq!(round_trip(value.clone()), value);
        }
    }

    #[test]
    fn test_nan_keeps_kind() {
        match round_trip(Value::Double(f64::NAN)) {
            Value::Double(d) => assert!(d.is_nan()),
            other => panic!("expected double, got {:?}", other),
        }
    }

    #[test]
    fn test_reference_round_trip() {
        let db = DatabaseId::new("demo", "(default)");
        let path = DocumentPath::from_relative(&db, "users/alice").unwrap();
        let value = Value::Reference(path);
        assert_eq!(round_trip(value.clone()), value);
    }

    #[test]
    fn test_nested_containers_round_trip() {
        let value = Value::Map(fields([
            ("list", Value::from(vec![Value::from(1), Value::from("two")])),
            ("empty", Value::Map(Fields::new())),
            ("ts", Value::Timestamp(Timestamp::new(1_700_000_000, 123).unwrap())),
            ("geo", Value::GeoPoint(GeoPoint::new(-33.9, 151.2).unwrap())),
        ]));
        assert_eq!(round_trip(value.clone()), value);
    }

    #[test]
    fn test_absent_and_null_are_distinct() {
        let with_null = fields([("a", Value::Null)]);
        let without = Fields::new();

        let encoded_null = encode_fields(&with_null).unwrap();
        let encoded_absent = encode_fields(&without).unwrap();

        assert_eq!(encoded_null.get("a"), Some(&TypedValue::Null));
        assert!(!encoded_absent.contains_key("a"));
        assert_eq!(decode_fields(&encoded_null).unwrap(), with_null);
        assert_eq!(decode_fields(&encoded_absent).unwrap(), without);
    }

    #[test]
    fn test_malformed_base64_rejected() {
        let err = decode(&TypedValue::Bytes("not*base64".to_string())).unwrap_err();
        assert!(matches!(err, CodecError::InvalidBytes(_)));
    }

    #[test]
    fn test_collection_reference_rejected() {
        let err = decode(&TypedValue::Reference(
            "projects/p/databases/(default)/documents/users".to_string(),
        ))
        .unwrap_err();
        assert!(matches!(err, CodecError::InvalidReference(_)));
    }
}
