//! # Write Sentinels
//!
//! Values that only make sense inside a write: server-side transforms and
//! field deletion. They never appear in read results.

use std::collections::BTreeMap;

use serde_json::{json, Value as Json};

use super::codec::encode;
use super::errors::{CodecError, CodecResult};
use super::types::{Fields, GeoPoint, Timestamp, Value};
use crate::path::{DocumentPath, FieldPath};

/// Data supplied to `set`/`update`: plain values mixed with sentinels
pub type WriteFields = BTreeMap<String, FieldValue>;

/// A value in a write
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    /// Replaced by the commit time on the server
    ServerTimestamp,
    /// Removes the field; only valid in `update` and merge `set`
    Delete,
    /// Adds to the current numeric value (missing counts as 0)
    Increment(Value),
    /// Appends elements not already present
    ArrayUnion(Vec<Value>),
    /// Removes every occurrence of the given elements
    ArrayRemove(Vec<Value>),
}

impl FieldValue {
    pub fn server_timestamp() -> Self {
        FieldValue::ServerTimestamp
    }

    pub fn delete() -> Self {
        FieldValue::Delete
    }

    /// Numeric increment; non-numeric operands are rejected at encode time
    pub fn increment(by: impl Into<Value>) -> Self {
        FieldValue::Increment(by.into())
    }

    pub fn array_union<T: Into<Value>>(values: Vec<T>) -> Self {
        FieldValue::ArrayUnion(values.into_iter().map(Into::into).collect())
    }

    pub fn array_remove<T: Into<Value>>(values: Vec<T>) -> Self {
        FieldValue::ArrayRemove(values.into_iter().map(Into::into).collect())
    }

    /// Whether this is a server-side transform (as opposed to a plain value
    /// or a delete)
    pub fn is_transform(&self) -> bool {
        matches!(
            self,
            FieldValue::ServerTimestamp
                | FieldValue::Increment(_)
                | FieldValue::ArrayUnion(_)
                | FieldValue::ArrayRemove(_)
        )
    }

    /// Wire `FieldTransform` for transform sentinels, `None` otherwise
    pub fn transform_json(&self, field_path: &FieldPath) -> CodecResult<Option<Json>> {
        let path = field_path.canonical();
        let transform = match self {
            FieldValue::Value(_) | FieldValue::Delete => return Ok(None),
            FieldValue::ServerTimestamp => json!({
                "fieldPath": path,
                "setToServerValue": "REQUEST_TIME",
            }),
            FieldValue::Increment(by) => {
                if !matches!(by, Value::Integer(_) | Value::Double(_)) {
                    return Err(CodecError::Unsupported(format!(
                        "increment by {} value",
                        by.kind()
                    )));
                }
                json!({ "fieldPath": path, "increment": encode(by)?.to_json() })
            }
            FieldValue::ArrayUnion(values) => json!({
                "fieldPath": path,
                "appendMissingElements": { "values": encode_all(values)? },
            }),
            FieldValue::ArrayRemove(values) => json!({
                "fieldPath": path,
                "removeAllFromArray": { "values": encode_all(values)? },
            }),
        };
        Ok(Some(transform))
    }
}

fn encode_all(values: &[Value]) -> CodecResult<Vec<Json>> {
    values.iter().map(|v| encode(v).map(|tv| tv.to_json())).collect()
}

/// Lift plain document data into write data
pub fn write_fields(fields: Fields) -> WriteFields {
    fields
        .into_iter()
        .map(|(k, v)| (k, FieldValue::Value(v)))
        .collect()
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Value(v)
    }
}

macro_rules! field_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::Value(Value::from(v))
                }
            }
        )*
    };
}

field_value_from!(
    bool,
    i32,
    i64,
    u32,
    f64,
    &str,
    String,
    Timestamp,
    GeoPoint,
    DocumentPath,
    Fields,
    Vec<Value>,
);

/// Anything accepted as write data: plain fields, write fields with
/// sentinels, or an array of pairs
pub trait IntoWriteFields {
    fn into_write_fields(self) -> WriteFields;
}

impl IntoWriteFields for WriteFields {
    fn into_write_fields(self) -> WriteFields {
        self
    }
}

impl IntoWriteFields for Fields {
    fn into_write_fields(self) -> WriteFields {
        write_fields(self)
    }
}

impl<K, V, const N: usize> IntoWriteFields for [(K, V); N]
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn into_write_fields(self) -> WriteFields {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K, V> IntoWriteFields for Vec<(K, V)>
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn into_write_fields(self) -> WriteFields {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}
