//! # Native Values
//!
//! The strongly-typed value union application code reads and writes.
//! Field maps are ordered by key; the server treats them as unordered.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use super::errors::{CodecError, CodecResult};
use crate::path::DocumentPath;

/// A document's field map
pub type Fields = BTreeMap<String, Value>;

/// Build a field map from key/value pairs
pub fn fields<I, K, V>(entries: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A native value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    /// Signed 64-bit integer, kept distinct from doubles end to end
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    String(String),
    Bytes(Vec<u8>),
    /// Reference to another document in the same or another database
    Reference(DocumentPath),
    GeoPoint(GeoPoint),
    Array(Vec<Value>),
    Map(Fields),
}

impl Value {
    /// Name of the variant, used in error messages and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::Timestamp(_) => "timestamp",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Reference(_) => "reference",
            Value::GeoPoint(_) => "geopoint",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of either number variant
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Value::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a key when this value is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Double(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(Timestamp::from(v))
    }
}

impl From<GeoPoint> for Value {
    fn from(v: GeoPoint) -> Self {
        Value::GeoPoint(v)
    }
}

impl From<DocumentPath> for Value {
    fn from(v: DocumentPath) -> Self {
        Value::Reference(v)
    }
}

impl From<Fields> for Value {
    fn from(v: Fields) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A point in time with nanosecond precision, always normalised to UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    /// Create a timestamp from epoch seconds and a nanosecond remainder
    pub fn new(seconds: i64, nanos: u32) -> CodecResult<Self> {
        if nanos >= 1_000_000_000 {
            return Err(CodecError::InvalidTimestamp(format!(
                "nanos out of range: {}",
                nanos
            )));
        }
        Ok(Self { seconds, nanos })
    }

    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Parse an RFC 3339 date-time; any zone offset is accepted
    pub fn parse(text: &str) -> CodecResult<Self> {
        DateTime::parse_from_rfc3339(text)
            .map(|dt| Self::from(dt.with_timezone(&Utc)))
            .map_err(|e| CodecError::InvalidTimestamp(format!("{}: {}", text, e)))
    }

    /// Convert to a chrono date-time
    pub fn to_datetime(&self) -> CodecResult<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanos)
            .single()
            .ok_or_else(|| {
                CodecError::InvalidTimestamp(format!("out of range: {}s", self.seconds))
            })
    }

    /// Fixed-precision wire form, e.g. `2024-01-02T03:04:05.000000006Z`
    pub fn to_rfc3339(&self) -> CodecResult<String> {
        Ok(self
            .to_datetime()?
            .to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{}.{:09}", self.seconds, self.nanos),
        }
    }
}

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Create a geopoint, rejecting coordinates outside the valid ranges
    pub fn new(latitude: f64, longitude: f64) -> CodecResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CodecError::InvalidGeoPoint(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CodecError::InvalidGeoPoint(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}
