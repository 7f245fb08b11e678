//! # Value Codec
//!
//! Native values, the typed wire envelope, and the pure functions mapping
//! between them.

pub mod codec;
pub mod convert;
pub mod errors;
pub mod field_value;
pub mod typed;
pub mod types;

pub use codec::{decode, decode_fields, encode, encode_fields};
pub use convert::{from_fields, to_fields, MAX_SAFE_INTEGER};
pub use errors::{CodecError, CodecResult};
pub use field_value::{write_fields, FieldValue, IntoWriteFields, WriteFields};
pub use typed::{fields_from_json, fields_to_json, TypedFields, TypedValue};
pub use types::{fields, Fields, GeoPoint, Timestamp, Value};
