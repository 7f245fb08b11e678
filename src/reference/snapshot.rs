//! # Snapshots
//!
//! Immutable results of reads. A snapshot is built once from the wire
//! document and never changes afterwards.

use serde::de::DeserializeOwned;

use crate::errors::FirestoreResult;
use crate::path::{DocumentPath, FieldPath};
use crate::rest::DocumentBody;
use crate::value::{decode_fields, fields_from_json, from_fields, Fields, Timestamp, Value};

/// A document as read at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    path: DocumentPath,
    exists: bool,
    fields: Fields,
    create_time: Option<Timestamp>,
    update_time: Option<Timestamp>,
    read_time: Option<Timestamp>,
}

impl DocumentSnapshot {
    /// Decode a wire document
    pub(crate) fn from_body(body: &DocumentBody, read_time: Option<&str>) -> FirestoreResult<Self> {
        let path = DocumentPath::parse(&body.name)?;
        let fields = decode_fields(&fields_from_json(&body.fields)?)?;

        Ok(Self {
            path,
            exists: true,
            fields,
            create_time: parse_time(body.create_time.as_deref())?,
            update_time: parse_time(body.update_time.as_deref())?,
            read_time: parse_time(read_time)?,
        })
    }

    /// Snapshot of a document that does not exist
    pub(crate) fn missing(path: DocumentPath, read_time: Option<&str>) -> FirestoreResult<Self> {
        Ok(Self {
            path,
            exists: false,
            fields: Fields::new(),
            create_time: None,
            update_time: None,
            read_time: parse_time(read_time)?,
        })
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Field map, `None` when the document does not exist
    pub fn data(&self) -> Option<&Fields> {
        self.exists.then_some(&self.fields)
    }

    /// Consume the snapshot, returning its fields (empty when missing)
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Look up a (dotted) field path
    pub fn get(&self, field: &str) -> Option<&Value> {
        let path = FieldPath::parse(field).ok()?;
        let (first, rest) = path.segments().split_first()?;
        rest.iter()
            .try_fold(self.fields.get(first)?, |value, segment| value.get(segment))
    }

    /// Deserialize the fields into an application type; `None` when the
    /// document does not exist
    pub fn data_as<T: DeserializeOwned>(&self) -> FirestoreResult<Option<T>> {
        if !self.exists {
            return Ok(None);
        }
        Ok(Some(from_fields(&self.fields)?))
    }

    pub fn create_time(&self) -> Option<Timestamp> {
        self.create_time
    }

    /// Version marker usable in a `Precondition::UpdateTime`
    pub fn update_time(&self) -> Option<Timestamp> {
        self.update_time
    }

    pub fn read_time(&self) -> Option<Timestamp> {
        self.read_time
    }
}

/// Result of a query or collection listing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySnapshot {
    docs: Vec<DocumentSnapshot>,
    read_time: Option<Timestamp>,
}

impl QuerySnapshot {
    pub(crate) fn new(docs: Vec<DocumentSnapshot>, read_time: Option<Timestamp>) -> Self {
        Self { docs, read_time }
    }

    pub fn docs(&self) -> &[DocumentSnapshot] {
        &self.docs
    }

    pub fn into_docs(self) -> Vec<DocumentSnapshot> {
        self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentSnapshot> {
        self.docs.iter()
    }

    pub fn read_time(&self) -> Option<Timestamp> {
        self.read_time
    }
}

impl<'a> IntoIterator for &'a QuerySnapshot {
    type Item = &'a DocumentSnapshot;
    type IntoIter = std::slice::Iter<'a, DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}

pub(crate) fn parse_time(text: Option<&str>) -> FirestoreResult<Option<Timestamp>> {
    Ok(text.map(Timestamp::parse).transpose()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn body() -> DocumentBody {
        serde_json::from_value(json!({
            "name": "projects/demo/databases/(default)/documents/users/alice",
            "fields": {
                "name": {"stringValue": "Alice"},
                "score": {"integerValue": "42"},
                "address": {"mapValue": {"fields": {"city": {"stringValue": "Oslo"}}}}
            },
            "createTime": "2024-01-01T00:00:00.000001Z",
            "updateTime": "2024-01-02T00:00:00.000002Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_snapshot_from_body() {
        let snap = DocumentSnapshot::from_body(&body(), None).unwrap();

        assert!(snap.exists());
        assert_eq!(snap.id(), "alice");
        assert_eq!(snap.get("score"), Some(&Value::Integer(42)));
        assert_eq!(snap.get("address.city"), Some(&Value::from("Oslo")));
        assert_eq!(snap.get("address.zip"), None);
        assert_eq!(snap.update_time().unwrap().nanos(), 2000);
    }

    #[test]
    fn test_missing_snapshot() {
        let path = DocumentPath::parse("projects/demo/databases/(default)/documents/users/bob")
            .unwrap();
        let snap = DocumentSnapshot::missing(path, Some("2024-01-01T00:00:00Z")).unwrap();

        assert!(!snap.exists());
        assert!(snap.data().is_none());
        assert!(snap.update_time().is_none());
        assert!(snap.read_time().is_some());
    }

    #[test]
    fn test_data_as_struct() {
        #[derive(Deserialize)]
        struct User {
            name: String,
            score: i64,
        }

        let snap = DocumentSnapshot::from_body(&body(), None).unwrap();
        let user: User = snap.data_as().unwrap().unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(user.score, 42);
    }

    #[test]
    fn test_unknown_variant_fails_snapshot() {
        let mut body = body();
        body.fields
            .insert("future".to_string(), json!({"vectorValue": {}}));
        assert!(DocumentSnapshot::from_body(&body, None).is_err());
    }
}
