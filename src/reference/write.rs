//! # Pending Writes
//!
//! A buffered mutation and its translation to the wire `Write` resource.
//! Direct reference writes send one of these in a single-write commit;
//! transactions buffer them and send them together.

use serde_json::{json, Map, Value as Json};

use crate::errors::{FirestoreError, FirestoreResult};
use crate::path::{DocumentPath, FieldPath};
use crate::value::{encode_fields, fields_to_json, FieldValue, Fields, Timestamp, Value, WriteFields};

/// Condition the server checks before applying a write
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// Document must (or must not) exist
    Exists(bool),
    /// Document's last update time must match exactly
    UpdateTime(Timestamp),
}

impl Precondition {
    fn to_json(&self) -> FirestoreResult<Json> {
        Ok(match self {
            Precondition::Exists(exists) => json!({ "exists": exists }),
            Precondition::UpdateTime(ts) => json!({ "updateTime": ts.to_rfc3339()? }),
        })
    }
}

/// How `update` and `delete` treat missing documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePolicy {
    /// `update` on a missing document fails with `NotFound` (otherwise it
    /// creates the document)
    pub update_must_exist: bool,

    /// `delete` on a missing document fails with `NotFound` (otherwise it
    /// succeeds silently)
    pub delete_must_exist: bool,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            update_must_exist: true,
            delete_must_exist: false,
        }
    }
}

impl WritePolicy {
    /// Precondition for an update, honouring an explicit one first
    pub fn update_precondition(&self, explicit: Option<Precondition>) -> Option<Precondition> {
        explicit.or(if self.update_must_exist {
            Some(Precondition::Exists(true))
        } else {
            None
        })
    }

    /// Precondition for a delete, honouring an explicit one first
    pub fn delete_precondition(&self, explicit: Option<Precondition>) -> Option<Precondition> {
        explicit.or(if self.delete_must_exist {
            Some(Precondition::Exists(true))
        } else {
            None
        })
    }
}

/// A buffered mutation
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    /// Replace the document (or merge the given top-level fields)
    Set {
        path: DocumentPath,
        data: WriteFields,
        merge: bool,
        precondition: Option<Precondition>,
    },
    /// Change only the given (dotted) field paths
    Update {
        path: DocumentPath,
        data: WriteFields,
        precondition: Option<Precondition>,
    },
    Delete {
        path: DocumentPath,
        precondition: Option<Precondition>,
    },
}

impl PendingWrite {
    pub fn path(&self) -> &DocumentPath {
        match self {
            PendingWrite::Set { path, .. }
            | PendingWrite::Update { path, .. }
            | PendingWrite::Delete { path, .. } => path,
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            PendingWrite::Set { merge: false, .. } => "set",
            PendingWrite::Set { merge: true, .. } => "set_merge",
            PendingWrite::Update { .. } => "update",
            PendingWrite::Delete { .. } => "delete",
        }
    }

    /// Translate to the wire `Write` resource
    pub fn to_json(&self) -> FirestoreResult<Json> {
        let mut write = Map::new();

        let precondition = match self {
            PendingWrite::Set {
                path,
                data,
                merge,
                precondition,
            } => {
                let entries = data
                    .iter()
                    .map(|(k, v)| Ok((FieldPath::new([k.as_str()])?, v)))
                    .collect::<FirestoreResult<Vec<_>>>()?;
                if !merge && entries.iter().any(|(_, v)| **v == FieldValue::Delete) {
                    return Err(FirestoreError::usage(
                        "FieldValue::delete() is only allowed in update or merge set",
                    ));
                }
                build_document_write(&mut write, path, &entries, *merge)?;
                precondition
            }
            PendingWrite::Update {
                path,
                data,
                precondition,
            } => {
                if data.is_empty() {
                    return Err(FirestoreError::usage("update requires at least one field"));
                }
                let entries = data
                    .iter()
                    .map(|(k, v)| Ok((FieldPath::parse(k)?, v)))
                    .collect::<FirestoreResult<Vec<_>>>()?;
                check_no_prefix_conflicts(&entries)?;
                build_document_write(&mut write, path, &entries, true)?;
                precondition
            }
            PendingWrite::Delete { path, precondition } => {
                write.insert("delete".to_string(), json!(path.resource_name()));
                precondition
            }
        };

        if let Some(precondition) = precondition {
            write.insert("currentDocument".to_string(), precondition.to_json()?);
        }
        Ok(Json::Object(write))
    }
}

/// Fill `update`, `updateMask` and `updateTransforms` of a write
fn build_document_write(
    write: &mut Map<String, Json>,
    path: &DocumentPath,
    entries: &[(FieldPath, &FieldValue)],
    masked: bool,
) -> FirestoreResult<()> {
    let mut fields = Fields::new();
    let mut mask = Vec::new();
    let mut transforms = Vec::new();

    for (field_path, value) in entries {
        match value {
            FieldValue::Value(v) => {
                insert_nested(&mut fields, field_path.segments(), v.clone());
                mask.push(field_path.canonical());
            }
            FieldValue::Delete => mask.push(field_path.canonical()),
            transform => {
                if let Some(t) = transform.transform_json(field_path)? {
                    transforms.push(t);
                }
            }
        }
    }

    let mut document = Map::new();
    document.insert("name".to_string(), json!(path.resource_name()));
    let encoded = encode_fields(&fields)?;
    if !encoded.is_empty() {
        document.insert("fields".to_string(), Json::Object(fields_to_json(&encoded)));
    }
    write.insert("update".to_string(), Json::Object(document));

    if masked {
        write.insert("updateMask".to_string(), json!({ "fieldPaths": mask }));
    }
    if !transforms.is_empty() {
        write.insert("updateTransforms".to_string(), Json::Array(transforms));
    }
    Ok(())
}

fn insert_nested(fields: &mut Fields, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [last] => {
            fields.insert(last.clone(), value);
        }
        [first, rest @ ..] => {
            let entry = fields
                .entry(first.clone())
                .or_insert_with(|| Value::Map(Fields::new()));
            if !matches!(entry, Value::Map(_)) {
                *entry = Value::Map(Fields::new());
            }
            if let Value::Map(inner) = entry {
                insert_nested(inner, rest, value);
            }
        }
    }
}

/// `a` and `a.b` in the same update are ambiguous
fn check_no_prefix_conflicts(entries: &[(FieldPath, &FieldValue)]) -> FirestoreResult<()> {
    for (i, (a, _)) in entries.iter().enumerate() {
        for (b, _) in entries.iter().skip(i + 1) {
            let shorter = a.segments().len().min(b.segments().len());
            if a.segments()[..shorter] == b.segments()[..shorter] {
                return Err(FirestoreError::usage(format!(
                    "conflicting field paths in update: '{}' and '{}'",
                    a, b
                )));
            }
        }
    }
    Ok(())
}
