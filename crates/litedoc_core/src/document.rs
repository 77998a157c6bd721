//! Documents, revisions and document bodies.

use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionSpec, RevisionFlags, RevisionId, SequenceNumber};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document body: a JSON object with its property order preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body(Map<String, Value>);

impl Body {
    /// Creates an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON object.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parses JSON5 text. The top-level value must be an object.
    pub fn from_json5(text: &str) -> CoreResult<Self> {
        let value: Value =
            json5::from_str(text).map_err(|e| CoreError::invalid_json(e.to_string()))?;
        Self::from_value(value)
    }

    /// Parses strict JSON text. The top-level value must be an object.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CoreError::invalid_json(e.to_string()))?;
        Self::from_value(value)
    }

    /// Converts a JSON value, rejecting anything but an object.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CoreError::invalid_json(format!(
                "document body must be an object, not {}",
                value_kind(&other)
            ))),
        }
    }

    /// Returns the value of a top-level property.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the underlying object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the body, returning the underlying object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Number of top-level properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the body has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON rendering.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Bytes fed to the revision digest.
    pub(crate) fn canonical_bytes(&self) -> Vec<u8> {
        self.to_json().into_bytes()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Builds a new body by copying an existing dictionary and adding keys.
///
/// ```rust,ignore
/// let mut enc = DictEncoder::new();
/// enc.copy_from(parsed.as_map());
/// enc.write_at_path("attachments.photo", blob_ref)?;
/// let body = enc.finish();
/// ```
#[derive(Debug, Default)]
pub struct DictEncoder {
    map: Map<String, Value>,
}

impl DictEncoder {
    /// Creates an encoder for an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every property of `dict`, in order.
    pub fn copy_from(&mut self, dict: &Map<String, Value>) -> &mut Self {
        for (key, value) in dict {
            self.map.insert(key.clone(), value.clone());
        }
        self
    }

    /// Writes a top-level key, replacing any previous value.
    pub fn write(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.map.insert(key.into(), value);
        self
    }

    /// Writes a value at a dot-separated property path.
    ///
    /// Missing intermediate objects are created. An intermediate property
    /// that exists but is not an object is an error.
    pub fn write_at_path(&mut self, path: &str, value: Value) -> CoreResult<&mut Self> {
        match path.rsplit_once('.') {
            Some((parent, key)) => self.write_nested(Some(parent), key, value),
            None => self.write_nested(None, path, value),
        }
    }

    /// Writes `key` literally inside the object at `parent_path`, or at the
    /// top level when there is no parent path.
    ///
    /// The parent path is dot-separated and its missing objects are created.
    /// Dots in `key` are not split.
    pub fn write_nested(
        &mut self,
        parent_path: Option<&str>,
        key: &str,
        value: Value,
    ) -> CoreResult<&mut Self> {
        if key.is_empty() {
            return Err(CoreError::invalid_operation("empty property name"));
        }
        let mut target = &mut self.map;
        for segment in parent_path.into_iter().flat_map(|p| p.split('.')) {
            if segment.is_empty() {
                return Err(CoreError::invalid_operation(format!(
                    "invalid property path {:?}",
                    parent_path.unwrap_or_default()
                )));
            }
            let slot = target
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            target = match slot {
                Value::Object(inner) => inner,
                _ => {
                    return Err(CoreError::invalid_operation(format!(
                        "property {segment:?} is not an object"
                    )))
                }
            };
        }
        target.insert(key.to_string(), value);
        Ok(self)
    }

    /// Finishes encoding.
    #[must_use]
    pub fn finish(self) -> Body {
        Body(self.map)
    }
}

/// One saved revision of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Revision ID.
    pub rev_id: RevisionId,
    /// Sequence at which the revision was saved.
    pub sequence: SequenceNumber,
    /// Revision flags.
    pub flags: RevisionFlags,
    /// Revision body (empty for tombstones).
    pub body: Body,
}

impl Revision {
    /// Returns `true` if this revision is a tombstone.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(RevisionFlags::DELETED)
    }
}

/// A handle to a document's current revision.
///
/// A document that was never saved (or was purged) has no current revision;
/// [`exists`](Self::exists) reports `false` for it. A tombstone exists but is
/// [`deleted`](Self::is_deleted).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    collection: CollectionSpec,
    doc_id: String,
    current: Option<Revision>,
}

impl Document {
    pub(crate) fn new(
        collection: CollectionSpec,
        doc_id: impl Into<String>,
        current: Option<Revision>,
    ) -> Self {
        Self {
            collection,
            doc_id: doc_id.into(),
            current,
        }
    }

    /// Returns the document ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.doc_id
    }

    /// Returns the collection the document belongs to.
    #[must_use]
    pub fn collection(&self) -> &CollectionSpec {
        &self.collection
    }

    /// Returns `true` if the store has any record of the document.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.current.is_some()
    }

    /// Returns `true` if the current revision is a tombstone.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.current.as_ref().is_some_and(Revision::is_deleted)
    }

    /// Returns `true` if the document exists and is not deleted.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.exists() && !self.is_deleted()
    }

    /// Returns the current revision, if any.
    #[must_use]
    pub fn revision(&self) -> Option<&Revision> {
        self.current.as_ref()
    }

    /// Returns the current revision ID.
    #[must_use]
    pub fn rev_id(&self) -> Option<&RevisionId> {
        self.current.as_ref().map(|r| &r.rev_id)
    }

    /// Returns the sequence of the current revision.
    #[must_use]
    pub fn sequence(&self) -> Option<SequenceNumber> {
        self.current.as_ref().map(|r| r.sequence)
    }

    /// Returns the flags of the current revision.
    #[must_use]
    pub fn flags(&self) -> RevisionFlags {
        self.current
            .as_ref()
            .map_or(RevisionFlags::NONE, |r| r.flags)
    }

    /// Returns the body of the current revision.
    #[must_use]
    pub fn body(&self) -> Option<&Body> {
        self.current.as_ref().map(|r| &r.body)
    }
}
