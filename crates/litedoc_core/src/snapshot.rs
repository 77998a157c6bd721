//! The persisted database state.
//!
//! A database is a single [`Snapshot`]: collection registry, documents with
//! their current revision, and the last assigned sequence. Transactions work
//! on a copy and publish it on commit.

use crate::document::Revision;
use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionSpec, SequenceNumber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Documents of one collection, keyed by document ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CollectionState {
    pub documents: BTreeMap<String, Revision>,
}

/// Complete database contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    /// Format version (major, minor).
    pub format_version: (u16, u16),
    /// Identity of the database, fixed at creation.
    pub uuid: Uuid,
    /// Highest sequence assigned so far.
    pub last_sequence: SequenceNumber,
    /// Collections keyed by `scope/name`.
    pub collections: BTreeMap<String, CollectionState>,
}

impl Snapshot {
    /// Creates the state of a brand-new database.
    pub fn new(format_version: (u16, u16)) -> Self {
        let mut collections = BTreeMap::new();
        collections.insert(
            CollectionSpec::default_collection().to_string(),
            CollectionState::default(),
        );
        Self {
            format_version,
            uuid: Uuid::new_v4(),
            last_sequence: SequenceNumber::default(),
            collections,
        }
    }

    pub fn collection(&self, spec: &CollectionSpec) -> Option<&CollectionState> {
        self.collections.get(&spec.to_string())
    }

    pub fn collection_mut(&mut self, spec: &CollectionSpec) -> Option<&mut CollectionState> {
        self.collections.get_mut(&spec.to_string())
    }

    /// Returns `false` if the collection already existed.
    pub fn create_collection(&mut self, spec: &CollectionSpec) -> bool {
        let key = spec.to_string();
        if self.collections.contains_key(&key) {
            return false;
        }
        self.collections.insert(key, CollectionState::default());
        true
    }

    pub fn remove_collection(&mut self, spec: &CollectionSpec) -> Option<CollectionState> {
        self.collections.remove(&spec.to_string())
    }

    pub fn collection_specs(&self) -> CoreResult<Vec<CollectionSpec>> {
        self.collections
            .keys()
            .map(|key| CollectionSpec::from_path(key))
            .collect()
    }

    /// Assigns and returns the next sequence number.
    pub fn next_sequence(&mut self) -> SequenceNumber {
        self.last_sequence = self.last_sequence.next();
        self.last_sequence
    }

    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        let snapshot: Self = serde_json::from_slice(data)?;
        if snapshot.collections.is_empty() {
            return Err(CoreError::invalid_format("snapshot has no collections"));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Body;
    use crate::types::{RevisionFlags, RevisionId};

    #[test]
    fn new_snapshot_has_default_collection() {
        let snapshot = Snapshot::new((1, 0));
        assert!(snapshot
            .collection(&CollectionSpec::default_collection())
            .is_some());
        assert_eq!(snapshot.last_sequence.as_u64(), 0);
    }

    #[test]
    fn create_and_remove_collections() {
        let mut snapshot = Snapshot::new((1, 0));
        let spec = CollectionSpec::from_path("s/c").unwrap();
        assert!(snapshot.create_collection(&spec));
        assert!(!snapshot.create_collection(&spec));
        assert_eq!(snapshot.collection_specs().unwrap().len(), 2);
        assert!(snapshot.remove_collection(&spec).is_some());
        assert!(snapshot.remove_collection(&spec).is_none());
    }

    #[test]
    fn encode_decode() {
        let mut snapshot = Snapshot::new((1, 0));
        let seq = snapshot.next_sequence();
        let revision = Revision {
            rev_id: RevisionId::derive(None, false, b"{}"),
            sequence: seq,
            flags: RevisionFlags::NONE,
            body: Body::new(),
        };
        snapshot
            .collection_mut(&CollectionSpec::default_collection())
            .unwrap()
            .documents
            .insert("doc".to_string(), revision.clone());

        let decoded = Snapshot::decode(&snapshot.encode().unwrap()).unwrap();
        assert_eq!(decoded.uuid, snapshot.uuid);
        assert_eq!(decoded.last_sequence, seq);
        let doc = &decoded
            .collection(&CollectionSpec::default_collection())
            .unwrap()
            .documents["doc"];
        assert_eq!(doc, &revision);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            Snapshot::decode(b"not json"),
            Err(CoreError::CorruptData(_))
        ));
    }
}
