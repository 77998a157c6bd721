//! Exclusive write transactions.
//!
//! A [`Transaction`] holds the database's write lock and mutates a private
//! copy of the committed snapshot. Nothing is visible to readers until
//! [`commit`](Transaction::commit) has persisted the copy and published it.
//! Dropping a transaction without committing rolls it back.

use crate::database::Database;
use crate::document::{Body, Document, Revision};
use crate::error::{CoreError, CoreResult};
use crate::snapshot::{CollectionState, Snapshot};
use crate::types::{CollectionSpec, RevisionFlags, RevisionId, SequenceNumber, TransactionId};
use parking_lot::MutexGuard;
use tracing::debug;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

/// An active write transaction.
pub struct Transaction<'db> {
    db: &'db Database,
    id: TransactionId,
    working: Snapshot,
    state: TransactionState,
    dirty: bool,
    _write_guard: MutexGuard<'db, ()>,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(
        db: &'db Database,
        id: TransactionId,
        working: Snapshot,
        write_guard: MutexGuard<'db, ()>,
    ) -> Self {
        debug!(txn = %id, "began transaction");
        Self {
            db,
            id,
            working,
            state: TransactionState::Active,
            dirty: false,
            _write_guard: write_guard,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Reads a document as seen by this transaction.
    ///
    /// A document that doesn't exist is returned as a handle whose
    /// [`Document::exists`] is `false`.
    pub fn get_document(&self, spec: &CollectionSpec, doc_id: &str) -> CoreResult<Document> {
        let collection = self.collection(spec)?;
        Ok(Document::new(
            spec.clone(),
            doc_id,
            collection.documents.get(doc_id).cloned(),
        ))
    }

    /// Saves a new revision of `doc`.
    ///
    /// `doc` must be the handle's current state: if another revision was
    /// saved since it was read, this fails with `Conflict`. A missing body is
    /// saved as an empty object. Returns the updated handle.
    pub fn update_document(
        &mut self,
        doc: &Document,
        body: Option<Body>,
        flags: RevisionFlags,
    ) -> CoreResult<Document> {
        self.ensure_active()?;
        if doc.id().is_empty() {
            return Err(CoreError::invalid_operation("document ID must not be empty"));
        }
        let spec = doc.collection().clone();
        let current = self
            .collection(&spec)?
            .documents
            .get(doc.id())
            .map(|r| r.rev_id.clone());
        if current.as_ref() != doc.rev_id() {
            return Err(CoreError::Conflict {
                doc_id: doc.id().to_string(),
            });
        }

        let body = body.unwrap_or_default();
        let deleted = flags.contains(RevisionFlags::DELETED);
        let rev_id = RevisionId::derive(current.as_ref(), deleted, &body.canonical_bytes());
        let sequence = self.working.next_sequence();
        let revision = Revision {
            rev_id,
            sequence,
            flags,
            body,
        };

        self.collection_mut(&spec)?
            .documents
            .insert(doc.id().to_string(), revision.clone());
        self.dirty = true;
        debug!(txn = %self.id, doc_id = doc.id(), %sequence, deleted, "saved revision");
        Ok(Document::new(spec, doc.id(), Some(revision)))
    }

    /// Removes every trace of a document, leaving no tombstone.
    ///
    /// Fails with `DocumentNotFound` if the store has no record of it.
    pub fn purge_document(&mut self, spec: &CollectionSpec, doc_id: &str) -> CoreResult<()> {
        self.ensure_active()?;
        if self.collection_mut(spec)?.documents.remove(doc_id).is_none() {
            return Err(CoreError::document_not_found(doc_id));
        }
        self.dirty = true;
        debug!(txn = %self.id, doc_id, "purged document");
        Ok(())
    }

    /// Creates a collection. Returns `false` if it already existed.
    pub fn create_collection(&mut self, spec: &CollectionSpec) -> CoreResult<bool> {
        self.ensure_active()?;
        let created = self.working.create_collection(spec);
        self.dirty |= created;
        Ok(created)
    }

    /// Deletes a collection and all of its documents.
    pub fn delete_collection(&mut self, spec: &CollectionSpec) -> CoreResult<()> {
        self.ensure_active()?;
        if spec.is_default() {
            return Err(CoreError::invalid_operation(
                "the default collection cannot be deleted",
            ));
        }
        let removed = self
            .working
            .remove_collection(spec)
            .ok_or_else(|| CoreError::collection_not_found(spec.to_string()))?;
        self.dirty = true;
        debug!(txn = %self.id, collection = %spec, documents = removed.documents.len(), "deleted collection");
        Ok(())
    }

    /// Returns `true` if the collection exists in this transaction's view.
    #[must_use]
    pub fn has_collection(&self, spec: &CollectionSpec) -> bool {
        self.working.collection(spec).is_some()
    }

    /// Persists and publishes the changes.
    ///
    /// Returns the database's last sequence after the commit. On error
    /// nothing is published and the transaction is rolled back.
    pub fn commit(mut self) -> CoreResult<SequenceNumber> {
        self.ensure_active()?;
        let last_sequence = self.working.last_sequence;
        if self.dirty {
            self.db.persist(&self.working)?;
            let working = std::mem::take(&mut self.working);
            self.db.publish(working);
        }
        self.state = TransactionState::Committed;
        debug!(txn = %self.id, %last_sequence, "committed transaction");
        Ok(last_sequence)
    }

    /// Discards the changes.
    pub fn abort(mut self) {
        self.state = TransactionState::Aborted;
        debug!(txn = %self.id, "aborted transaction");
    }

    fn collection(&self, spec: &CollectionSpec) -> CoreResult<&CollectionState> {
        self.working
            .collection(spec)
            .ok_or_else(|| CoreError::collection_not_found(spec.to_string()))
    }

    fn collection_mut(&mut self, spec: &CollectionSpec) -> CoreResult<&mut CollectionState> {
        self.working
            .collection_mut(spec)
            .ok_or_else(|| CoreError::collection_not_found(spec.to_string()))
    }

    fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(CoreError::invalid_operation("transaction already aborted"))
            }
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.state == TransactionState::Active {
            debug!(txn = %self.id, dirty = self.dirty, "rolled back transaction");
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Body {
        Body::from_value(value).unwrap()
    }

    #[test]
    fn create_then_update_increments_sequence() {
        let db = Database::open_in_memory().unwrap();
        let spec = CollectionSpec::default();

        let mut txn = db.begin().unwrap();
        let doc = txn.get_document(&spec, "doc1").unwrap();
        assert!(!doc.exists());
        let doc = txn
            .update_document(&doc, Some(body(json!({"a": 1}))), RevisionFlags::NONE)
            .unwrap();
        assert_eq!(doc.sequence(), Some(SequenceNumber::new(1)));
        assert_eq!(doc.rev_id().unwrap().generation(), 1);
        let doc = txn
            .update_document(&doc, Some(body(json!({"a": 2}))), RevisionFlags::NONE)
            .unwrap();
        assert_eq!(doc.sequence(), Some(SequenceNumber::new(2)));
        assert_eq!(doc.rev_id().unwrap().generation(), 2);
        txn.commit().unwrap();

        let stored = db.get_document(&spec, "doc1").unwrap();
        assert_eq!(stored.body().unwrap().get("a"), Some(&json!(2)));
    }

    #[test]
    fn stale_handle_conflicts() {
        let db = Database::open_in_memory().unwrap();
        let spec = CollectionSpec::default();

        let mut txn = db.begin().unwrap();
        let original = txn.get_document(&spec, "doc").unwrap();
        txn.update_document(&original, None, RevisionFlags::NONE)
            .unwrap();
        let err = txn
            .update_document(&original, None, RevisionFlags::NONE)
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[test]
    fn drop_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let spec = CollectionSpec::default();
        {
            let mut txn = db.begin().unwrap();
            let doc = txn.get_document(&spec, "doc").unwrap();
            txn.update_document(&doc, None, RevisionFlags::NONE).unwrap();
        }
        assert!(!db.get_document(&spec, "doc").unwrap().exists());
        assert_eq!(db.last_sequence().as_u64(), 0);
    }

    #[test]
    fn tombstones_and_purge() {
        let db = Database::open_in_memory().unwrap();
        let spec = CollectionSpec::default();

        db.transaction(|txn| {
            let doc = txn.get_document(&spec, "doc")?;
            let doc = txn.update_document(&doc, None, RevisionFlags::NONE)?;
            txn.update_document(&doc, None, RevisionFlags::DELETED)?;
            Ok(())
        })
        .unwrap();
        let doc = db.get_document(&spec, "doc").unwrap();
        assert!(doc.exists());
        assert!(doc.is_deleted());

        db.transaction(|txn| txn.purge_document(&spec, "doc"))
            .unwrap();
        assert!(!db.get_document(&spec, "doc").unwrap().exists());

        let err = db
            .transaction(|txn| txn.purge_document(&spec, "doc"))
            .unwrap_err();
        assert!(matches!(err, CoreError::DocumentNotFound { .. }));
    }

    #[test]
    fn missing_collection() {
        let db = Database::open_in_memory().unwrap();
        let txn = db.begin().unwrap();
        let spec = CollectionSpec::from_path("nope").unwrap();
        assert!(matches!(
            txn.get_document(&spec, "doc"),
            Err(CoreError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn empty_doc_id_rejected() {
        let db = Database::open_in_memory().unwrap();
        let mut txn = db.begin().unwrap();
        let doc = txn.get_document(&CollectionSpec::default(), "").unwrap();
        assert!(txn.update_document(&doc, None, RevisionFlags::NONE).is_err());
    }

    #[test]
    fn default_collection_cannot_be_deleted() {
        let db = Database::open_in_memory().unwrap();
        let mut txn = db.begin().unwrap();
        assert!(matches!(
            txn.delete_collection(&CollectionSpec::default()),
            Err(CoreError::InvalidOperation { .. })
        ));
    }
}
