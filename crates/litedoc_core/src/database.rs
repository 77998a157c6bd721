//! Database facade.

use crate::blob::BlobStore;
use crate::config::Config;
use crate::dir::DatabaseDir;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::snapshot::Snapshot;
use crate::transaction::Transaction;
use crate::types::{CollectionSpec, SequenceNumber, TransactionId};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

/// File name extension of database directories.
pub const DATABASE_FILENAME_EXTENSION: &str = ".litedoc";

/// Generates a random document ID.
#[must_use]
pub fn generate_doc_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The main database handle.
///
/// A `Database` owns the committed snapshot of a store, its blob files and
/// the directory lock. Reads always see the last committed state. Writes go
/// through a [`Transaction`], and only one transaction can be active at a time.
///
/// ```rust,ignore
/// use litedoc_core::{Body, CollectionSpec, Database, RevisionFlags};
/// use std::path::Path;
///
/// let db = Database::open(Path::new("notes.litedoc"))?;
/// let spec = CollectionSpec::default_collection();
/// db.transaction(|txn| {
///     let doc = txn.get_document(&spec, "todo")?;
///     txn.update_document(&doc, Some(Body::from_json5("{done: false}")?), RevisionFlags::NONE)?;
///     Ok(())
/// })?;
/// ```
///
/// For tests, use [`Database::open_in_memory`].
pub struct Database {
    /// Configuration.
    config: Config,
    /// Database directory (holds the lock). None for in-memory databases.
    dir: Option<DatabaseDir>,
    /// Last committed state.
    state: RwLock<Snapshot>,
    /// Held by the active transaction.
    write_lock: Mutex<()>,
    /// Blob storage.
    blobs: BlobStore,
    next_txid: AtomicU64,
    /// Whether the database is open.
    is_open: RwLock<bool>,
}

impl Database {
    /// Opens or creates a database directory with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another handle has the database locked (`DatabaseLocked`)
    /// - The snapshot is unreadable or of an incompatible version
    /// - I/O errors occur
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a database directory with a custom configuration.
    ///
    /// ```rust,ignore
    /// let config = Config::default().create_if_missing(false).read_only(true);
    /// let db = Database::open_with_config(Path::new("notes.litedoc"), config)?;
    /// ```
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        let create_if_missing = config.create_if_missing && !config.read_only;
        let dir = DatabaseDir::open(path, create_if_missing)?;

        if !create_if_missing && dir.is_new_database() {
            return Err(CoreError::invalid_format(format!(
                "no database at {}",
                path.display()
            )));
        }
        if config.error_if_exists && !dir.is_new_database() {
            return Err(CoreError::invalid_format(format!(
                "database already exists at {}",
                path.display()
            )));
        }

        let snapshot = match dir.load_snapshot()? {
            Some(snapshot) => {
                if snapshot.format_version.0 != config.format_version.0 {
                    return Err(CoreError::invalid_format(format!(
                        "unsupported format version {}.{} (expected {}.x)",
                        snapshot.format_version.0,
                        snapshot.format_version.1,
                        config.format_version.0
                    )));
                }
                snapshot
            }
            None => {
                let snapshot = Snapshot::new(config.format_version);
                dir.save_snapshot(&snapshot, config.sync_on_commit)?;
                info!(path = %path.display(), uuid = %snapshot.uuid, "created database");
                snapshot
            }
        };

        let blobs = BlobStore::on_disk(dir.attachments_dir(), config.read_only);
        debug!(
            path = %path.display(),
            last_sequence = %snapshot.last_sequence,
            read_only = config.read_only,
            "opened database"
        );
        Ok(Self::from_parts(config, Some(dir), snapshot, blobs))
    }

    /// Creates a database that lives only in memory.
    pub fn open_in_memory() -> CoreResult<Self> {
        let config = Config::default();
        let snapshot = Snapshot::new(config.format_version);
        Ok(Self::from_parts(config, None, snapshot, BlobStore::in_memory()))
    }

    fn from_parts(
        config: Config,
        dir: Option<DatabaseDir>,
        snapshot: Snapshot,
        blobs: BlobStore,
    ) -> Self {
        Self {
            config,
            dir,
            state: RwLock::new(snapshot),
            write_lock: Mutex::new(()),
            blobs,
            next_txid: AtomicU64::new(1),
            is_open: RwLock::new(true),
        }
    }

    /// Begins a write transaction.
    ///
    /// Fails with `InvalidOperation` if another transaction is still active.
    pub fn begin(&self) -> CoreResult<Transaction<'_>> {
        self.ensure_open()?;
        if self.config.read_only {
            return Err(CoreError::ReadOnly);
        }
        let guard = self.write_lock.try_lock().ok_or_else(|| {
            CoreError::invalid_operation("another transaction is already active")
        })?;
        let id = TransactionId::new(self.next_txid.fetch_add(1, Ordering::Relaxed));
        let working = self.state.read().clone();
        Ok(Transaction::new(self, id, working, guard))
    }

    /// Executes a function within a transaction.
    ///
    /// If the function returns `Ok`, the transaction is committed.
    /// If it returns `Err`, the transaction is aborted.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> CoreResult<T>,
    {
        let mut txn = self.begin()?;
        match f(&mut txn) {
            Ok(result) => {
                txn.commit()?;
                Ok(result)
            }
            Err(e) => {
                txn.abort();
                Err(e)
            }
        }
    }

    /// Reads the committed state of a document.
    pub fn get_document(&self, spec: &CollectionSpec, doc_id: &str) -> CoreResult<Document> {
        self.ensure_open()?;
        let state = self.state.read();
        let collection = state
            .collection(spec)
            .ok_or_else(|| CoreError::collection_not_found(spec.to_string()))?;
        Ok(Document::new(
            spec.clone(),
            doc_id,
            collection.documents.get(doc_id).cloned(),
        ))
    }

    /// Returns the live (non-deleted) documents of a collection in sequence
    /// order.
    pub fn documents(&self, spec: &CollectionSpec) -> CoreResult<Vec<Document>> {
        self.ensure_open()?;
        let state = self.state.read();
        let collection = state
            .collection(spec)
            .ok_or_else(|| CoreError::collection_not_found(spec.to_string()))?;
        let mut docs: Vec<Document> = collection
            .documents
            .iter()
            .filter(|(_, rev)| !rev.is_deleted())
            .map(|(id, rev)| Document::new(spec.clone(), id.as_str(), Some(rev.clone())))
            .collect();
        docs.sort_by_key(|doc| doc.sequence());
        Ok(docs)
    }

    /// Number of live documents in a collection.
    pub fn document_count(&self, spec: &CollectionSpec) -> CoreResult<usize> {
        self.ensure_open()?;
        let state = self.state.read();
        let collection = state
            .collection(spec)
            .ok_or_else(|| CoreError::collection_not_found(spec.to_string()))?;
        Ok(collection
            .documents
            .values()
            .filter(|rev| !rev.is_deleted())
            .count())
    }

    /// Lists all collections, the default collection included.
    pub fn collections(&self) -> CoreResult<Vec<CollectionSpec>> {
        self.ensure_open()?;
        self.state.read().collection_specs()
    }

    /// Returns `true` if the collection exists.
    #[must_use]
    pub fn has_collection(&self, spec: &CollectionSpec) -> bool {
        self.state.read().collection(spec).is_some()
    }

    /// Creates a collection. Returns `false` if it already existed.
    pub fn create_collection(&self, spec: &CollectionSpec) -> CoreResult<bool> {
        self.transaction(|txn| txn.create_collection(spec))
    }

    /// Deletes a collection and every document in it.
    ///
    /// Fails with `CollectionNotFound` if there is no such collection.
    pub fn delete_collection(&self, spec: &CollectionSpec) -> CoreResult<()> {
        self.transaction(|txn| txn.delete_collection(spec))
    }

    /// Returns the blob store.
    #[must_use]
    pub fn blob_store(&self) -> &BlobStore {
        &self.blobs
    }

    /// Highest committed sequence.
    #[must_use]
    pub fn last_sequence(&self) -> SequenceNumber {
        self.state.read().last_sequence
    }

    /// Identity of the database, fixed at creation.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.state.read().uuid
    }

    /// Returns the database directory, or `None` for in-memory databases.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(DatabaseDir::path)
    }

    /// Returns database configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Closes the database.
    ///
    /// Every later operation fails with `DatabaseClosed`. The directory lock
    /// is released when the handle is dropped.
    pub fn close(&self) -> CoreResult<()> {
        let mut is_open = self.is_open.write();
        if *is_open {
            *is_open = false;
            debug!(path = ?self.path(), "closed database");
        }
        Ok(())
    }

    /// Checks if the database is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if *self.is_open.read() {
            Ok(())
        } else {
            Err(CoreError::DatabaseClosed)
        }
    }

    /// Writes a transaction's state to disk.
    pub(crate) fn persist(&self, snapshot: &Snapshot) -> CoreResult<()> {
        self.ensure_open()?;
        if let Some(dir) = &self.dir {
            dir.save_snapshot(snapshot, self.config.sync_on_commit)?;
        }
        Ok(())
    }

    /// Makes a persisted state visible to readers.
    pub(crate) fn publish(&self, snapshot: Snapshot) {
        *self.state.write() = snapshot;
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path())
            .field("config", &self.config)
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}
