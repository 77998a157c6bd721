//! Database endpoint.

use super::{DocRecord, EndpointOptions, Role};
use crate::error::{EndpointError, EndpointResult};
use litedoc_core::{CollectionSpec, Config, CoreError, Database, RevisionFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A LiteDoc database, opened on [`prepare`](Self::prepare).
#[derive(Debug)]
pub struct DbEndpoint {
    path: Option<PathBuf>,
    db: Option<Database>,
    collection: CollectionSpec,
    batch_size: usize,
}

impl DbEndpoint {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: Some(PathBuf::from(path)),
            db: None,
            collection: CollectionSpec::default_collection(),
            batch_size: super::DEFAULT_BATCH_SIZE,
        }
    }

    pub(crate) fn from_database(db: Database) -> Self {
        Self {
            path: None,
            db: Some(db),
            collection: CollectionSpec::default_collection(),
            batch_size: super::DEFAULT_BATCH_SIZE,
        }
    }

    /// Database directory, unless the endpoint wraps an open database.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The open database, once prepared.
    #[must_use]
    pub fn database(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    pub(crate) fn prepare(&mut self, role: Role, options: &EndpointOptions) -> EndpointResult<()> {
        self.collection = options.collection.clone();
        self.batch_size = options.batch_size.max(1);

        if self.db.is_none() {
            let Some(path) = &self.path else {
                return Err(EndpointError::NotPrepared);
            };
            let create = role == Role::Destination && !options.existing;
            if !create && !path.is_dir() {
                return Err(EndpointError::NotFound { path: path.clone() });
            }
            let config = Config::default().create_if_missing(create);
            let db = Database::open_with_config(path, config).map_err(|e| {
                EndpointError::store(format!("Couldn't open database {}", path.display()), e)
            })?;
            info!("Opened database {:?}", path);
            self.db = Some(db);
        }

        let db = self.db()?;
        if !db.has_collection(&self.collection) {
            if role == Role::Source || options.existing {
                return Err(EndpointError::CollectionNotFound {
                    collection: self.collection.to_string(),
                });
            }
            db.create_collection(&self.collection)
                .map_err(|e| EndpointError::store("Couldn't create collection", e))?;
        }
        Ok(())
    }

    pub(crate) fn read(&mut self, limit: Option<usize>) -> EndpointResult<Vec<DocRecord>> {
        let db = self.db()?;
        let docs = db
            .documents(&self.collection)
            .map_err(|e| EndpointError::store("Couldn't enumerate documents", e))?;
        Ok(docs
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .filter_map(|doc| {
                let body = doc.body()?.clone();
                Some(DocRecord {
                    doc_id: doc.id().to_string(),
                    body,
                })
            })
            .collect())
    }

    /// Saves records as create-or-update, one transaction per batch.
    pub(crate) fn write(&mut self, records: &[DocRecord]) -> EndpointResult<usize> {
        let db = self.db()?;
        let spec = &self.collection;
        for batch in records.chunks(self.batch_size) {
            db.transaction(|txn| {
                for record in batch {
                    let doc = txn.get_document(spec, &record.doc_id)?;
                    txn.update_document(&doc, Some(record.body.clone()), RevisionFlags::NONE)?;
                }
                Ok(())
            })
            .map_err(|e| match e {
                CoreError::CollectionNotFound { .. } => EndpointError::CollectionNotFound {
                    collection: spec.to_string(),
                },
                e => EndpointError::store("Couldn't save documents", e),
            })?;
            debug!(count = batch.len(), collection = %spec, "saved batch");
        }
        Ok(records.len())
    }

    fn db(&self) -> EndpointResult<&Database> {
        self.db.as_ref().ok_or(EndpointError::NotPrepared)
    }
}
