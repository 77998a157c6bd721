//! # LiteDoc Core
//!
//! Embedded JSON document store.
//!
//! This crate provides:
//! - Named collections of JSON documents grouped into scopes
//! - Revision tracking with tombstones and purging
//! - Exclusive, atomically committed write transactions
//! - Content-addressed blob storage for attachments
//! - Property-order preserving body encoding (JSON5 input)

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod blob;
mod config;
mod database;
mod dir;
mod document;
mod error;
mod snapshot;
mod transaction;
mod types;

pub use blob::{
    blob_reference, is_blob_reference, BlobKey, BlobStore, BLOB_CONTENT_TYPE_PROPERTY,
    BLOB_DIGEST_PROPERTY, BLOB_LENGTH_PROPERTY, OBJECT_TYPE_BLOB, OBJECT_TYPE_PROPERTY,
};
pub use config::{Config, FORMAT_VERSION};
pub use database::{generate_doc_id, Database, DATABASE_FILENAME_EXTENSION};
pub use document::{Body, DictEncoder, Document, Revision};
pub use error::{CoreError, CoreResult, ErrorCode, ErrorDomain};
pub use transaction::{Transaction, TransactionState};
pub use types::{
    CollectionSpec, RevisionFlags, RevisionId, SequenceNumber, TransactionId, DEFAULT_NAME,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
