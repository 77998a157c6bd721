//! Error types for LiteDoc core.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in LiteDoc core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored file could not be decoded.
    #[error("corrupt data: {0}")]
    CorruptData(#[from] serde_json::Error),

    /// Document body text is not valid JSON5, or is not an object.
    #[error("invalid JSON: {message}")]
    InvalidJson {
        /// Parser message.
        message: String,
    },

    /// Document not found.
    #[error("document not found: {doc_id}")]
    DocumentNotFound {
        /// The document ID that was not found.
        doc_id: String,
    },

    /// The document changed since it was read.
    #[error("document update conflict: {doc_id}")]
    Conflict {
        /// The conflicting document ID.
        doc_id: String,
    },

    /// Collection not found.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// `scope/name` of the collection.
        name: String,
    },

    /// Collection or scope name failed validation.
    #[error("invalid collection name {name:?}: {reason}")]
    InvalidCollectionName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Blob not present in the blob store.
    #[error("blob not found: {key}")]
    BlobNotFound {
        /// Rendered blob key.
        key: String,
    },

    /// Database is already open or locked.
    #[error("database locked: another process has exclusive access")]
    DatabaseLocked,

    /// Database was opened read-only.
    #[error("database is read-only")]
    ReadOnly,

    /// Invalid database format or version.
    #[error("invalid database format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// Database is closed.
    #[error("database is closed")]
    DatabaseClosed,
}

/// Namespace of an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDomain {
    /// Codes defined by LiteDoc itself (see [`ErrorCode`]).
    LiteDoc,
    /// Operating-system `errno` values.
    Posix,
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LiteDoc => f.write_str("LiteDoc"),
            Self::Posix => f.write_str("POSIX"),
        }
    }
}

/// Stable numeric codes in the [`ErrorDomain::LiteDoc`] domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    /// Unclassified failure.
    Unexpected = 1,
    /// Database is not open.
    NotOpen = 5,
    /// Document, collection or blob not found.
    NotFound = 7,
    /// Revision conflict.
    Conflict = 8,
    /// Invalid argument.
    InvalidParameter = 9,
    /// Database opened read-only.
    NotWriteable = 13,
    /// Database locked by another handle.
    Busy = 16,
    /// Stored data failed to decode.
    CorruptData = 17,
    /// Unsupported operation in the current state.
    Unsupported = 18,
    /// Database version is not supported.
    WrongFormat = 20,
}

impl CoreError {
    /// Creates an invalid JSON error.
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: message.into(),
        }
    }

    /// Creates a document not found error.
    pub fn document_not_found(doc_id: impl Into<String>) -> Self {
        Self::DocumentNotFound {
            doc_id: doc_id.into(),
        }
    }

    /// Creates a collection not found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns `true` for any of the not-found variants.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DocumentNotFound { .. }
                | Self::CollectionNotFound { .. }
                | Self::BlobNotFound { .. }
        )
    }

    /// Returns the domain the error's [`code`](Self::code) belongs to.
    #[must_use]
    pub fn domain(&self) -> ErrorDomain {
        match self {
            Self::Io(e) if e.raw_os_error().is_some() => ErrorDomain::Posix,
            _ => ErrorDomain::LiteDoc,
        }
    }

    /// Returns the numeric error code within [`domain`](Self::domain).
    #[must_use]
    pub fn code(&self) -> i32 {
        if let Self::Io(e) = self {
            if let Some(errno) = e.raw_os_error() {
                return errno;
            }
        }
        let code = match self {
            Self::Io(_) => ErrorCode::Unexpected,
            Self::CorruptData(_) => ErrorCode::CorruptData,
            Self::InvalidJson { .. } | Self::InvalidCollectionName { .. } => {
                ErrorCode::InvalidParameter
            }
            Self::DocumentNotFound { .. }
            | Self::CollectionNotFound { .. }
            | Self::BlobNotFound { .. } => ErrorCode::NotFound,
            Self::Conflict { .. } => ErrorCode::Conflict,
            Self::DatabaseLocked => ErrorCode::Busy,
            Self::ReadOnly => ErrorCode::NotWriteable,
            Self::InvalidFormat { .. } => ErrorCode::WrongFormat,
            Self::InvalidOperation { .. } => ErrorCode::Unsupported,
            Self::DatabaseClosed => ErrorCode::NotOpen,
        };
        code as i32
    }
}
