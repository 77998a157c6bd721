//! Errors reported by CLI commands.

use litedoc_core::CoreError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for command handlers.
pub type CommandResult<T> = Result<T, CommandError>;

/// A command failure.
///
/// The `Display` text is the message shown after `Error: `. Variants that
/// wrap a [`CoreError`] also expose it through [`CommandError::store_error`]
/// so the caller can report its domain and code.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The document body is not valid JSON5 or not an object.
    #[error("Invalid JSON: {message}")]
    InvalidJson {
        /// Parser message.
        message: String,
    },

    /// The document has never been saved (or was purged).
    #[error("Document `{doc_id}` doesn't exist")]
    DocumentNotFound {
        /// Document ID.
        doc_id: String,
    },

    /// The document's current revision is a tombstone.
    #[error("Document `{doc_id}` is already deleted")]
    DocumentDeleted {
        /// Document ID.
        doc_id: String,
    },

    /// `--create` was given but the document is live.
    #[error("Document `{doc_id}` already exists")]
    DocumentAlreadyExists {
        /// Document ID.
        doc_id: String,
    },

    /// An `--attach` file could not be read.
    #[error("Couldn't read attachment file: {}", .path.display())]
    AttachmentRead {
        /// Path given on the command line.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The named collection does not exist.
    #[error("Collection '{collection}' does not exist")]
    CollectionNotFound {
        /// `scope/name` of the collection.
        collection: String,
    },

    /// A transaction could not be opened or committed.
    #[error("Couldn't {action} database transaction")]
    Transaction {
        /// `open` or `commit`.
        action: &'static str,
        /// Store error.
        #[source]
        source: CoreError,
    },

    /// Any other store failure, reported verbatim.
    #[error("{context}")]
    Store {
        /// What the command was doing.
        context: String,
        /// Store error.
        #[source]
        source: CoreError,
    },

    /// Bad command-line arguments.
    #[error("{0}")]
    Usage(String),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CommandError {
    /// Wraps a store error with a description of what failed.
    pub fn store(context: impl Into<String>, source: CoreError) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Returns the store error behind this failure, if any.
    #[must_use]
    pub fn store_error(&self) -> Option<&CoreError> {
        match self {
            Self::Transaction { source, .. } | Self::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Renders the `fail` message for a command error.
///
/// ```text
/// Error: Couldn't read document (LiteDoc error 7: document not found: x)
/// ```
#[must_use]
pub fn report(err: &CommandError) -> String {
    match err.store_error() {
        Some(source) => format!(
            "Error: {err} ({} error {}: {source})",
            source.domain(),
            source.code()
        ),
        None => format!("Error: {err}"),
    }
}
