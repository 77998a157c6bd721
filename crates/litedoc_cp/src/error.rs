//! Error types for endpoints and copying.

use litedoc_core::CoreError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for endpoint operations.
pub type EndpointResult<T> = Result<T, EndpointError>;

/// Errors raised while preparing, reading or writing an endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// File system error on a path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Database error.
    #[error("{context}: {source}")]
    Store {
        /// What was being done.
        context: String,
        /// Store error.
        #[source]
        source: CoreError,
    },

    /// A source (or an `--existing` destination) is missing.
    #[error("{} doesn't exist", .path.display())]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// A record in a JSON file or directory is not a JSON object.
    #[error("invalid record in {}{}: {message}", .path.display(), line_suffix(.line))]
    InvalidRecord {
        /// File holding the record.
        path: PathBuf,
        /// 1-based line for newline-delimited files.
        line: Option<usize>,
        /// What is wrong.
        message: String,
    },

    /// The selected collection does not exist.
    #[error("collection '{collection}' does not exist")]
    CollectionNotFound {
        /// `scope/name`.
        collection: String,
    },

    /// A remote locator is not a valid URL.
    #[error("invalid replication URL {url}: {source}")]
    InvalidUrl {
        /// The locator.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// Remote endpoints are recognized but cannot be copied to or from.
    #[error("replication with {url} is not supported by this tool")]
    ReplicationUnavailable {
        /// The remote URL.
        url: String,
    },

    /// The endpoint was used before `prepare`.
    #[error("endpoint used before it was prepared")]
    NotPrepared,
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" line {l}")).unwrap_or_default()
}

impl EndpointError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps a store error with context.
    pub fn store(context: impl Into<String>, source: CoreError) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Returns the store error behind this failure, if any.
    #[must_use]
    pub fn store_error(&self) -> Option<&CoreError> {
        match self {
            Self::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Advice printed after an unrecognized locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// The locator looks like a URL with a scheme other than `ws`/`wss`.
    UnsupportedScheme,
    /// The locator looks like a directory without a trailing separator.
    DirectoryNeedsSeparator,
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedScheme => {
                f.write_str("Replication URLs must use the 'ws:' or 'wss:' schemes.")
            }
            Self::DirectoryNeedsSeparator => f.write_str(
                "If you are trying to copy to/from a directory of JSON files, append a '/' to the path.",
            ),
        }
    }
}

/// A locator that names no known kind of endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized endpoint '{locator}'")]
pub struct UnrecognizedLocator {
    /// The locator as given (after `~/` expansion).
    pub locator: String,
    /// Advice for the user, if any applies.
    pub hint: Option<Hint>,
}
