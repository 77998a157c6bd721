//! Copy endpoints.
//!
//! An [`Endpoint`] is one side of a copy: a LiteDoc database, a
//! newline-delimited JSON file, a directory of JSON files, or a remote
//! replication URL. [`Endpoint::create`] picks the kind from the locator
//! string:
//!
//! | Locator | Endpoint |
//! |---------|----------|
//! | `ws://…`, `wss://…` | [`Remote`](Endpoint::Remote) |
//! | `*.litedoc` | [`Db`](Endpoint::Db) |
//! | `*.json` | [`Json`](Endpoint::Json) |
//! | ends with the path separator | [`Directory`](Endpoint::Directory) |
//!
//! A leading `~/` is expanded to `$HOME` first (not on Windows).

pub mod db;
pub mod directory;
pub mod json;
pub mod remote;

use crate::error::{EndpointResult, Hint, UnrecognizedLocator};
use db::DbEndpoint;
use directory::DirectoryEndpoint;
use json::JsonEndpoint;
use litedoc_core::{Body, CollectionSpec, Database, DATABASE_FILENAME_EXTENSION};
use remote::RemoteEndpoint;
use std::fmt;
use std::path::{Path, MAIN_SEPARATOR};
use tracing::debug;

/// Default property holding the document ID in JSON records.
pub const DEFAULT_ID_PROPERTY: &str = "_id";

/// Default number of documents saved per transaction.
pub const DEFAULT_BATCH_SIZE: usize = 100;

const REMOTE_SCHEMES: [&str; 2] = ["ws://", "wss://"];
const JSON_EXTENSION: &str = ".json";

/// Kind of endpoint, without its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Remote replication URL.
    Remote,
    /// LiteDoc database.
    Db,
    /// Newline-delimited JSON file.
    Json,
    /// Directory of JSON files.
    Directory,
}

/// Which side of a copy an endpoint is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Records are read from it.
    Source,
    /// Records are written to it.
    Destination,
}

/// Settings shared by all endpoints of one copy.
#[derive(Debug, Clone)]
pub struct EndpointOptions {
    /// The destination must already exist.
    pub existing: bool,
    /// Property of JSON records holding the document ID.
    pub id_property: String,
    /// Collection read from or written to in databases.
    pub collection: CollectionSpec,
    /// Documents per transaction when writing to a database.
    pub batch_size: usize,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            existing: false,
            id_property: DEFAULT_ID_PROPERTY.to_string(),
            collection: CollectionSpec::default_collection(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// One document in transit.
#[derive(Debug, Clone, PartialEq)]
pub struct DocRecord {
    /// Document ID.
    pub doc_id: String,
    /// Document body.
    pub body: Body,
}

/// A source or destination of a copy.
#[derive(Debug)]
pub enum Endpoint {
    /// Remote replication URL.
    Remote(RemoteEndpoint),
    /// LiteDoc database.
    Db(DbEndpoint),
    /// Newline-delimited JSON file.
    Json(JsonEndpoint),
    /// Directory of JSON files.
    Directory(DirectoryEndpoint),
}

impl Endpoint {
    /// Classifies a path or URL.
    ///
    /// Returns [`UnrecognizedLocator`] (with a hint when one applies) if the
    /// locator names no known kind of endpoint.
    pub fn create(locator: &str) -> Result<Self, UnrecognizedLocator> {
        let home = std::env::var("HOME").ok();
        Self::classify(locator, home.as_deref())
    }

    fn classify(locator: &str, home: Option<&str>) -> Result<Self, UnrecognizedLocator> {
        if REMOTE_SCHEMES.iter().any(|scheme| locator.starts_with(scheme)) {
            return Ok(Self::Remote(RemoteEndpoint::new(locator)));
        }

        let locator = expand_home(locator, home);
        let endpoint = if locator.ends_with(DATABASE_FILENAME_EXTENSION) {
            Self::Db(DbEndpoint::new(&locator))
        } else if locator.ends_with(JSON_EXTENSION) {
            Self::Json(JsonEndpoint::new(&locator))
        } else if locator.ends_with(MAIN_SEPARATOR) {
            Self::Directory(DirectoryEndpoint::new(&locator))
        } else {
            let hint = if locator.contains("://") {
                Some(Hint::UnsupportedScheme)
            } else if Path::new(&locator).is_dir() || !locator.contains('.') {
                Some(Hint::DirectoryNeedsSeparator)
            } else {
                None
            };
            return Err(UnrecognizedLocator { locator, hint });
        };
        debug!(locator = %locator, kind = ?endpoint.kind(), "classified endpoint");
        Ok(endpoint)
    }

    /// Wraps an already open database.
    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self::Db(DbEndpoint::from_database(db))
    }

    /// Returns the kind of endpoint.
    #[must_use]
    pub fn kind(&self) -> EndpointKind {
        match self {
            Self::Remote(_) => EndpointKind::Remote,
            Self::Db(_) => EndpointKind::Db,
            Self::Json(_) => EndpointKind::Json,
            Self::Directory(_) => EndpointKind::Directory,
        }
    }

    /// Opens or creates whatever backs the endpoint.
    ///
    /// Sources must exist. Destinations are created unless
    /// `options.existing` is set.
    pub fn prepare(&mut self, role: Role, options: &EndpointOptions) -> EndpointResult<()> {
        match self {
            Self::Remote(e) => e.prepare(role, options),
            Self::Db(e) => e.prepare(role, options),
            Self::Json(e) => e.prepare(role, options),
            Self::Directory(e) => e.prepare(role, options),
        }
    }

    /// Reads up to `limit` records (all of them if `None`).
    pub fn read(&mut self, limit: Option<usize>) -> EndpointResult<Vec<DocRecord>> {
        match self {
            Self::Remote(e) => e.read(limit),
            Self::Db(e) => e.read(limit),
            Self::Json(e) => e.read(limit),
            Self::Directory(e) => e.read(limit),
        }
    }

    /// Writes records, returning how many were written.
    pub fn write(&mut self, records: &[DocRecord]) -> EndpointResult<usize> {
        match self {
            Self::Remote(e) => e.write(records),
            Self::Db(e) => e.write(records),
            Self::Json(e) => e.write(records),
            Self::Directory(e) => e.write(records),
        }
    }

    /// Flushes buffered output.
    pub fn finish(&mut self) -> EndpointResult<()> {
        match self {
            Self::Json(e) => e.finish(),
            Self::Remote(_) | Self::Db(_) | Self::Directory(_) => Ok(()),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(e) => write!(f, "{}", e.url()),
            Self::Db(e) => match e.path() {
                Some(path) => write!(f, "{}", path.display()),
                None => f.write_str("<database>"),
            },
            Self::Json(e) => write!(f, "{}", e.path().display()),
            Self::Directory(e) => write!(f, "{}", e.path().display()),
        }
    }
}

#[cfg(not(windows))]
fn expand_home(locator: &str, home: Option<&str>) -> String {
    match (locator.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.starts_with('/') => format!("{home}{rest}"),
        _ => locator.to_string(),
    }
}

#[cfg(windows)]
fn expand_home(locator: &str, _home: Option<&str>) -> String {
    locator.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kind_of(locator: &str) -> Result<EndpointKind, Option<Hint>> {
        Endpoint::classify(locator, Some("/home/me"))
            .map(|e| e.kind())
            .map_err(|e| e.hint)
    }

    #[test]
    fn classification_examples() {
        assert_eq!(kind_of("ws://host/db"), Ok(EndpointKind::Remote));
        assert_eq!(kind_of("wss://host:4984/db"), Ok(EndpointKind::Remote));
        assert_eq!(kind_of("mydb.litedoc"), Ok(EndpointKind::Db));
        assert_eq!(kind_of("export.json"), Ok(EndpointKind::Json));
        assert_eq!(kind_of("docs/"), Ok(EndpointKind::Directory));
        assert_eq!(kind_of("mydb.litedoc/"), Ok(EndpointKind::Directory));
    }

    #[test]
    fn failures_carry_hints() {
        assert_eq!(kind_of("http://x"), Err(Some(Hint::UnsupportedScheme)));
        assert_eq!(kind_of("nothing"), Err(Some(Hint::DirectoryNeedsSeparator)));
        assert_eq!(kind_of("notes.txt"), Err(None));
    }

    #[test]
    fn existing_directory_without_separator_gets_hint() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("with.dot");
        std::fs::create_dir(&dir).unwrap();
        assert_eq!(
            kind_of(dir.to_str().unwrap()),
            Err(Some(Hint::DirectoryNeedsSeparator))
        );
    }

    #[test]
    fn unrecognized_locator_keeps_text() {
        let err = Endpoint::classify("ftp://server/file", None).unwrap_err();
        assert_eq!(err.locator, "ftp://server/file");
        assert_eq!(err.to_string(), "unrecognized endpoint 'ftp://server/file'");
    }

    #[cfg(not(windows))]
    #[test]
    fn home_is_expanded() {
        let endpoint = Endpoint::classify("~/data/export.json", Some("/home/me")).unwrap();
        assert_eq!(endpoint.to_string(), "/home/me/data/export.json");

        // `~user/` forms are left alone
        let err = Endpoint::classify("~other", Some("/home/me")).unwrap_err();
        assert_eq!(err.locator, "~other");
    }

    #[test]
    fn from_database_skips_classification() {
        let db = Database::open_in_memory().unwrap();
        let endpoint = Endpoint::from_database(db);
        assert_eq!(endpoint.kind(), EndpointKind::Db);
        assert_eq!(endpoint.to_string(), "<database>");
    }

    proptest! {
        #[test]
        fn remote_prefix_always_wins(rest in "[a-z0-9./:-]{0,20}") {
            prop_assert_eq!(kind_of(&format!("ws://{rest}")), Ok(EndpointKind::Remote));
            prop_assert_eq!(kind_of(&format!("wss://{rest}.json")), Ok(EndpointKind::Remote));
        }

        #[test]
        fn suffix_decides_local_kind(stem in "[a-z][a-z0-9_]{0,12}") {
            prop_assert_eq!(kind_of(&format!("{stem}.litedoc")), Ok(EndpointKind::Db));
            prop_assert_eq!(kind_of(&format!("{stem}.json")), Ok(EndpointKind::Json));
            prop_assert_eq!(kind_of(&format!("{stem}/")), Ok(EndpointKind::Directory));
        }

        #[test]
        fn dotless_names_suggest_separator(name in "[a-z][a-z0-9_]{0,12}") {
            prop_assert_eq!(kind_of(&name), Err(Some(Hint::DirectoryNeedsSeparator)));
        }
    }
}
