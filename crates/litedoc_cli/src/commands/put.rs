//! Put command implementation.
//!
//! `put` creates, updates, deletes or purges one document, optionally
//! embedding files as blobs. The existence check, body encoding and save all
//! happen inside one transaction.

use super::{collection_from_arg, parse_matches, render_usage, Command, Context};
use crate::error::{CommandError, CommandResult};
use clap::{ArgAction, ArgMatches, FromArgMatches, Parser};
use litedoc_core::{
    blob_reference, Body, CollectionSpec, CoreError, Database, DictEncoder, RevisionFlags,
    RevisionId, SequenceNumber,
};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Property blobs are stored under when `--attach` names none.
pub const DEFAULT_BLOB_PROPERTY: &str = "blobs";

/// Ends the values of one `--attach` occurrence.
const ATTACH_TERMINATOR: &str = ";";

/// Length of the revision ID prefix shown in output.
const REV_ID_DISPLAY_LEN: usize = 10;

/// What a put does to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    /// Create or update.
    Put,
    /// The document must exist and not be deleted.
    Update,
    /// The document must not exist (or be deleted).
    Create,
    /// Save a tombstone. The document must exist and not be deleted.
    Delete,
    /// Remove the document without leaving a tombstone.
    Purge,
}

impl PutMode {
    /// Modes that take a JSON body.
    #[must_use]
    pub fn takes_body(self) -> bool {
        !matches!(self, Self::Delete | Self::Purge)
    }
}

/// A file to embed as a blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File to read.
    pub file_path: PathBuf,
    /// Property to store the blob reference under, taken literally.
    pub property_name: String,
    /// Dot-separated path of the object holding the property; top level if
    /// `None`.
    pub parent_path: Option<String>,
}

impl Attachment {
    /// Creates an attachment request for a top-level property.
    pub fn new(file_path: impl Into<PathBuf>, property_name: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            property_name: property_name.into(),
            parent_path: None,
        }
    }

    /// Places the property inside the object at `parent_path`.
    #[must_use]
    pub fn nested_in(mut self, parent_path: impl Into<String>) -> Self {
        self.parent_path = Some(parent_path.into());
        self
    }

    fn display_path(&self) -> String {
        match &self.parent_path {
            Some(parent) => format!("{parent}.{}", self.property_name),
            None => self.property_name.clone(),
        }
    }
}

/// A fully parsed put.
#[derive(Debug, Clone)]
pub struct PutRequest {
    /// Mode.
    pub mode: PutMode,
    /// Target collection.
    pub collection: CollectionSpec,
    /// Document ID.
    pub doc_id: String,
    /// JSON5 body text (ignored by `Delete` and `Purge`).
    pub json5: String,
    /// Files to embed.
    pub attachments: Vec<Attachment>,
}

/// Result of a successful put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// A revision was saved.
    Saved {
        /// `Created`, `Updated` or `Deleted`.
        verb: &'static str,
        /// Document ID.
        doc_id: String,
        /// New revision.
        rev_id: RevisionId,
        /// Sequence of the new revision.
        sequence: SequenceNumber,
        /// Number of blobs embedded in the body.
        blob_count: usize,
    },
    /// The document was purged.
    Purged {
        /// Document ID.
        doc_id: String,
    },
}

impl fmt::Display for PutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved {
                verb,
                doc_id,
                rev_id,
                sequence,
                blob_count,
            } => {
                let rev = rev_id.as_str();
                let short = rev.get(..REV_ID_DISPLAY_LEN).unwrap_or(rev);
                write!(
                    f,
                    "{verb} `{doc_id}`, new revision {short} (sequence {sequence})"
                )?;
                if *blob_count > 0 {
                    write!(f, " with {blob_count} blob(s)")?;
                }
                Ok(())
            }
            Self::Purged { doc_id } => write!(f, "Purged `{doc_id}`"),
        }
    }
}

/// Runs a put against `db`.
pub fn run(db: &Database, request: &PutRequest) -> CommandResult<PutOutcome> {
    let spec = &request.collection;
    let doc_id = request.doc_id.as_str();

    let mut txn = db.begin().map_err(|source| CommandError::Transaction {
        action: "open",
        source,
    })?;

    let outcome = if request.mode == PutMode::Purge {
        txn.purge_document(spec, doc_id).map_err(|e| match e {
            CoreError::CollectionNotFound { .. } => CommandError::CollectionNotFound {
                collection: spec.to_string(),
            },
            e => CommandError::store("Couldn't purge document", e),
        })?;
        PutOutcome::Purged {
            doc_id: doc_id.to_string(),
        }
    } else {
        let doc = txn.get_document(spec, doc_id).map_err(|e| match e {
            CoreError::CollectionNotFound { .. } => CommandError::CollectionNotFound {
                collection: spec.to_string(),
            },
            e => CommandError::store("Couldn't read document", e),
        })?;

        let existed = doc.is_live();
        if !existed && matches!(request.mode, PutMode::Update | PutMode::Delete) {
            return Err(if doc.exists() {
                CommandError::DocumentDeleted {
                    doc_id: doc_id.to_string(),
                }
            } else {
                CommandError::DocumentNotFound {
                    doc_id: doc_id.to_string(),
                }
            });
        }
        if existed && request.mode == PutMode::Create {
            return Err(CommandError::DocumentAlreadyExists {
                doc_id: doc_id.to_string(),
            });
        }

        let (body, blob_count) = if request.mode.takes_body() {
            let body = encode_body(db, &request.json5, &request.attachments)?;
            (Some(body), request.attachments.len())
        } else {
            (None, 0)
        };

        let mut flags = RevisionFlags::NONE;
        if request.mode == PutMode::Delete {
            flags |= RevisionFlags::DELETED;
        }
        if !request.attachments.is_empty() {
            flags |= RevisionFlags::HAS_ATTACHMENTS;
        }

        let saved = txn
            .update_document(&doc, body, flags)
            .map_err(|e| CommandError::store("Couldn't save document", e))?;

        let verb = if request.mode == PutMode::Delete {
            "Deleted"
        } else if existed {
            "Updated"
        } else {
            "Created"
        };
        let (Some(rev_id), Some(sequence)) = (saved.rev_id(), saved.sequence()) else {
            return Err(CommandError::store(
                "Couldn't save document",
                CoreError::invalid_operation("saved document has no revision"),
            ));
        };
        PutOutcome::Saved {
            verb,
            doc_id: doc_id.to_string(),
            rev_id: rev_id.clone(),
            sequence,
            blob_count,
        }
    };

    txn.commit().map_err(|source| CommandError::Transaction {
        action: "commit",
        source,
    })?;
    info!(collection = %spec, doc_id, mode = ?request.mode, "put document");
    Ok(outcome)
}

/// Parses the JSON5 body and embeds the attachments into it.
///
/// Every attachment file is read before any blob is stored.
fn encode_body(db: &Database, json5: &str, attachments: &[Attachment]) -> CommandResult<Body> {
    let parsed = Body::from_json5(json5).map_err(|e| match e {
        CoreError::InvalidJson { message } => CommandError::InvalidJson { message },
        e => CommandError::store("Couldn't encode body", e),
    })?;
    if attachments.is_empty() {
        return Ok(parsed);
    }

    let contents = attachments
        .iter()
        .map(|att| {
            fs::read(&att.file_path)
                .map(|data| (att, data))
                .map_err(|source| CommandError::AttachmentRead {
                    path: att.file_path.clone(),
                    source,
                })
        })
        .collect::<CommandResult<Vec<_>>>()?;

    let mut enc = DictEncoder::new();
    enc.copy_from(parsed.as_map());
    for (att, data) in contents {
        let key = db
            .blob_store()
            .create_blob(&data)
            .map_err(|e| CommandError::store("Couldn't store blob", e))?;
        let reference = blob_reference(&key, data.len() as u64, content_type_for(&att.file_path));
        enc.write_nested(att.parent_path.as_deref(), &att.property_name, reference)
            .map_err(|e| {
                CommandError::store(
                    format!("Couldn't add blob property '{}'", att.display_path()),
                    e,
                )
            })?;
    }
    Ok(enc.finish())
}

/// Guesses a MIME type from the text after the last `.` of the path.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let path = path.to_string_lossy();
    let Some((_, ext)) = path.rsplit_once('.') else {
        return "application/octet-stream";
    };
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Arguments of `put`.
#[derive(Debug, Parser)]
#[command(
    name = "put",
    no_binary_name = true,
    about = "Updates a document",
    after_help = "Use `--` before DOCID if it starts with '-'.\n\
                  `--attach` stores the blob under NAME (default `blobs`) inside the object at \
                  the optional PROPERTY path, e.g. `--attach photo.jpg photo attachments`."
)]
pub struct PutArgs {
    /// Attach a file as a blob
    #[arg(
        long,
        num_args = 1..=3,
        value_names = ["PATH", "NAME", "PROPERTY"],
        value_terminator = ATTACH_TERMINATOR,
        action = ArgAction::Append
    )]
    attach: Vec<String>,

    /// Document must not exist
    #[arg(long, conflicts_with_all = ["update", "delete", "purge"])]
    create: bool,

    /// Document must already exist
    #[arg(long, conflicts_with_all = ["delete", "purge"])]
    update: bool,

    /// Deletes the document (same as `rm`)
    #[arg(long, conflicts_with = "purge")]
    delete: bool,

    /// Purges the document (deletes without leaving a tombstone)
    #[arg(long)]
    purge: bool,

    /// Collection as `name` or `scope/name` (default `_default`)
    #[arg(long, value_name = "PATH")]
    collection: Option<String>,

    /// Document ID
    #[arg(value_name = "DOCID")]
    doc_id: String,

    /// Document body as JSON (JSON5 syntax allowed)
    #[arg(value_name = "JSON", trailing_var_arg = true, allow_hyphen_values = true)]
    body: Vec<String>,
}

impl PutArgs {
    fn mode(&self) -> PutMode {
        if self.purge {
            PutMode::Purge
        } else if self.delete {
            PutMode::Delete
        } else if self.update {
            PutMode::Update
        } else if self.create {
            PutMode::Create
        } else {
            PutMode::Put
        }
    }
}

/// Closes every `--attach` occurrence with [`ATTACH_TERMINATOR`] so clap
/// never takes the document ID or body as attach values.
///
/// NAME is taken when the next word is not a flag. A third word is the
/// PROPERTY path unless the word after it is the JSON body (starts with
/// `{`) or there is no word after it, in which case it is the DOCID.
fn delimit_attach_values(args: &[String]) -> Vec<String> {
    let is_value = |word: Option<&String>| word.is_some_and(|w| !w.starts_with('-'));
    let mut out = Vec::with_capacity(args.len());
    let mut words = args.iter().peekable();
    while let Some(word) = words.next() {
        out.push(word.clone());
        if word == "--" {
            out.extend(words.by_ref().cloned());
            break;
        }
        if word != "--attach" {
            continue;
        }
        let Some(path) = words.next() else {
            break;
        };
        out.push(path.clone());
        if is_value(words.peek().copied()) {
            out.extend(words.next().cloned());
            let rest = words.clone().collect::<Vec<_>>();
            let property_follows = match rest.as_slice() {
                [candidate, after, ..] => {
                    !candidate.starts_with('-') && !after.trim_start().starts_with('{')
                }
                _ => false,
            };
            if property_follows {
                out.extend(words.next().cloned());
            }
        }
        out.push(ATTACH_TERMINATOR.to_string());
    }
    out
}

/// Groups `--attach PATH [NAME [PROPERTY]]` occurrences into attachments.
fn attachments_from(matches: &ArgMatches) -> Vec<Attachment> {
    matches
        .get_occurrences::<String>("attach")
        .into_iter()
        .flatten()
        .filter_map(|mut values| {
            let path = values.next()?;
            let name = values.next().map_or(DEFAULT_BLOB_PROPERTY, String::as_str);
            let attachment = Attachment::new(path, name);
            Some(match values.next() {
                Some(parent) => attachment.nested_in(parent.as_str()),
                None => attachment,
            })
        })
        .collect()
}

/// Builds a request from positional body words.
pub(crate) fn build_request(
    mode: PutMode,
    collection: Option<&str>,
    doc_id: String,
    body: &[String],
    attachments: Vec<Attachment>,
) -> CommandResult<PutRequest> {
    let json5 = if mode.takes_body() {
        if body.is_empty() {
            return Err(CommandError::usage("Missing document body as JSON"));
        }
        body.join(" ")
    } else {
        if !body.is_empty() {
            return Err(CommandError::usage(format!(
                "Unexpected argument '{}'",
                body[0]
            )));
        }
        String::new()
    };
    Ok(PutRequest {
        mode,
        collection: collection_from_arg(collection)?,
        doc_id,
        json5,
        attachments,
    })
}

/// The `put` command.
pub struct PutCommand;

impl Command for PutCommand {
    fn name(&self) -> &'static str {
        "put"
    }

    fn summary(&self) -> &'static str {
        "Create, update, delete or purge a document"
    }

    fn usage(&self) -> String {
        render_usage::<PutArgs>()
    }

    fn run_subcommand(&self, ctx: &mut Context<'_>, args: &[String]) -> CommandResult<()> {
        let args = delimit_attach_values(args);
        let Some(matches) = parse_matches::<PutArgs>(ctx, &args)? else {
            return Ok(());
        };
        let parsed = PutArgs::from_arg_matches(&matches)
            .map_err(|e| CommandError::usage(e.to_string()))?;
        let request = build_request(
            parsed.mode(),
            parsed.collection.as_deref(),
            parsed.doc_id.clone(),
            &parsed.body,
            attachments_from(&matches),
        )?;
        let outcome = run(ctx.db, &request)?;
        writeln!(ctx.out, "{outcome}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use litedoc_core::{is_blob_reference, BlobKey};
    use serde_json::json;

    fn body_of(fixture: &Fixture, id: &str) -> serde_json::Value {
        let doc = fixture
            .db
            .get_document(&CollectionSpec::default_collection(), id)
            .unwrap();
        serde_json::to_value(doc.body().unwrap()).unwrap()
    }

    #[test]
    fn put_creates_then_updates() {
        let fixture = Fixture::new();
        let out = fixture.run(&["put", "doc1", "{a: 1}"]).unwrap();
        assert!(out.starts_with("Created `doc1`, new revision 1-"), "{out}");
        assert!(out.trim_end().ends_with("(sequence 1)"), "{out}");

        let out = fixture.run(&["put", "doc1", "{a: 2}"]).unwrap();
        assert!(out.starts_with("Updated `doc1`, new revision 2-"), "{out}");
        assert!(out.trim_end().ends_with("(sequence 2)"), "{out}");
        assert_eq!(body_of(&fixture, "doc1"), json!({"a": 2}));
    }

    #[test]
    fn update_of_existing_document() {
        let fixture = Fixture::new();
        fixture.run(&["put", "d", "{}"]).unwrap();
        let out = fixture.run(&["put", "--update", "d", "{}"]).unwrap();
        assert!(out.starts_with("Updated `d`, new revision 2-"), "{out}");
        assert!(out.trim_end().ends_with("(sequence 2)"), "{out}");
    }

    #[test]
    fn busy_database_fails_to_open_transaction() {
        let fixture = Fixture::new();
        fixture.run(&["put", "doc", "{a: 1}"]).unwrap();

        let held = fixture.db.begin().unwrap();
        let err = fixture.run(&["put", "doc", "{a: 2}"]).unwrap_err();
        assert!(
            matches!(err, CommandError::Transaction { action: "open", .. }),
            "{err:?}"
        );
        drop(held);

        assert_eq!(fixture.db.last_sequence().as_u64(), 1);
        assert_eq!(body_of(&fixture, "doc"), json!({"a": 1}));
    }

    #[test]
    fn failed_commit_leaves_document_unchanged() {
        let fixture = Fixture::new();
        fixture.run(&["put", "doc", "{a: 1}"]).unwrap();

        // The snapshot can't be written while its temp path is a directory
        let blocker = fixture.dir().join("test.litedoc").join("db.json.tmp");
        fs::create_dir(&blocker).unwrap();
        let err = fixture.run(&["put", "doc", "{a: 2}"]).unwrap_err();
        assert!(
            matches!(err, CommandError::Transaction { action: "commit", .. }),
            "{err:?}"
        );
        assert_eq!(fixture.db.last_sequence().as_u64(), 1);
        assert_eq!(body_of(&fixture, "doc"), json!({"a": 1}));

        fs::remove_dir(&blocker).unwrap();
        fixture.run(&["put", "doc", "{a: 3}"]).unwrap();
        assert_eq!(body_of(&fixture, "doc"), json!({"a": 3}));
    }

    #[test]
    fn body_words_are_joined() {
        let fixture = Fixture::new();
        fixture
            .run(&["put", "doc", "{name:", "'two", "words'}"])
            .unwrap();
        assert_eq!(body_of(&fixture, "doc"), json!({"name": "two words"}));
    }

    #[test]
    fn update_requires_existing_document() {
        let fixture = Fixture::new();
        let err = fixture
            .run(&["put", "--update", "doc2", "{a: 1}"])
            .unwrap_err();
        assert!(matches!(err, CommandError::DocumentNotFound { .. }));
        assert_eq!(fixture.db.last_sequence().as_u64(), 0);
    }

    #[test]
    fn create_requires_missing_document() {
        let fixture = Fixture::new();
        fixture.run(&["put", "doc1", "{a: 1}"]).unwrap();
        let err = fixture
            .run(&["put", "--create", "doc1", "{a: 2}"])
            .unwrap_err();
        assert!(matches!(err, CommandError::DocumentAlreadyExists { .. }));
        assert_eq!(body_of(&fixture, "doc1"), json!({"a": 1}));
    }

    #[test]
    fn create_over_tombstone_is_allowed() {
        let fixture = Fixture::new();
        fixture.run(&["put", "doc", "{}"]).unwrap();
        fixture.run(&["rm", "doc"]).unwrap();
        let out = fixture.run(&["put", "--create", "doc", "{v: 3}"]).unwrap();
        assert!(out.starts_with("Created `doc`, new revision 3-"), "{out}");
    }

    #[test]
    fn delete_then_update_reports_deleted() {
        let fixture = Fixture::new();
        fixture.run(&["put", "doc", "{}"]).unwrap();
        let out = fixture.run(&["put", "--delete", "doc"]).unwrap();
        assert!(out.starts_with("Deleted `doc`"), "{out}");
        let err = fixture.run(&["put", "--update", "doc", "{}"]).unwrap_err();
        assert!(matches!(err, CommandError::DocumentDeleted { .. }));
    }

    #[test]
    fn purge_leaves_no_tombstone() {
        let fixture = Fixture::new();
        fixture.run(&["put", "doc3", "{x: true}"]).unwrap();
        let out = fixture.run(&["put", "--purge", "doc3"]).unwrap();
        assert_eq!(out, "Purged `doc3`\n");
        assert!(!fixture
            .db
            .get_document(&CollectionSpec::default_collection(), "doc3")
            .unwrap()
            .exists());

        let err = fixture
            .run(&["put", "--update", "doc3", "{}"])
            .unwrap_err();
        assert!(matches!(err, CommandError::DocumentNotFound { .. }));
    }

    #[test]
    fn purge_of_missing_document_is_a_store_error() {
        let fixture = Fixture::new();
        let err = fixture.run(&["put", "--purge", "ghost"]).unwrap_err();
        let source = err.store_error().unwrap();
        assert!(matches!(source, CoreError::DocumentNotFound { .. }));
    }

    #[test]
    fn invalid_json_changes_nothing() {
        let fixture = Fixture::new();
        let err = fixture.run(&["put", "doc", "{a:"]).unwrap_err();
        assert!(matches!(err, CommandError::InvalidJson { .. }));
        let err = fixture.run(&["put", "doc", "[1, 2]"]).unwrap_err();
        assert!(matches!(err, CommandError::InvalidJson { .. }));
        assert_eq!(fixture.db.last_sequence().as_u64(), 0);
    }

    #[test]
    fn missing_body_and_extra_arguments() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.run(&["put", "doc"]),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            fixture.run(&["put", "--purge", "doc", "{}"]),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        let fixture = Fixture::new();
        let err = fixture
            .run(&["put", "--create", "--update", "doc", "{}"])
            .unwrap_err();
        assert!(matches!(err, CommandError::Usage(_)));
    }

    #[test]
    fn double_dash_allows_dashed_ids() {
        let fixture = Fixture::new();
        fixture.run(&["put", "--", "-odd", "{}"]).unwrap();
        assert!(fixture
            .db
            .get_document(&CollectionSpec::default_collection(), "-odd")
            .unwrap()
            .exists());
    }

    #[test]
    fn attach_embeds_blob_reference() {
        let fixture = Fixture::new();
        let photo = fixture.dir().join("photo.jpg");
        fs::write(&photo, b"not really a jpeg").unwrap();
        let photo_arg = photo.to_str().unwrap();

        let out = fixture
            .run(&["put", "--attach", photo_arg, "photos", "doc4", "{name: 'x'}"])
            .unwrap();
        assert!(out.trim_end().ends_with("with 1 blob(s)"), "{out}");

        let body = body_of(&fixture, "doc4");
        assert_eq!(body["name"], "x");
        let reference = &body["photos"];
        assert!(is_blob_reference(reference));
        assert_eq!(reference["length"], 17);
        assert_eq!(reference["content_type"], "image/jpeg");

        let key = BlobKey::parse(reference["digest"].as_str().unwrap()).unwrap();
        assert_eq!(key, BlobKey::compute(b"not really a jpeg"));
        assert_eq!(
            fixture.db.blob_store().get_contents(&key).unwrap(),
            b"not really a jpeg"
        );

        let doc = fixture
            .db
            .get_document(&CollectionSpec::default_collection(), "doc4")
            .unwrap();
        assert!(doc.flags().contains(RevisionFlags::HAS_ATTACHMENTS));
    }

    #[test]
    fn attach_defaults_and_nesting() {
        let fixture = Fixture::new();
        let data = fixture.dir().join("data.bin");
        let notes = fixture.dir().join("notes.TXT");
        fs::write(&data, [0u8, 1, 2]).unwrap();
        fs::write(&notes, b"hi").unwrap();

        let out = fixture
            .run(&[
                "put",
                "--attach",
                data.to_str().unwrap(),
                "--attach",
                notes.to_str().unwrap(),
                "notes",
                "files",
                "doc",
                "{keep: 1, files: {old: 2}}",
            ])
            .unwrap();
        assert!(out.trim_end().ends_with("with 2 blob(s)"), "{out}");

        let body = body_of(&fixture, "doc");
        assert_eq!(body["keep"], 1);
        assert_eq!(body["blobs"]["content_type"], "application/octet-stream");
        assert_eq!(body["files"]["old"], 2);
        assert_eq!(body["files"]["notes"]["content_type"], "text/plain");
    }

    #[test]
    fn attach_under_nested_property_path() {
        let fixture = Fixture::new();
        let photo = fixture.dir().join("photo.jpg");
        fs::write(&photo, b"jpeg").unwrap();

        fixture
            .run(&[
                "put",
                "--attach",
                photo.to_str().unwrap(),
                "photo",
                "attachments",
                "doc",
                "{a: 1}",
            ])
            .unwrap();
        let body = body_of(&fixture, "doc");
        assert_eq!(body["a"], 1);
        assert!(is_blob_reference(&body["attachments"]["photo"]));

        fixture
            .run(&[
                "put",
                "--attach",
                photo.to_str().unwrap(),
                "cover",
                "media.images",
                "--update",
                "doc",
                "{b: 2}",
            ])
            .unwrap();
        let body = body_of(&fixture, "doc");
        assert_eq!(body["b"], 2);
        assert!(is_blob_reference(&body["media"]["images"]["cover"]));
    }

    #[test]
    fn attach_name_with_dots_stays_top_level() {
        let fixture = Fixture::new();
        let photo = fixture.dir().join("photo.jpg");
        fs::write(&photo, b"jpeg").unwrap();

        fixture
            .run(&["put", "--attach", photo.to_str().unwrap(), "my.photo", "doc", "{}"])
            .unwrap();
        let body = body_of(&fixture, "doc");
        assert!(is_blob_reference(&body["my.photo"]));
        assert!(body.get("my").is_none());
    }

    #[test]
    fn attach_values_are_delimited() {
        let words = |line: &[&str]| line.iter().map(|w| (*w).to_string()).collect::<Vec<_>>();
        let cases: [(&[&str], &[&str]); 5] = [
            (
                &["--attach", "f", "n", "doc", "{}"],
                &["--attach", "f", "n", ";", "doc", "{}"],
            ),
            (
                &["--attach", "f", "n", "p.q", "doc", "{a:", "1}"],
                &["--attach", "f", "n", "p.q", ";", "doc", "{a:", "1}"],
            ),
            (
                &["--attach", "f", "--create", "doc", "{}"],
                &["--attach", "f", ";", "--create", "doc", "{}"],
            ),
            (
                &["--delete", "--attach", "f", "n", "doc"],
                &["--delete", "--attach", "f", "n", ";", "doc"],
            ),
            (
                &["--", "--attach", "x"],
                &["--", "--attach", "x"],
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(delimit_attach_values(&words(input)), words(expected), "{input:?}");
        }
    }

    #[test]
    fn unreadable_attachment_changes_nothing() {
        let fixture = Fixture::new();
        let good = fixture.dir().join("good.png");
        fs::write(&good, b"png").unwrap();
        let missing = fixture.dir().join("missing.png");

        let err = fixture
            .run(&[
                "put",
                "--attach",
                good.to_str().unwrap(),
                "a",
                "--attach",
                missing.to_str().unwrap(),
                "b",
                "doc",
                "{}",
            ])
            .unwrap_err();
        assert!(matches!(err, CommandError::AttachmentRead { .. }));
        assert_eq!(fixture.db.last_sequence().as_u64(), 0);
        assert!(!fixture.db.blob_store().contains(&BlobKey::compute(b"png")));
    }

    #[test]
    fn missing_collection() {
        let fixture = Fixture::new();
        let err = fixture
            .run(&["put", "--collection", "nope", "doc", "{}"])
            .unwrap_err();
        assert!(matches!(err, CommandError::CollectionNotFound { .. }));
    }

    #[test]
    fn content_types() {
        for (name, expected) in [
            ("a.jpg", "image/jpeg"),
            ("a.JPEG", "image/jpeg"),
            ("a.png", "image/png"),
            ("a.gif", "image/gif"),
            ("a.pdf", "application/pdf"),
            ("a.txt", "text/plain"),
            ("a.json", "application/json"),
            ("a.xyz", "application/octet-stream"),
            ("noext", "application/octet-stream"),
        ] {
            assert_eq!(content_type_for(Path::new(name)), expected, "{name}");
        }
    }

    #[test]
    fn outcome_rendering() {
        let outcome = PutOutcome::Saved {
            verb: "Updated",
            doc_id: "d".into(),
            rev_id: RevisionId::parse("2-0123456789abcdef0123456789abcdef01234567").unwrap(),
            sequence: SequenceNumber::new(7),
            blob_count: 0,
        };
        assert_eq!(
            outcome.to_string(),
            "Updated `d`, new revision 2-01234567 (sequence 7)"
        );
    }
}
