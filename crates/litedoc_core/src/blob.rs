//! Content-addressed blob storage.
//!
//! Blobs live outside document bodies. A document refers to a blob with a
//! small reference object:
//!
//! ```text
//! {"@type": "blob", "digest": "sha256-…", "length": 1234, "content_type": "image/jpeg"}
//! ```
//!
//! On disk every blob is one file named after its digest inside the
//! database's `Attachments/` directory.

use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Property that marks a dictionary as a typed object.
pub const OBJECT_TYPE_PROPERTY: &str = "@type";
/// Object type value of a blob reference.
pub const OBJECT_TYPE_BLOB: &str = "blob";
/// Property holding a blob's digest.
pub const BLOB_DIGEST_PROPERTY: &str = "digest";
/// Property holding a blob's length in bytes.
pub const BLOB_LENGTH_PROPERTY: &str = "length";
/// Property holding a blob's MIME type.
pub const BLOB_CONTENT_TYPE_PROPERTY: &str = "content_type";

const DIGEST_PREFIX: &str = "sha256-";
const BLOB_FILE_EXTENSION: &str = "blob";

/// SHA-256 digest identifying a blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobKey([u8; 32]);

impl BlobKey {
    /// Computes the key of some content.
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Parses a rendered key (`sha256-<hex>`).
    pub fn parse(s: &str) -> CoreResult<Self> {
        let invalid = || CoreError::invalid_format(format!("invalid blob key: {s:?}"));
        let hex_part = s.strip_prefix(DIGEST_PREFIX).ok_or_else(invalid)?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| invalid())?;
        Ok(Self(bytes))
    }

    /// Returns the raw digest.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn file_name(&self) -> String {
        format!("{}.{BLOB_FILE_EXTENSION}", hex::encode(self.0))
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DIGEST_PREFIX}{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({self})")
    }
}

/// Builds the reference object stored in a document for a blob.
#[must_use]
pub fn blob_reference(key: &BlobKey, length: u64, content_type: &str) -> Value {
    json!({
        OBJECT_TYPE_PROPERTY: OBJECT_TYPE_BLOB,
        BLOB_DIGEST_PROPERTY: key.to_string(),
        BLOB_LENGTH_PROPERTY: length,
        BLOB_CONTENT_TYPE_PROPERTY: content_type,
    })
}

/// Returns `true` if `value` is a blob reference object.
#[must_use]
pub fn is_blob_reference(value: &Value) -> bool {
    value
        .get(OBJECT_TYPE_PROPERTY)
        .and_then(Value::as_str)
        .is_some_and(|t| t == OBJECT_TYPE_BLOB)
}

enum Backing {
    Disk(PathBuf),
    Memory(Mutex<HashMap<BlobKey, Vec<u8>>>),
}

/// Stores blob contents keyed by digest.
pub struct BlobStore {
    backing: Backing,
    read_only: bool,
}

impl BlobStore {
    pub(crate) fn on_disk(dir: PathBuf, read_only: bool) -> Self {
        Self {
            backing: Backing::Disk(dir),
            read_only,
        }
    }

    pub(crate) fn in_memory() -> Self {
        Self {
            backing: Backing::Memory(Mutex::new(HashMap::new())),
            read_only: false,
        }
    }

    /// Stores `data` and returns its key.
    ///
    /// Storing the same content twice is a no-op that returns the same key.
    pub fn create_blob(&self, data: &[u8]) -> CoreResult<BlobKey> {
        if self.read_only {
            return Err(CoreError::ReadOnly);
        }
        let key = BlobKey::compute(data);
        match &self.backing {
            Backing::Memory(blobs) => {
                blobs.lock().entry(key).or_insert_with(|| data.to_vec());
            }
            Backing::Disk(dir) => {
                let path = dir.join(key.file_name());
                if !path.exists() {
                    fs::create_dir_all(dir)?;
                    write_atomically(dir, &path, data)?;
                }
            }
        }
        tracing::debug!(%key, length = data.len(), "stored blob");
        Ok(key)
    }

    /// Returns the contents of a blob.
    pub fn get_contents(&self, key: &BlobKey) -> CoreResult<Vec<u8>> {
        let not_found = || CoreError::BlobNotFound {
            key: key.to_string(),
        };
        match &self.backing {
            Backing::Memory(blobs) => blobs.lock().get(key).cloned().ok_or_else(not_found),
            Backing::Disk(dir) => match fs::read(dir.join(key.file_name())) {
                Ok(data) => Ok(data),
                Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Returns `true` if the blob is stored.
    #[must_use]
    pub fn contains(&self, key: &BlobKey) -> bool {
        match &self.backing {
            Backing::Memory(blobs) => blobs.lock().contains_key(key),
            Backing::Disk(dir) => dir.join(key.file_name()).is_file(),
        }
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match &self.backing {
            Backing::Disk(dir) => dir.display().to_string(),
            Backing::Memory(_) => "<memory>".to_string(),
        };
        f.debug_struct("BlobStore")
            .field("location", &location)
            .field("read_only", &self.read_only)
            .finish()
    }
}

fn write_atomically(dir: &Path, path: &Path, data: &[u8]) -> CoreResult<()> {
    let temp_path = dir.join(format!("incoming-{}.tmp", Uuid::new_v4().simple()));
    let result = (|| {
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    Ok(result?)
}
