//! Database directory management.
//!
//! This module handles the file system layout of a LiteDoc database:
//!
//! ```text
//! <name>.litedoc/
//! ├─ LOCK              # Advisory lock for single-writer
//! ├─ db.json           # Committed snapshot
//! └─ Attachments/      # Blob files, one per digest
//! ```
//!
//! The LOCK file ensures only one process can open the database at a time.
//! The snapshot is replaced atomically on every commit.

use crate::error::{CoreError, CoreResult};
use crate::snapshot::Snapshot;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File names within the database directory.
const LOCK_FILE: &str = "LOCK";
const SNAPSHOT_FILE: &str = "db.json";
/// Temporary file for atomic snapshot writes.
const SNAPSHOT_TEMP: &str = "db.json.tmp";
/// Directory holding blob files.
const ATTACHMENTS_DIR: &str = "Attachments";

/// Manages the database directory structure and file locking.
///
/// The `DatabaseDir` holds an exclusive lock on the database directory for
/// as long as it is alive.
#[derive(Debug)]
pub struct DatabaseDir {
    /// Root directory path.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl DatabaseDir {
    /// Opens or creates a database directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another handle holds the lock (returns `DatabaseLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_format(format!(
                    "database directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::DatabaseLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the database directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.path.join(SNAPSHOT_FILE)
    }

    /// Returns the path to the blob directory.
    #[must_use]
    pub fn attachments_dir(&self) -> PathBuf {
        self.path.join(ATTACHMENTS_DIR)
    }

    /// Checks if this is a new (empty) database directory.
    #[must_use]
    pub fn is_new_database(&self) -> bool {
        !self.snapshot_path().exists()
    }

    /// Loads the snapshot from disk.
    ///
    /// Returns `None` if the snapshot file doesn't exist (new database).
    pub(crate) fn load_snapshot(&self) -> CoreResult<Option<Snapshot>> {
        let data = match fs::read(self.snapshot_path()) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if data.is_empty() {
            return Ok(None);
        }
        Snapshot::decode(&data).map(Some)
    }

    /// Saves the snapshot to disk atomically.
    ///
    /// Uses write-then-rename:
    /// 1. Write to temporary file
    /// 2. Sync temporary file to disk (if `sync`)
    /// 3. Rename temporary file over the snapshot
    /// 4. Fsync the directory so the rename is durable (if `sync`)
    pub(crate) fn save_snapshot(&self, snapshot: &Snapshot, sync: bool) -> CoreResult<()> {
        let temp_path = self.path.join(SNAPSHOT_TEMP);

        let data = snapshot.encode()?;
        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        if sync {
            file.sync_all()?;
        }
        drop(file);

        fs::rename(&temp_path, self.snapshot_path())?;

        if sync {
            self.sync_directory()?;
        }
        Ok(())
    }

    /// Syncs the database directory so metadata updates are durable.
    #[cfg(unix)]
    fn sync_directory(&self) -> CoreResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> CoreResult<()> {
        // NTFS journaling covers rename durability
        Ok(())
    }
}
