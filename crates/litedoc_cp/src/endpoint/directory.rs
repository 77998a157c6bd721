//! Directory-of-JSON-files endpoint.

use super::{DocRecord, EndpointOptions, Role};
use crate::error::{EndpointError, EndpointResult};
use litedoc_core::Body;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const FILE_EXTENSION: &str = "json";

/// A directory holding one `<id>.json` file per document.
///
/// `%` and `/` in document IDs are percent-escaped in file names.
#[derive(Debug, Clone)]
pub struct DirectoryEndpoint {
    path: PathBuf,
}

impl DirectoryEndpoint {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
        }
    }

    /// Path of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn prepare(&mut self, role: Role, options: &EndpointOptions) -> EndpointResult<()> {
        if role == Role::Destination && !options.existing {
            return fs::create_dir_all(&self.path).map_err(|e| EndpointError::io(&self.path, e));
        }
        if !self.path.is_dir() {
            return Err(EndpointError::NotFound {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn read(&mut self, limit: Option<usize>) -> EndpointResult<Vec<DocRecord>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(|e| EndpointError::io(&self.path, e))? {
            let entry = entry.map_err(|e| EndpointError::io(&self.path, e))?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == FILE_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();

        let mut records = Vec::new();
        for path in files.into_iter().take(limit.unwrap_or(usize::MAX)) {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                debug!(?path, "skipping file with non-UTF-8 name");
                continue;
            };
            let doc_id = unescape_id(stem);
            let text = fs::read_to_string(&path).map_err(|e| EndpointError::io(&path, e))?;
            let body = Body::from_json(&text).map_err(|e| EndpointError::InvalidRecord {
                path: path.clone(),
                line: None,
                message: e.to_string(),
            })?;
            records.push(DocRecord { doc_id, body });
        }
        Ok(records)
    }

    pub(crate) fn write(&mut self, records: &[DocRecord]) -> EndpointResult<usize> {
        for record in records {
            let path = self
                .path
                .join(format!("{}.{FILE_EXTENSION}", escape_id(&record.doc_id)));
            fs::write(&path, record.body.to_json()).map_err(|e| EndpointError::io(&path, e))?;
        }
        Ok(records.len())
    }
}

fn escape_id(doc_id: &str) -> String {
    doc_id.replace('%', "%25").replace('/', "%2F")
}

fn unescape_id(stem: &str) -> String {
    stem.replace("%2F", "/").replace("%2f", "/").replace("%25", "%")
}
