//! Newline-delimited JSON file endpoint.

use super::{DocRecord, EndpointOptions, Role, DEFAULT_ID_PROPERTY};
use crate::error::{EndpointError, EndpointResult};
use litedoc_core::{generate_doc_id, Body};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file with one JSON object per line.
///
/// The document ID lives in a property of each object (`_id` unless
/// configured otherwise).
#[derive(Debug)]
pub struct JsonEndpoint {
    path: PathBuf,
    id_property: String,
    writer: Option<BufWriter<File>>,
}

impl JsonEndpoint {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            id_property: DEFAULT_ID_PROPERTY.to_string(),
            writer: None,
        }
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn prepare(&mut self, role: Role, options: &EndpointOptions) -> EndpointResult<()> {
        self.id_property = options.id_property.clone();
        match role {
            Role::Source => {
                if !self.path.is_file() {
                    return Err(EndpointError::NotFound {
                        path: self.path.clone(),
                    });
                }
            }
            Role::Destination => {
                let file = if options.existing {
                    if !self.path.is_file() {
                        return Err(EndpointError::NotFound {
                            path: self.path.clone(),
                        });
                    }
                    OpenOptions::new().append(true).open(&self.path)
                } else {
                    File::create(&self.path)
                }
                .map_err(|e| EndpointError::io(&self.path, e))?;
                self.writer = Some(BufWriter::new(file));
            }
        }
        Ok(())
    }

    pub(crate) fn read(&mut self, limit: Option<usize>) -> EndpointResult<Vec<DocRecord>> {
        let text = fs::read_to_string(&self.path).map_err(|e| EndpointError::io(&self.path, e))?;
        let limit = limit.unwrap_or(usize::MAX);
        let mut records = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if records.len() >= limit {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            records.push(self.parse_line(line, index + 1)?);
        }
        debug!(count = records.len(), path = ?self.path, "read JSON records");
        Ok(records)
    }

    fn parse_line(&self, line: &str, line_no: usize) -> EndpointResult<DocRecord> {
        let invalid = |message: String| EndpointError::InvalidRecord {
            path: self.path.clone(),
            line: Some(line_no),
            message,
        };
        let mut map = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(invalid("not a JSON object".to_string())),
            Err(e) => return Err(invalid(e.to_string())),
        };
        let doc_id = match map.remove(&self.id_property) {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Null) | None => generate_doc_id(),
            Some(Value::String(_)) => return Err(invalid("empty document ID".to_string())),
            Some(other) => other.to_string(),
        };
        Ok(DocRecord {
            doc_id,
            body: Body::from_map(map),
        })
    }

    pub(crate) fn write(&mut self, records: &[DocRecord]) -> EndpointResult<usize> {
        let writer = self.writer.as_mut().ok_or(EndpointError::NotPrepared)?;
        for record in records {
            let mut map = Map::with_capacity(record.body.len() + 1);
            map.insert(self.id_property.clone(), Value::String(record.doc_id.clone()));
            for (key, value) in record.body.as_map() {
                if *key != self.id_property {
                    map.insert(key.clone(), value.clone());
                }
            }
            writeln!(writer, "{}", Value::Object(map))
                .map_err(|e| EndpointError::io(&self.path, e))?;
        }
        Ok(records.len())
    }

    pub(crate) fn finish(&mut self) -> EndpointResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| EndpointError::io(&self.path, e))?;
        }
        Ok(())
    }
}
