//! JSON-lines file store
//!
//! Layout: `<data_dir>/<database>/<collection>.jsonl`, one JSON object per
//! line, append-only. A line that is not a JSON object fails the whole read.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::observability::{log_event_with_fields, Event};
use crate::record::Record;

use super::errors::{check_name, SourceError, SourceResult};
use super::{RecordSink, RecordSource};

const EXTENSION: &str = "jsonl";

/// Handle to one database directory.
///
/// Opened explicitly and passed to whoever needs it. Appends are serialised
/// through an internal lock; the release is logged on drop.
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens (creating if needed) `<data_dir>/<database>`
    pub fn open(data_dir: &Path, database: &str) -> SourceResult<Self> {
        check_name(database)?;
        let root = data_dir.join(database);
        fs::create_dir_all(&root).map_err(|e| {
            SourceError::io(format!("create database directory {}", root.display()), e)
        })?;

        log_event_with_fields(
            Event::StoreOpened,
            &[("path", &root.display().to_string())],
        );

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding this database's collections
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> SourceResult<PathBuf> {
        check_name(collection)?;
        Ok(self.root.join(format!("{}.{}", collection, EXTENSION)))
    }
}

impl RecordSource for FileStore {
    fn query(&self, collection: &str) -> SourceResult<Vec<Record>> {
        let path = self.collection_path(collection)?;
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SourceError::io(format!("open {}", path.display()), e)),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| SourceError::io(format!("read {}", path.display()), e))?;
            if line.trim().is_empty() {
                continue;
            }

            let corrupt = |reason: String| {
                let line_no = (index + 1).to_string();
                log_event_with_fields(
                    Event::StoreCorruption,
                    &[("collection", collection), ("line", &line_no)],
                );
                SourceError::Corrupt {
                    collection: collection.to_string(),
                    line: index + 1,
                    reason,
                }
            };

            let value: serde_json::Value =
                serde_json::from_str(&line).map_err(|e| corrupt(e.to_string()))?;
            let record = Record::from_value(value)
                .ok_or_else(|| corrupt("line is not a JSON object".to_string()))?;
            records.push(record);
        }
        Ok(records)
    }
}

impl RecordSink for FileStore {
    fn insert(&self, collection: &str, record: Record) -> SourceResult<()> {
        let path = self.collection_path(collection)?;
        let mut line = serde_json::to_string(&record).map_err(|e| {
            SourceError::io("serialize record", std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| SourceError::Poisoned(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SourceError::io(format!("open {}", path.display()), e))?;
        // Whole line in one write so readers never see half a record
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| SourceError::io(format!("append {}", path.display()), e))
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        log_event_with_fields(
            Event::StoreClosed,
            &[("path", &self.root.display().to_string())],
        );
    }
}
