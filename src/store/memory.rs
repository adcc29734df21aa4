//! In-memory record store

use std::collections::HashMap;
use std::sync::RwLock;

use crate::record::Record;

use super::errors::{check_name, SourceError, SourceResult};
use super::{RecordSink, RecordSource};

/// Collections held in memory, guarded by a reader/writer lock
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding one collection
    pub fn with_collection(collection: impl Into<String>, records: Vec<Record>) -> Self {
        let mut data = HashMap::new();
        data.insert(collection.into(), records);
        Self {
            data: RwLock::new(data),
        }
    }

    /// Number of records in a collection
    pub fn count(&self, collection: &str) -> SourceResult<usize> {
        let data = self
            .data
            .read()
            .map_err(|e| SourceError::Poisoned(e.to_string()))?;
        Ok(data.get(collection).map_or(0, Vec::len))
    }
}

impl RecordSource for MemoryStore {
    fn query(&self, collection: &str) -> SourceResult<Vec<Record>> {
        check_name(collection)?;
        let data = self
            .data
            .read()
            .map_err(|e| SourceError::Poisoned(e.to_string()))?;
        Ok(data.get(collection).cloned().unwrap_or_default())
    }
}

impl RecordSink for MemoryStore {
    fn insert(&self, collection: &str, record: Record) -> SourceResult<()> {
        check_name(collection)?;
        let mut data = self
            .data
            .write()
            .map_err(|e| SourceError::Poisoned(e.to_string()))?;
        data.entry(collection.to_string()).or_default().push(record);
        Ok(())
    }
}
