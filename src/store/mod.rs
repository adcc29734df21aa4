//! Document store access
//!
//! The pipeline only needs two capabilities from a store: reading every
//! record of a collection and appending a record. `MemoryStore` keeps
//! collections in memory; `FileStore` keeps one JSON-lines file per
//! collection under `<data_dir>/<database>/`.

mod errors;
mod file;
mod memory;

pub use errors::{SourceError, SourceResult};
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::pipeline::{PipelineError, Stage};
use crate::record::Record;

/// Read access to collections
pub trait RecordSource: Send + Sync {
    /// Returns every record of a collection in insertion order.
    ///
    /// A collection that does not exist is empty, not an error.
    fn query(&self, collection: &str) -> SourceResult<Vec<Record>>;

    /// Runs a single pipeline over a collection
    fn aggregate(&self, collection: &str, stages: &[Stage]) -> Result<Vec<Record>, AggregateError> {
        let mut records = self.query(collection)?;
        for stage in stages {
            records = stage.apply(records)?;
        }
        Ok(records)
    }
}

/// Write access to collections
pub trait RecordSink: Send + Sync {
    /// Appends one record to a collection
    fn insert(&self, collection: &str, record: Record) -> SourceResult<()>;
}

/// Failure of a single-pipeline aggregation
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
