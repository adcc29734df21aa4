//! Aggregation run errors
//!
//! Error codes:
//! - RUN_SOURCE_FAILED (source code's severity)
//! - RUN_FACET_FAILED (ERROR)
//! - RUN_CANCELLED (ERROR)
//! - RUN_DEADLINE_EXCEEDED (ERROR)
//! - RUN_TASK_FAILED (FATAL)

use std::time::Duration;

use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::store::SourceError;

/// Failure of an aggregation run. No partial report accompanies any variant.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The snapshot could not be read
    #[error("RUN_SOURCE_FAILED: {0}")]
    Source(#[from] SourceError),

    /// One facet failed; the others were aborted
    #[error("RUN_FACET_FAILED: facet '{facet}': {error}")]
    Facet {
        facet: String,
        #[source]
        error: PipelineError,
    },

    /// The cancellation token fired before the report was assembled
    #[error("RUN_CANCELLED: aggregation cancelled")]
    Cancelled,

    /// The run did not finish within its deadline
    #[error("RUN_DEADLINE_EXCEEDED: aggregation exceeded {0:?}")]
    DeadlineExceeded(Duration),

    /// A facet task panicked or could not be joined
    #[error("RUN_TASK_FAILED: {0}")]
    Task(String),
}

impl AggregationError {
    pub fn code(&self) -> &'static str {
        match self {
            AggregationError::Source(_) => "RUN_SOURCE_FAILED",
            AggregationError::Facet { .. } => "RUN_FACET_FAILED",
            AggregationError::Cancelled => "RUN_CANCELLED",
            AggregationError::DeadlineExceeded(_) => "RUN_DEADLINE_EXCEEDED",
            AggregationError::Task(_) => "RUN_TASK_FAILED",
        }
    }

    pub fn is_fatal(&self) -> bool {
        match self {
            AggregationError::Source(e) => e.is_fatal(),
            AggregationError::Task(_) => true,
            _ => false,
        }
    }

    /// Name of the failing facet, if a facet failed
    pub fn facet(&self) -> Option<&str> {
        match self {
            AggregationError::Facet { facet, .. } => Some(facet),
            _ => None,
        }
    }
}
