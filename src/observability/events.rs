//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Store handle
    /// Store opened
    StoreOpened,
    /// Store handle released
    StoreClosed,

    // Aggregation
    /// Aggregation run begins
    AggregationStart,
    /// Source snapshot taken
    SnapshotTaken,
    /// Report assembled
    AggregationComplete,
    /// Run cancelled by token or deadline
    AggregationCancelled,

    // Load generator
    /// Insert loop begins
    GeneratorStart,
    /// Insert failed and will be retried
    InsertRetry,
    /// Insert loop stopped
    GeneratorStop,

    // Failures
    /// Store data could not be read (FATAL)
    StoreCorruption,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreClosed => "STORE_CLOSED",
            Event::AggregationStart => "AGGREGATION_START",
            Event::SnapshotTaken => "SNAPSHOT_TAKEN",
            Event::AggregationComplete => "AGGREGATION_COMPLETE",
            Event::AggregationCancelled => "AGGREGATION_CANCELLED",
            Event::GeneratorStart => "GENERATOR_START",
            Event::InsertRetry => "INSERT_RETRY",
            Event::GeneratorStop => "GENERATOR_STOP",
            Event::StoreCorruption => "STORE_CORRUPTION",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StoreCorruption)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Event::AggregationCancelled)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
