//! Store error types
//!
//! Error codes:
//! - STORE_IO_ERROR (ERROR)
//! - STORE_INVALID_NAME (ERROR)
//! - STORE_CORRUPTION (FATAL)
//! - STORE_POISONED (FATAL)

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors raised by a record source or sink
#[derive(Debug, Error)]
pub enum SourceError {
    /// Disk I/O failure
    #[error("STORE_IO_ERROR: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A database or collection name cannot be used as a path component
    #[error("STORE_INVALID_NAME: '{0}'")]
    InvalidName(String),

    /// A stored line is not a JSON object
    #[error("STORE_CORRUPTION: {collection} line {line}: {reason}")]
    Corrupt {
        collection: String,
        line: usize,
        reason: String,
    },

    /// A lock guarding store state was poisoned by a panicking writer
    #[error("STORE_POISONED: {0}")]
    Poisoned(String),
}

impl SourceError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        SourceError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SourceError::Io { .. } => "STORE_IO_ERROR",
            SourceError::InvalidName(_) => "STORE_INVALID_NAME",
            SourceError::Corrupt { .. } => "STORE_CORRUPTION",
            SourceError::Poisoned(_) => "STORE_POISONED",
        }
    }

    /// Fatal errors mean stored data or store state cannot be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Corrupt { .. } | SourceError::Poisoned(_))
    }

    /// Transient errors may succeed if the operation is retried
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

/// Validates a database or collection name
pub(crate) fn check_name(name: &str) -> SourceResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if valid {
        Ok(())
    } else {
        Err(SourceError::InvalidName(name.to_string()))
    }
}
