//! CLI-specific error types
//!
//! Every CLI error ends the process with exit code 1.

use std::fmt;
use std::io;

use crate::generator::GeneratorError;
use crate::pipeline::PipelineError;
use crate::runner::AggregationError;
use crate::store::SourceError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, runtime setup)
    IoError,
    /// Store could not be opened
    StoreError,
    /// Aggregation failed
    AggregationFailed,
    /// Insert loop failed
    GeneratorFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "MOTFACET_CLI_CONFIG_ERROR",
            Self::IoError => "MOTFACET_CLI_IO_ERROR",
            Self::StoreError => "MOTFACET_CLI_STORE_ERROR",
            Self::AggregationFailed => "MOTFACET_CLI_AGGREGATION_FAILED",
            Self::GeneratorFailed => "MOTFACET_CLI_GENERATOR_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        Self::new(CliErrorCode::StoreError, e.to_string())
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        Self::new(CliErrorCode::AggregationFailed, e.to_string())
    }
}

impl From<AggregationError> for CliError {
    fn from(e: AggregationError) -> Self {
        Self::new(CliErrorCode::AggregationFailed, e.to_string())
    }
}

impl From<GeneratorError> for CliError {
    fn from(e: GeneratorError) -> Self {
        Self::new(CliErrorCode::GeneratorFailed, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
