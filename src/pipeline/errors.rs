//! Pipeline error types
//!
//! Every error here is a configuration or schema error. Stages never coerce
//! values to get past one.

use thiserror::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while validating or executing stages
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A stage required a field that an input record does not have
    #[error("{stage}: missing field '{field}'")]
    MissingField { stage: &'static str, field: String },

    /// A field holds a value of the wrong type
    #[error("{stage}: field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        stage: &'static str,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A field holds a value of the right type outside the accepted domain
    #[error("{stage}: field '{field}' has invalid value {value}")]
    InvalidValue {
        stage: &'static str,
        field: String,
        value: String,
    },

    /// Stage configuration is unusable
    #[error("Invalid stage: {0}")]
    InvalidStage(String),

    /// A stage depends on a field its upstream stage cannot produce
    #[error("facet '{facet}' stage {index} ({stage}): field '{field}' is not produced upstream")]
    Shape {
        facet: String,
        index: usize,
        stage: &'static str,
        field: String,
    },

    /// Two facets share a name
    #[error("Duplicate facet: {0}")]
    DuplicateFacet(String),
}

impl PipelineError {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::MissingField { .. } => "FACET_MISSING_FIELD",
            PipelineError::TypeMismatch { .. } => "FACET_TYPE_MISMATCH",
            PipelineError::InvalidValue { .. } => "FACET_INVALID_VALUE",
            PipelineError::InvalidStage(_) => "FACET_INVALID_STAGE",
            PipelineError::Shape { .. } => "FACET_SHAPE_VIOLATION",
            PipelineError::DuplicateFacet(_) => "FACET_DUPLICATE",
        }
    }

    /// Returns true if this error was raised before any record was read
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidStage(_)
                | PipelineError::Shape { .. }
                | PipelineError::DuplicateFacet(_)
        )
    }
}
