//! Sort stage
//!
//! Sorts by one or more keys. The sort is stable: records equal on every key
//! keep their upstream order.

use std::cmp::Ordering;

use crate::record::{compare_values, Record};

use super::errors::{PipelineError, PipelineResult};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field path to sort by
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Sort stage configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortStage {
    pub keys: Vec<SortSpec>,
}

impl SortStage {
    pub fn by(spec: SortSpec) -> Self {
        Self { keys: vec![spec] }
    }

    /// Adds a tie-break key
    pub fn then(mut self, spec: SortSpec) -> Self {
        self.keys.push(spec);
        self
    }

    pub(crate) fn check(&self) -> PipelineResult<()> {
        if self.keys.is_empty() {
            return Err(PipelineError::InvalidStage(
                "sort: at least one key is required".to_string(),
            ));
        }
        Ok(())
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for spec in &self.keys {
            let ordering = compare_values(a.lookup(&spec.field), b.lookup(&spec.field));
            let ordering = match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Runs the stage
    pub fn apply(&self, mut input: Vec<Record>) -> PipelineResult<Vec<Record>> {
        self.check()?;
        // slice::sort_by is stable
        input.sort_by(|a, b| self.compare(a, b));
        Ok(input)
    }
}
