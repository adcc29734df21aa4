//! Project stage
//!
//! Reshapes each record without changing record count or order.

use crate::record::{path_root, Record};

use super::errors::{PipelineError, PipelineResult};

const STAGE: &str = "project";

/// One projection entry
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectField {
    /// Keep a top-level field
    Include(String),
    /// Drop a top-level field
    Exclude(String),
    /// Emit `to` with the value found at path `from`
    Rename { to: String, from: String },
}

/// Project stage configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectStage {
    pub fields: Vec<ProjectField>,
}

impl ProjectStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.fields.push(ProjectField::Include(field.into()));
        self
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.fields.push(ProjectField::Exclude(field.into()));
        self
    }

    pub fn rename(mut self, to: impl Into<String>, from: impl Into<String>) -> Self {
        self.fields.push(ProjectField::Rename {
            to: to.into(),
            from: from.into(),
        });
        self
    }

    /// True if only listed fields survive
    pub fn is_inclusive(&self) -> bool {
        self.fields
            .iter()
            .any(|f| !matches!(f, ProjectField::Exclude(_)))
    }

    pub(crate) fn excludes(&self, field: &str) -> bool {
        self.fields
            .iter()
            .any(|f| matches!(f, ProjectField::Exclude(name) if name == field))
    }

    pub(crate) fn check(&self) -> PipelineResult<()> {
        if self.fields.is_empty() {
            return Err(PipelineError::InvalidStage(format!(
                "{}: no fields specified",
                STAGE
            )));
        }
        for field in &self.fields {
            let name = match field {
                ProjectField::Include(name) | ProjectField::Rename { to: name, .. } => name,
                ProjectField::Exclude(name) => {
                    // Only _id may be excluded from an inclusive projection
                    if self.is_inclusive() && name != "_id" {
                        return Err(PipelineError::InvalidStage(format!(
                            "{}: cannot exclude '{}' in an inclusive projection",
                            STAGE, name
                        )));
                    }
                    name
                }
            };
            if name.is_empty() || name.contains('.') {
                return Err(PipelineError::InvalidStage(format!(
                    "{}: invalid field '{}'",
                    STAGE, name
                )));
            }
        }
        Ok(())
    }

    /// Output field names when the projection is inclusive
    pub fn output_fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .fields
            .iter()
            .filter_map(|f| match f {
                ProjectField::Include(name) | ProjectField::Rename { to: name, .. } => {
                    Some(name.as_str())
                }
                ProjectField::Exclude(_) => None,
            })
            .collect();
        if !self.excludes("_id") && !names.contains(&"_id") {
            names.push("_id");
        }
        names
    }

    /// Root fields read from the input
    pub fn source_roots(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|f| match f {
                ProjectField::Rename { from, .. } => Some(path_root(from)),
                _ => None,
            })
            .collect()
    }

    fn project(&self, record: Record) -> Record {
        if !self.is_inclusive() {
            let mut out = record;
            for field in &self.fields {
                if let ProjectField::Exclude(name) = field {
                    out.remove(name);
                }
            }
            return out;
        }

        let mut out = Record::new();
        if !self.excludes("_id") {
            if let Some(id) = record.get("_id") {
                out.insert("_id", id.clone());
            }
        }
        for field in &self.fields {
            match field {
                ProjectField::Include(name) => {
                    if let Some(v) = record.get(name) {
                        out.insert(name.clone(), v.clone());
                    }
                }
                ProjectField::Rename { to, from } => {
                    // Missing sources are omitted, not nulled
                    if let Some(v) = record.lookup(from) {
                        out.insert(to.clone(), v.clone());
                    }
                }
                ProjectField::Exclude(_) => {}
            }
        }
        out
    }

    /// Runs the stage
    pub fn apply(&self, input: Vec<Record>) -> PipelineResult<Vec<Record>> {
        self.check()?;
        Ok(input.into_iter().map(|r| self.project(r)).collect())
    }
}
