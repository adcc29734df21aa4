//! Facets: named, ordered stage sequences
//!
//! Stages run strictly in declared order; each stage consumes the full
//! output of the one before it.

use crate::record::Record;

use super::errors::{PipelineError, PipelineResult};
use super::stage::{Shape, Stage};

/// A named pipeline producing one entry of a report
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    name: String,
    stages: Vec<Stage>,
}

impl Facet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Appends a stage
    pub fn stage(mut self, stage: impl Into<Stage>) -> Self {
        self.stages.push(stage.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Checks every stage's configuration and that each stage's required
    /// fields can be produced by the stage before it.
    pub fn validate(&self) -> PipelineResult<()> {
        let mut shape = Shape::Open;
        for (index, stage) in self.stages.iter().enumerate() {
            stage.check()?;
            if let Some(missing) = stage
                .required_roots()
                .into_iter()
                .find(|root| !shape.provides(root))
            {
                return Err(PipelineError::Shape {
                    facet: self.name.clone(),
                    index,
                    stage: stage.kind().as_str(),
                    field: missing.to_string(),
                });
            }
            shape = stage.output_shape(&shape);
        }
        Ok(())
    }

    /// Runs every stage in order over `input`
    pub fn execute(&self, input: Vec<Record>) -> PipelineResult<Vec<Record>> {
        self.stages
            .iter()
            .try_fold(input, |records, stage| stage.apply(records))
    }
}

/// Facets keyed by unique name, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSet {
    facets: Vec<Facet>,
}

impl FacetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a facet, rejecting duplicate names
    pub fn with(mut self, facet: Facet) -> PipelineResult<Self> {
        self.insert(facet)?;
        Ok(self)
    }

    pub fn insert(&mut self, facet: Facet) -> PipelineResult<()> {
        if self.get(facet.name()).is_some() {
            return Err(PipelineError::DuplicateFacet(facet.name().to_string()));
        }
        self.facets.push(facet);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Facet> {
        self.facets.iter().find(|f| f.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Facet> {
        self.facets.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.facets.iter().map(Facet::name).collect()
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Validates every facet
    pub fn validate(&self) -> PipelineResult<()> {
        self.facets.iter().try_for_each(Facet::validate)
    }
}
