//! Aggregation pipeline
//!
//! A pipeline is a list of typed stages executed in order over an in-memory
//! record sequence. Facets name a pipeline; a FacetSet groups the facets of
//! one aggregation request.
//!
//! # Stage kinds
//!
//! - Match: conjunction of field predicates
//! - Group: one output record per distinct key, with accumulators
//! - BucketAuto: balanced numeric histogram, optionally snapped to a
//!   preferred-number series
//! - Project: include, exclude and rename fields
//! - Sort: stable multi-key sort
//!
//! Stages fail fast on schema violations and never coerce values.

mod accumulator;
mod bucket;
mod errors;
mod facet;
mod filters;
mod granularity;
mod group;
mod project;
mod sorter;
mod stage;

pub use accumulator::Accumulator;
pub use bucket::BucketAutoStage;
pub use errors::{PipelineError, PipelineResult};
pub use facet::{Facet, FacetSet};
pub use filters::{FilterOp, Predicate, PredicateFilter};
pub use granularity::Granularity;
pub use group::{GroupKey, GroupStage};
pub use project::{ProjectField, ProjectStage};
pub use sorter::{SortDirection, SortSpec, SortStage};
pub use stage::{MatchStage, Shape, Stage, StageKind};
