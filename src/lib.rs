//! motfacet - faceted aggregation over MOT vehicle test records
//!
//! - `pipeline`: typed stages (match, group, bucketAuto, project, sort)
//!   composed into named facets
//! - `runner`: executes a facet set over one snapshot of a collection
//! - `store`: in-memory and JSON-lines record stores
//! - `generator`: continuous random-insert load generator
//! - `mot`: the built-in MOT facets

pub mod cli;
pub mod generator;
pub mod mot;
pub mod observability;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod store;
