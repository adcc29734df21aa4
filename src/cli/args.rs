//! CLI argument definitions using clap
//!
//! Binaries:
//! - mot-facets [--config <path>]
//! - random-inserts [--config <path>]

use clap::Parser;
use std::path::PathBuf;

use super::config::DEFAULT_CONFIG_PATH;

/// Runs the MOT facet aggregation and prints the report as JSON
#[derive(Parser, Debug)]
#[command(name = "mot-facets")]
#[command(version, about, long_about = None)]
pub struct FacetsCli {
    /// Path to configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Inserts random records until interrupted
#[derive(Parser, Debug)]
#[command(name = "random-inserts")]
#[command(version, about, long_about = None)]
pub struct InsertsCli {
    /// Path to configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}
