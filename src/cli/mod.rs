//! CLI module for motfacet
//!
//! Backs two binaries:
//! - mot-facets: run the MOT facets and print the report
//! - random-inserts: insert random records until Ctrl-C

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{FacetsCli, InsertsCli};
pub use commands::{aggregate, insert, mot_facets_command, random_inserts_command};
pub use config::{Config, DEFAULT_CONFIG_PATH};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{print_report, write_report};

use clap::Parser;

/// Parse arguments and run `mot-facets`
pub fn run_mot_facets() -> CliResult<()> {
    let cli = FacetsCli::parse();
    mot_facets_command(&cli.config)
}

/// Parse arguments and run `random-inserts`
pub fn run_random_inserts() -> CliResult<()> {
    let cli = InsertsCli::parse();
    random_inserts_command(&cli.config)
}
