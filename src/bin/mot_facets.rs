//! mot-facets entry point
//!
//! Parses arguments, runs the aggregation and prints the report. Errors go
//! to stderr with exit code 1.

use motfacet::cli;

fn main() {
    if let Err(e) = cli::run_mot_facets() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
