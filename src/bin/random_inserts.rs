//! random-inserts entry point
//!
//! Inserts random records until Ctrl-C. Errors go to stderr with exit
//! code 1.

use motfacet::cli;

fn main() {
    if let Err(e) = cli::run_random_inserts() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
