//! Output handling for the binaries
//!
//! - Report: pretty-printed JSON on stdout
//! - Progress: banner and dots on stdout, newline when the loop ends
//! - UTF-8 only

use std::io::{self, Write};

use crate::runner::Report;

use super::errors::CliResult;

/// Write a report as pretty JSON followed by a newline
pub fn write_report<W: Write>(out: &mut W, report: &Report) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Write a report to stdout
pub fn print_report(report: &Report) -> CliResult<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_report(&mut lock, report)
}

/// Terminate the progress line
pub fn finish_progress<W: Write>(out: &mut W) -> CliResult<()> {
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
