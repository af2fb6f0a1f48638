//! JSON output formatting.

use crate::output::RunReport;
use std::io;

/// Render the run report as pretty-printed JSON.
pub fn render_json(report: &RunReport) -> io::Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Print the run report in JSON format.
pub fn print_json(report: &RunReport) -> io::Result<()> {
    println!("{}", render_json(report)?);
    Ok(())
}
