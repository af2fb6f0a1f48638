//! CSV output formatting.

use crate::output::RunReport;
use crate::types::Outcome;
use std::io;

/// Render the run report as CSV, one row per verdict.
pub fn render_csv(report: &RunReport) -> io::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    write_rows(report, &mut wtr)?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Print the run report in CSV format.
pub fn print_csv(report: &RunReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    write_rows(report, &mut wtr)?;
    wtr.flush()?;
    Ok(())
}

fn write_rows<W: io::Write>(report: &RunReport, wtr: &mut csv::Writer<W>) -> io::Result<()> {
    wtr.write_record([
        "target", "rule", "verdict", "status", "detail", "elapsed_ms",
    ])?;

    for verdict in &report.verdicts {
        let (status, detail) = match &verdict.outcome {
            Outcome::Matched { evidence } => (
                evidence.status.map(|s| s.to_string()).unwrap_or_default(),
                evidence
                    .callback
                    .clone()
                    .or_else(|| evidence.excerpt.clone())
                    .unwrap_or_default(),
            ),
            Outcome::Error { reason } => (String::new(), reason.clone()),
            Outcome::NoMatch | Outcome::Cancelled => (String::new(), String::new()),
        };

        wtr.write_record([
            &verdict.target,
            &verdict.rule,
            verdict.kind(),
            &status,
            &detail,
            &verdict.elapsed_ms.to_string(),
        ])?;
    }
    Ok(())
}
