//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV renditions of a
//! finished scan run, plus the streaming console sink used while the
//! run is still going.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::print_csv;
pub use json_format::print_json;
pub use plain::{
    print_error, print_info, print_plain, print_run_header, print_warning, ConsoleSink,
};

use crate::cli::OutputFormat;
use crate::types::{ScanId, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;

/// Complete account of one scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: ScanId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Distinct targets dispatched.
    pub targets: usize,
    /// Distinct rules dispatched.
    pub rules: usize,
    pub verdicts: Vec<Verdict>,
}

impl RunReport {
    /// Assemble a report around a settled verdict list.
    pub fn new(
        targets: usize,
        rules: usize,
        started_at: DateTime<Utc>,
        verdicts: Vec<Verdict>,
    ) -> Self {
        Self {
            id: ScanId::new(),
            started_at,
            finished_at: Utc::now(),
            targets,
            rules,
            verdicts,
        }
    }

    pub fn matched(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_match()).count()
    }

    pub fn errors(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_error()).count()
    }

    pub fn cancelled(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_cancelled()).count()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Format and print a run report in the selected format.
pub fn format_report(report: &RunReport, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::print_plain(report),
        OutputFormat::Json => json_format::print_json(report),
        OutputFormat::Csv => csv_format::print_csv(report),
    }
}

/// Render a run report to a string, for writing to a file.
///
/// Plain renders without terminal styling.
pub fn render_report(report: &RunReport, format: OutputFormat) -> io::Result<String> {
    match format {
        OutputFormat::Plain => Ok(plain::render_lines(report)),
        OutputFormat::Json => json_format::render_json(report),
        OutputFormat::Csv => csv_format::render_csv(report),
    }
}
