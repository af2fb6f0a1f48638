//! Plain text output formatting.
//!
//! Human-readable run summaries with colors, plus the streaming console
//! sink that prints findings while the scan is still running.

use crate::engine::VerdictSink;
use crate::output::RunReport;
use crate::types::{Outcome, Verdict};
use console::{style, Style};
use indicatif::ProgressBar;
use std::io::{self, Write};

/// Print the run summary in human-readable plain text.
pub fn print_plain(report: &RunReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Header
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        style("═══════════════════════════════════════════════════════════════")
            .cyan()
    )?;
    writeln!(
        out,
        "                    {} Scan Report",
        style("Lancet").cyan().bold()
    )?;
    writeln!(
        out,
        "{}",
        style("═══════════════════════════════════════════════════════════════")
            .cyan()
    )?;
    writeln!(out)?;

    // Run info
    writeln!(
        out,
        "  {} {}",
        style("Run ID:").bold(),
        style(report.id.short()).dim()
    )?;
    writeln!(
        out,
        "  {} {} targets, {} rules",
        style("Coverage:").bold(),
        report.targets,
        report.rules
    )?;
    writeln!(
        out,
        "  {} {} tasks settled in {:.2}s",
        style("Statistics:").bold(),
        report.verdicts.len(),
        report.duration_ms() as f64 / 1000.0
    )?;
    writeln!(
        out,
        "               {} matched, {} errors, {} cancelled",
        style(report.matched()).green().bold(),
        style(report.errors()).red(),
        style(report.cancelled()).yellow()
    )?;
    writeln!(out)?;

    // Findings table: matches and errors only, misses stay in the counts
    let notable: Vec<&Verdict> = report
        .verdicts
        .iter()
        .filter(|v| v.is_match() || v.is_error())
        .collect();

    if notable.is_empty() {
        writeln!(out, "  {}", style("No findings to display.").dim())?;
    } else {
        writeln!(
            out,
            "  {}",
            style("───────────────────────────────────────────────────────────────")
                .dim()
        )?;
        writeln!(
            out,
            "  {:<9}  {:<26}  {:<30}  {}",
            style("VERDICT").bold(),
            style("RULE").bold(),
            style("TARGET").bold(),
            style("DETAIL").bold()
        )?;
        writeln!(
            out,
            "  {}",
            style("───────────────────────────────────────────────────────────────")
                .dim()
        )?;

        for verdict in notable {
            let kind_style = if verdict.is_match() {
                Style::new().green().bold()
            } else {
                Style::new().red()
            };
            writeln!(
                out,
                "  {:<9}  {:<26}  {:<30}  {}",
                kind_style.apply_to(verdict.kind()),
                verdict.rule,
                truncate_display(&verdict.target, 30),
                style(truncate_display(&detail(verdict), 40)).dim()
            )?;
        }

        writeln!(
            out,
            "  {}",
            style("───────────────────────────────────────────────────────────────")
                .dim()
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        style("═══════════════════════════════════════════════════════════════")
            .cyan()
    )?;
    writeln!(out)?;

    Ok(())
}

/// Unstyled one-line-per-finding rendition for file export.
pub fn render_lines(report: &RunReport) -> String {
    let mut out = String::new();
    for verdict in &report.verdicts {
        if verdict.is_match() || verdict.is_error() {
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                verdict.kind(),
                verdict.target,
                verdict.rule,
                detail(verdict)
            ));
        }
    }
    out.push_str(&format!(
        "# {} tasks, {} matched, {} errors, {} cancelled\n",
        report.verdicts.len(),
        report.matched(),
        report.errors(),
        report.cancelled()
    ));
    out
}

/// Print a run header before scanning begins.
pub fn print_run_header(targets: usize, rules: usize, concurrency: usize, rate: u32) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("Lancet").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Targets: {}",
        style("•").dim(),
        style(targets).white().bold()
    );
    println!(
        "{} Rules: {}",
        style("•").dim(),
        style(rules).white().bold()
    );
    let pace = if rate == 0 {
        "unlimited".to_string()
    } else {
        format!("{rate}/s")
    };
    println!(
        "{} Workers: {}, dispatch rate: {}",
        style("•").dim(),
        style(concurrency).white().bold(),
        pace
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Streams verdicts to the terminal as they settle.
///
/// Matched findings print green with their evidence and errors print red,
/// so an unreachable host reads differently from a clean miss. No-match
/// and cancelled verdicts only appear in verbose mode.
pub struct ConsoleSink {
    verbose: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleSink {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            progress: None,
        }
    }

    /// Route lines through a progress bar so they print above it.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    fn emit(&self, line: String) {
        match &self.progress {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }
}

impl VerdictSink for ConsoleSink {
    fn accept(&self, verdict: &Verdict) {
        if let Some(bar) = &self.progress {
            bar.inc(1);
        }
        match &verdict.outcome {
            Outcome::Matched { .. } => {
                self.emit(format!(
                    "{} {}  {}  {}",
                    style("[+]").green().bold(),
                    style(&verdict.rule).green().bold(),
                    verdict.target,
                    style(truncate_display(&detail(verdict), 60)).dim()
                ));
            }
            Outcome::Error { reason } => {
                self.emit(format!(
                    "{} {}  {}  {}",
                    style("[!]").red().bold(),
                    verdict.rule,
                    verdict.target,
                    style(truncate_display(reason, 60)).red()
                ));
            }
            Outcome::NoMatch if self.verbose => {
                self.emit(format!(
                    "{} {}  {}",
                    style("[-]").dim(),
                    style(&verdict.rule).dim(),
                    style(&verdict.target).dim()
                ));
            }
            Outcome::Cancelled if self.verbose => {
                self.emit(format!(
                    "{} {}  {}",
                    style("[x]").yellow(),
                    verdict.rule,
                    verdict.target
                ));
            }
            _ => {}
        }
    }
}

/// One-line description of what settled the verdict.
fn detail(verdict: &Verdict) -> String {
    let flat = |s: &str| s.replace(['\n', '\r', '\t'], " ");
    match &verdict.outcome {
        Outcome::Matched { evidence } => {
            if let Some(address) = &evidence.callback {
                format!("callback {address}")
            } else {
                match (evidence.status, evidence.excerpt.as_deref()) {
                    (Some(status), Some(excerpt)) => format!("{} {}", status, flat(excerpt)),
                    (Some(status), None) => status.to_string(),
                    _ => evidence.request.clone(),
                }
            }
        }
        Outcome::Error { reason } => flat(reason),
        _ => String::new(),
    }
}

/// Truncate for display, adding an ellipsis when cut.
fn truncate_display(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
