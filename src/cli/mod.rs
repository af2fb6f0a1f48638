//! Command-line interface.
//!
//! A single flat argument set: pick targets (`-t`, `-l`, or `-r`), pick
//! rules (`-p` name or glob, `-P` extra rule directory), tune the engine
//! (`--num`, `--rate`, `--timeout`, `--proxy`), and optionally wire up a
//! callback service (`-e`). All file reading and flag handling lives here;
//! the engine only ever sees parsed targets and a rule locator.

mod scan;

pub use scan::execute;

use clap::Parser;
use std::path::PathBuf;

/// Lancet - a concurrent HTTP vulnerability-probe scanner.
///
/// Probes one or many targets with named PoC rules, under a bounded
/// worker pool and an optional dispatch rate limit. Blind checks can be
/// confirmed through an out-of-band DNS-log service.
#[derive(Parser, Debug)]
#[command(name = "lancet")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent HTTP vulnerability-probe scanner", long_about = None)]
pub struct Cli {
    /// Target to scan: a URL or a bare host (http:// is assumed)
    #[arg(short = 't', long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Load targets from FILE, one per line; blank lines and # comments
    /// are skipped
    #[arg(short = 'l', long = "target-file", value_name = "FILE")]
    pub target_file: Option<PathBuf>,

    /// Build the target from a raw serialized HTTP request in FILE
    #[arg(short = 'r', long = "raw", value_name = "FILE")]
    pub raw_file: Option<PathBuf>,

    /// Force https when the raw request-target is relative
    #[arg(long)]
    pub ssl: bool,

    /// Rule selector: an exact rule name or a glob over names,
    /// e.g. thinkphp-* (default: every loaded rule)
    #[arg(short = 'p', long = "poc", value_name = "NAME")]
    pub poc: Option<String>,

    /// Load additional YAML rule files from DIRECTORY
    #[arg(short = 'P', long = "poc-dir", value_name = "DIRECTORY")]
    pub poc_dir: Option<PathBuf>,

    /// Maximum concurrently evaluated tasks
    #[arg(long, value_name = "NUM")]
    pub num: Option<usize>,

    /// Dispatch rate for batch scans, tasks per second (0 = unlimited)
    #[arg(long, value_name = "RATE")]
    pub rate: Option<u32>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Upstream HTTP proxy, e.g. http://127.0.0.1:8080
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Cookie header sent with every probe
    #[arg(long, value_name = "COOKIE")]
    pub cookie: Option<String>,

    /// Callback service URI, e.g. ceye://abc123.ceye.io?api=KEY or
    /// godnslog://probe.godnslog.com?secret=KEY
    #[arg(short = 'e', long, value_name = "URI")]
    pub reverse: Option<String>,

    /// Output format for the run report (default from settings, plain
    /// out of the box)
    #[arg(short = 'o', long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Also write the report to FILE
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Log level debug; also streams misses to the console
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Log level info
    #[arg(short = 'i', long)]
    pub info: bool,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Plain
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation_parses() {
        let cli = Cli::try_parse_from(["lancet", "-t", "example.com"]).unwrap();
        assert_eq!(cli.target.as_deref(), Some("example.com"));
        assert!(cli.poc.is_none());
        // Settings supply the format when the flag is absent.
        assert_eq!(cli.output, None);
        assert!(!cli.ssl);
    }

    #[test]
    fn test_batch_invocation_parses() {
        let cli = Cli::try_parse_from([
            "lancet",
            "-l",
            "hosts.txt",
            "-p",
            "thinkphp-*",
            "--num",
            "20",
            "--rate",
            "50",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.target_file.as_deref().unwrap().to_str(), Some("hosts.txt"));
        assert_eq!(cli.poc.as_deref(), Some("thinkphp-*"));
        assert_eq!(cli.num, Some(20));
        assert_eq!(cli.rate, Some(50));
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_output_format_parses_from_settings_strings() {
        assert_eq!("plain".parse(), Ok(OutputFormat::Plain));
        assert_eq!("json".parse(), Ok(OutputFormat::Json));
        assert_eq!("csv".parse(), Ok(OutputFormat::Csv));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_unknown_output_format_is_rejected() {
        let result = Cli::try_parse_from(["lancet", "-t", "x", "-o", "xml"]);
        assert!(result.is_err());
    }
}
