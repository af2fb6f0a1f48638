//! Error types for lancet.
//!
//! Uses `thiserror` for ergonomic error definitions. `ScanError` covers the
//! engine: its configuration variants abort a batch before any task runs,
//! while its transport variants are converted into error verdicts at the
//! task boundary and never propagate past a worker.

use thiserror::Error;

/// Main error type for scanning operations.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid proxy URL '{url}': {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rule error: {0}")]
    Rule(#[from] crate::rules::RuleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Map a reqwest failure onto the scan error taxonomy.
    ///
    /// Timeouts and connection failures get their own variants so verdicts
    /// can report "target unreachable" distinctly from other faults.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScanError::Timeout
        } else if err.is_connect() {
            ScanError::ConnectionFailed(err.to_string())
        } else {
            ScanError::Transport(err.to_string())
        }
    }
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors loading or persisting configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {}: {reason}", path.display())]
    ReadFailed { path: std::path::PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error type for the CLI layer, wrapping everything `main` can hit.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Target(#[from] crate::types::TargetError),

    #[error(transparent)]
    Rule(#[from] crate::rules::RuleError),

    #[error(transparent)]
    Reverse(#[from] crate::reverse::ReverseError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
