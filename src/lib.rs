//! # Lancet - A Concurrent HTTP Vulnerability-Probe Scanner
//!
//! Lancet takes a cross product of HTTP targets and PoC rules, schedules
//! the resulting probe tasks under a bounded worker pool and an optional
//! global rate limiter, and settles exactly one verdict per task - matched,
//! no-match, error, or cancelled - no matter how many targets are dead.
//!
//! ## Features
//!
//! - **Batch Scanning**: targets × rules with a concurrency ceiling and a
//!   smoothed dispatch-rate ceiling, enforced independently
//! - **Failure Isolation**: a panicking rule or an unreachable target
//!   poisons only its own task, never the batch
//! - **Out-of-Band Confirmation**: blind checks plant callback tokens and
//!   confirm hits through a DNS-log service (ceye.io, godnslog)
//! - **Declarative Rules**: YAML rule files with composable matchers,
//!   plus a compiled-in rule set
//! - **Cooperative Cancellation**: Ctrl-C stops dispatch, in-flight probes
//!   finish, undispatched tasks settle as cancelled
//! - **Multiple Output Formats**: plain text, JSON, and CSV run reports
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use lancet::engine::{EngineSettings, ScanEngine};
//! use lancet::http::{HttpClient, HttpSettings};
//! use lancet::reverse::Correlator;
//! use lancet::rules::{RuleLocator, RuleRegistry};
//! use lancet::types::Target;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = HttpClient::configure(&HttpSettings::default()).unwrap();
//!     let engine = ScanEngine::new(
//!         Arc::new(transport),
//!         Correlator::disabled(),
//!         Arc::new(RuleRegistry::with_builtins()),
//!         EngineSettings::default(),
//!     );
//!
//!     let target = Target::parse("example.com").unwrap();
//!     let verdicts = engine
//!         .probe_target(&target, &RuleLocator::Pattern("*".into()))
//!         .await
//!         .unwrap();
//!
//!     for verdict in verdicts {
//!         println!("{verdict}");
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`types`] - Core type definitions with newtype patterns for type safety
//! - [`engine`] - The batch scheduler, rule evaluator, and scan entry points
//! - [`rules`] - The `Rule` trait, declarative PoC rules, and rule loading
//! - [`http`] - The shared HTTP client pool behind the `HttpTransport` seam
//! - [`reverse`] - Out-of-band callback correlation
//! - [`config`] - Configuration management
//! - [`error`] - Comprehensive error types
//! - [`output`] - Output formatting utilities

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod output;
pub mod reverse;
pub mod rules;
pub mod types;

// Re-export commonly used types
pub use engine::{EngineSettings, ScanEngine, VerdictSink};
pub use error::{CliError, ScanError};
pub use rules::{Rule, RuleLocator, RuleRegistry, RuleSource};
pub use types::{Outcome, ScanId, Target, Verdict};
