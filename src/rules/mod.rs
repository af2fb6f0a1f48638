//! PoC rule model, loading, and selection.
//!
//! A rule is a named vulnerability check. Rules are pure: given a target
//! (and optionally a callback echo) they derive the concrete probe requests
//! and the predicates applied to the responses, while the engine owns all
//! network I/O. Rules come from two places: the built-in set compiled into
//! the binary and YAML files loaded from a rule directory.

mod builtin;
mod file;
mod matcher;
mod poc;
mod registry;

pub use builtin::builtin_rules;
pub use file::FileRuleSource;
pub use matcher::Matcher;
pub use poc::{PocRule, ProbeSpec, Severity};
pub use registry::{RuleLocator, RuleRegistry};

use crate::http::ProbeRequest;
use crate::types::{CallbackEcho, Target};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading or applying rules.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("unknown rule: {0}")]
    Unknown(String),

    #[error("duplicate rule name: {0}")]
    Duplicate(String),

    #[error("rule file {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid rule '{name}': {reason}")]
    Invalid { name: String, reason: String },

    #[error("invalid rule selector '{pattern}': {reason}")]
    BadSelector { pattern: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One probe: a concrete request plus the predicate for its response.
#[derive(Debug, Clone)]
pub struct Probe {
    pub request: ProbeRequest,
    pub matcher: Matcher,
}

/// Resolves rule names and selectors into loaded rules.
///
/// The engine depends on this seam, never on where rules come from;
/// [`RuleRegistry`] is the shipped implementation.
pub trait RuleSource: Send + Sync {
    /// Exactly one rule by name; a miss is an error.
    fn load_one(&self, name: &str) -> Result<Arc<dyn Rule>, RuleError>;

    /// Every rule a locator selects, in name order. A pattern selecting
    /// nothing is an empty list, not an error.
    fn load_many(&self, locator: &RuleLocator) -> Result<Vec<Arc<dyn Rule>>, RuleError>;
}

/// A named vulnerability check.
pub trait Rule: Send + Sync {
    /// Stable name, unique within a registry.
    fn name(&self) -> &str;

    /// Reported severity.
    fn severity(&self) -> Severity {
        Severity::Medium
    }

    /// Whether this rule plants an out-of-band callback token.
    fn needs_callback(&self) -> bool {
        false
    }

    /// Derive the ordered probe sequence for one target.
    ///
    /// `callback` is `Some` when the correlator minted an echo for this
    /// evaluation; rules that do not use one ignore it. With `None`,
    /// implementations omit the probes that cannot carry a payload without
    /// an echo and return the rest.
    fn probes(
        &self,
        target: &Target,
        callback: Option<&CallbackEcho>,
    ) -> Result<Vec<Probe>, RuleError>;
}
