//! Verdict types: the outcome of evaluating one (target, rule) task.
//!
//! A verdict is an immutable value record emitted exactly once per task.
//! Error verdicts are reported distinctly from no-match so operators can
//! tell "target unreachable" apart from "target not vulnerable".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters of response body kept as evidence.
const EXCERPT_LIMIT: usize = 200;

/// Supporting evidence attached to a matched verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Evidence {
    /// The request that produced the match, e.g. `GET http://host/path`.
    pub request: String,
    /// HTTP status of the matched response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Bounded excerpt of the matched response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Callback address that fired, for out-of-band confirmations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
}

impl Evidence {
    /// Evidence taken from a direct request/response match.
    pub fn from_response(request: String, status: u16, body: &str) -> Self {
        Self {
            request,
            status: Some(status),
            excerpt: Some(truncate(body, EXCERPT_LIMIT)),
            callback: None,
        }
    }

    /// Evidence for a match confirmed via an out-of-band callback.
    pub fn from_callback(request: String, address: &str) -> Self {
        Self {
            request,
            status: None,
            excerpt: None,
            callback: Some(address.to_string()),
        }
    }
}

/// Classification of one task's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The rule's predicate (or its callback) matched the target.
    Matched { evidence: Evidence },
    /// All probes ran; nothing matched.
    NoMatch,
    /// The task failed (transport error, evaluation fault).
    Error { reason: String },
    /// The batch was cancelled before this task was dispatched.
    Cancelled,
}

/// Result of evaluating one (target, rule) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Target label (its URL).
    pub target: String,
    /// Stable rule name.
    pub rule: String,
    /// What the evaluation concluded.
    pub outcome: Outcome,
    /// Wall-clock time spent on the task, in milliseconds.
    pub elapsed_ms: u64,
}

impl Verdict {
    pub fn matched(
        target: impl Into<String>,
        rule: impl Into<String>,
        evidence: Evidence,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            target: target.into(),
            rule: rule.into(),
            outcome: Outcome::Matched { evidence },
            elapsed_ms,
        }
    }

    pub fn no_match(target: impl Into<String>, rule: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            target: target.into(),
            rule: rule.into(),
            outcome: Outcome::NoMatch,
            elapsed_ms,
        }
    }

    pub fn error(
        target: impl Into<String>,
        rule: impl Into<String>,
        reason: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            target: target.into(),
            rule: rule.into(),
            outcome: Outcome::Error {
                reason: reason.into(),
            },
            elapsed_ms,
        }
    }

    pub fn cancelled(target: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            rule: rule.into(),
            outcome: Outcome::Cancelled,
            elapsed_ms: 0,
        }
    }

    /// True when the rule matched, directly or via callback.
    pub fn is_match(&self) -> bool {
        matches!(self.outcome, Outcome::Matched { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, Outcome::Cancelled)
    }

    /// Short stable label for table/CSV output.
    pub fn kind(&self) -> &'static str {
        match self.outcome {
            Outcome::Matched { .. } => "matched",
            Outcome::NoMatch => "no-match",
            Outcome::Error { .. } => "error",
            Outcome::Cancelled => "cancelled",
        }
    }

    /// Evidence for matched verdicts, if present.
    pub fn evidence(&self) -> Option<&Evidence> {
        match &self.outcome {
            Outcome::Matched { evidence } => Some(evidence),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Matched { .. } => write!(f, "{} {} matched", self.target, self.rule),
            Outcome::NoMatch => write!(f, "{} {} no match", self.target, self.rule),
            Outcome::Error { reason } => {
                write!(f, "{} {} error: {}", self.target, self.rule, reason)
            }
            Outcome::Cancelled => write!(f, "{} {} cancelled", self.target, self.rule),
        }
    }
}

/// Truncate on a char boundary, appending an ellipsis when shortened.
fn truncate(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(limit).collect();
        out.push('…');
        out
    }
}
