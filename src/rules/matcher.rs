//! Match predicates applied to buffered probe responses.

use crate::http::ProbeResponse;
use crate::rules::RuleError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Declarative predicate evaluated against a buffered response.
///
/// Matchers are pure data: they serialize into rule files and never touch
/// the network. Composite variants nest arbitrarily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Status code equals the given value.
    StatusIs(u16),
    /// Body contains the given substring, case-sensitive.
    BodyContains(String),
    /// Body matches the given regular expression.
    BodyMatches(String),
    /// Named header is present and its value contains the fragment.
    HeaderContains { name: String, value: String },
    /// Round trip took at least this many milliseconds.
    DurationAtLeast(u64),
    /// Every inner matcher holds.
    All(Vec<Matcher>),
    /// At least one inner matcher holds.
    Any(Vec<Matcher>),
    /// Inner matcher does not hold.
    Not(Box<Matcher>),
    /// Unconditionally true.
    Always,
    /// Unconditionally false. Pure out-of-band probes use this so that a
    /// match can only come from the callback correlator.
    Never,
}

impl Matcher {
    /// Verify every regex in the tree compiles.
    ///
    /// Runs at rule load time so a bad pattern rejects the rule before any
    /// probe is sent.
    pub fn validate(&self) -> Result<(), RuleError> {
        match self {
            Matcher::BodyMatches(pattern) => match Regex::new(pattern) {
                Ok(_) => Ok(()),
                Err(e) => Err(RuleError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }),
            },
            Matcher::All(inner) | Matcher::Any(inner) => {
                inner.iter().try_for_each(Matcher::validate)
            }
            Matcher::Not(inner) => inner.validate(),
            _ => Ok(()),
        }
    }

    /// Evaluate against a response.
    ///
    /// An uncompilable regex evaluates to false; load-time validation makes
    /// that unreachable for registry rules.
    pub fn matches(&self, response: &ProbeResponse) -> bool {
        match self {
            Matcher::StatusIs(code) => response.status == *code,
            Matcher::BodyContains(fragment) => response.body.contains(fragment.as_str()),
            Matcher::BodyMatches(pattern) => Regex::new(pattern)
                .map(|re| re.is_match(&response.body))
                .unwrap_or(false),
            Matcher::HeaderContains { name, value } => response
                .headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .map(|v| v.contains(value.as_str()))
                .unwrap_or(false),
            Matcher::DurationAtLeast(ms) => response.elapsed >= Duration::from_millis(*ms),
            Matcher::All(inner) => inner.iter().all(|m| m.matches(response)),
            Matcher::Any(inner) => inner.iter().any(|m| m.matches(response)),
            Matcher::Not(inner) => !inner.matches(response),
            Matcher::Always => true,
            Matcher::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    fn response(status: u16, body: &str) -> ProbeResponse {
        ProbeResponse {
            status,
            headers: HeaderMap::new(),
            body: body.to_string(),
            elapsed: Duration::from_millis(40),
        }
    }

    #[test]
    fn test_status_and_body() {
        let resp = response(200, "repositoryformatversion = 0\n[core]");
        assert!(Matcher::StatusIs(200).matches(&resp));
        assert!(!Matcher::StatusIs(404).matches(&resp));
        assert!(Matcher::BodyContains("[core]".into()).matches(&resp));
        assert!(!Matcher::BodyContains("[remote]".into()).matches(&resp));
    }

    #[test]
    fn test_body_regex() {
        let resp = response(200, "PHP Version 7.4.3");
        assert!(Matcher::BodyMatches(r"PHP Version \d+\.\d+".into()).matches(&resp));
        assert!(!Matcher::BodyMatches(r"^Apache".into()).matches(&resp));
    }

    #[test]
    fn test_header_contains() {
        let mut resp = response(200, "");
        resp.headers
            .insert("server", "Apache/2.4.41 (Ubuntu)".parse().unwrap());

        let hit = Matcher::HeaderContains {
            name: "Server".into(),
            value: "Apache".into(),
        };
        let miss = Matcher::HeaderContains {
            name: "Server".into(),
            value: "nginx".into(),
        };
        assert!(hit.matches(&resp));
        assert!(!miss.matches(&resp));
    }

    #[test]
    fn test_duration_threshold() {
        let resp = response(200, "");
        assert!(Matcher::DurationAtLeast(10).matches(&resp));
        assert!(!Matcher::DurationAtLeast(5_000).matches(&resp));
    }

    #[test]
    fn test_composites() {
        let resp = response(200, "[core]");
        let both = Matcher::All(vec![
            Matcher::StatusIs(200),
            Matcher::BodyContains("[core]".into()),
        ]);
        let either = Matcher::Any(vec![
            Matcher::StatusIs(500),
            Matcher::BodyContains("[core]".into()),
        ]);
        assert!(both.matches(&resp));
        assert!(either.matches(&resp));
        assert!(Matcher::Not(Box::new(Matcher::StatusIs(404))).matches(&resp));
        assert!(Matcher::Always.matches(&resp));
        assert!(!Matcher::Never.matches(&resp));
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let bad = Matcher::All(vec![
            Matcher::StatusIs(200),
            Matcher::BodyMatches("[unclosed".into()),
        ]);
        assert!(matches!(
            bad.validate(),
            Err(RuleError::InvalidPattern { .. })
        ));
        assert!(Matcher::BodyMatches(r"\d+".into()).validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
all:
  - status_is: 200
  - body_contains: "[core]"
"#;
        let parsed: Matcher = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            parsed,
            Matcher::All(vec![
                Matcher::StatusIs(200),
                Matcher::BodyContains("[core]".into()),
            ])
        );

        let unit: Matcher = serde_yaml::from_str("never").unwrap();
        assert_eq!(unit, Matcher::Never);
    }
}
