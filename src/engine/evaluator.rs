//! Single-task evaluation: one rule against one target, one verdict out.

use crate::http::HttpTransport;
use crate::reverse::Correlator;
use crate::rules::Rule;
use crate::types::{Evidence, Outcome, Target, Verdict};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Evaluates one (target, rule) pair to an [`Outcome`].
///
/// Probes run in rule order and every matcher must hold, short-circuiting
/// on the first miss. A transport failure ends the evaluation with an
/// error outcome. When the direct probes miss but the rule planted a
/// callback token, the correlator gets a grace window to confirm an
/// out-of-band hit before the verdict settles as no-match.
#[derive(Clone)]
pub struct Evaluator {
    transport: Arc<dyn HttpTransport>,
    correlator: Correlator,
    callback_grace: Duration,
}

impl Evaluator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        correlator: Correlator,
        callback_grace: Duration,
    ) -> Self {
        Self {
            transport,
            correlator,
            callback_grace,
        }
    }

    /// Settle one pair into exactly one verdict. Never errors: every
    /// failure mode folds into the verdict itself.
    pub async fn evaluate(&self, target: &Target, rule: &dyn Rule) -> Verdict {
        let started = Instant::now();
        let outcome = self.outcome(target, rule).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let label = target.to_string();
        match outcome {
            Outcome::Matched { evidence } => {
                Verdict::matched(label, rule.name(), evidence, elapsed_ms)
            }
            Outcome::NoMatch => Verdict::no_match(label, rule.name(), elapsed_ms),
            Outcome::Error { reason } => Verdict::error(label, rule.name(), reason, elapsed_ms),
            Outcome::Cancelled => Verdict::cancelled(label, rule.name()),
        }
    }

    async fn outcome(&self, target: &Target, rule: &dyn Rule) -> Outcome {
        if rule.needs_callback() && !self.correlator.is_enabled() {
            warn!(
                rule = rule.name(),
                "no callback service configured; this rule's blind probes are skipped"
            );
        }

        // None in degraded mode; the rule then drops its blind probes and
        // its direct ones still run.
        let echo = if rule.needs_callback() {
            self.correlator.mint()
        } else {
            None
        };

        let probes = match rule.probes(target, echo.as_ref()) {
            Ok(probes) => probes,
            Err(e) => {
                return Outcome::Error {
                    reason: e.to_string(),
                }
            }
        };
        if probes.is_empty() {
            return Outcome::NoMatch;
        }
        let planted = probes[0].request.request_line();

        let mut direct_hit = None;
        for probe in &probes {
            let response = match self.transport.execute(&probe.request).await {
                Ok(response) => response,
                Err(e) => {
                    return Outcome::Error {
                        reason: e.to_string(),
                    }
                }
            };
            trace!(
                rule = rule.name(),
                url = %probe.request.url,
                status = response.status,
                elapsed = ?response.elapsed,
                "probe answered"
            );
            if probe.matcher.matches(&response) {
                direct_hit = Some(Evidence::from_response(
                    probe.request.request_line(),
                    response.status,
                    &response.body,
                ));
            } else {
                direct_hit = None;
                break;
            }
        }

        if let Some(evidence) = direct_hit {
            return Outcome::Matched { evidence };
        }

        if let Some(echo) = echo {
            debug!(
                rule = rule.name(),
                token = %echo.token,
                "direct probes missed, waiting on callback confirmation"
            );
            if self
                .correlator
                .was_triggered(&echo.token, self.callback_grace)
                .await
            {
                return Outcome::Matched {
                    evidence: Evidence::from_callback(planted, &echo.address),
                };
            }
        }

        Outcome::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockTransport;
    use crate::reverse::mock::MockProvider;
    use crate::rules::{builtin_rules, PocRule};

    fn rule(yaml: &str) -> PocRule {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn evaluator(transport: MockTransport) -> Evaluator {
        Evaluator::new(
            Arc::new(transport),
            Correlator::disabled(),
            Duration::ZERO,
        )
    }

    fn git_rule() -> PocRule {
        builtin_rules()
            .into_iter()
            .find(|r| r.name == "git-config-exposure")
            .unwrap()
    }

    #[tokio::test]
    async fn test_matching_response_produces_matched_verdict() {
        let eval = evaluator(MockTransport::status(200).with_body("[core]\n\trepositoryformatversion = 0"));
        let target = Target::parse("example.test").unwrap();

        let verdict = eval.evaluate(&target, &git_rule()).await;
        assert!(verdict.is_match());
        let evidence = verdict.evidence().unwrap();
        assert_eq!(evidence.status, Some(200));
        assert_eq!(evidence.request, "GET http://example.test/.git/config");
        assert!(evidence.excerpt.as_deref().unwrap().contains("[core]"));
    }

    #[tokio::test]
    async fn test_wrong_status_is_no_match_not_error() {
        let eval = evaluator(MockTransport::status(500).with_body("[core]"));
        let target = Target::parse("example.test").unwrap();

        let verdict = eval.evaluate(&target, &git_rule()).await;
        assert_eq!(verdict.kind(), "no-match");
        assert!(!verdict.is_error());
    }

    #[tokio::test]
    async fn test_status_predicate_misses_on_healthy_response() {
        let eval = evaluator(MockTransport::status(200));
        let five_hundred = rule(
            r#"
name: error-page-probe
probes:
  - path: /
    matcher:
      status_is: 500
"#,
        );
        let target = Target::parse("http://example.test").unwrap();

        let verdict = eval.evaluate(&target, &five_hundred).await;
        assert_eq!(verdict.kind(), "no-match");
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error_verdict() {
        let eval = evaluator(MockTransport::failing());
        let target = Target::parse("example.test").unwrap();

        let verdict = eval.evaluate(&target, &git_rule()).await;
        assert!(verdict.is_error());
    }

    #[tokio::test]
    async fn test_multi_probe_short_circuits_on_first_miss() {
        let transport = Arc::new(MockTransport::status(404));
        let eval = Evaluator::new(
            transport.clone(),
            Correlator::disabled(),
            Duration::ZERO,
        );
        let two_probes = rule(
            r#"
name: two-step
probes:
  - path: /step-one
    matcher:
      status_is: 200
  - path: /step-two
    matcher:
      status_is: 200
"#,
        );
        let target = Target::parse("example.test").unwrap();

        let verdict = eval.evaluate(&target, &two_probes).await;
        assert_eq!(verdict.kind(), "no-match");
        assert_eq!(transport.hits().len(), 1);
    }

    #[tokio::test]
    async fn test_all_probes_must_match_and_last_supplies_evidence() {
        let transport = Arc::new(MockTransport::status(200).with_body("step body"));
        let eval = Evaluator::new(
            transport.clone(),
            Correlator::disabled(),
            Duration::ZERO,
        );
        let two_probes = rule(
            r#"
name: two-step
probes:
  - path: /step-one
    matcher:
      status_is: 200
  - path: /step-two
    matcher:
      body_contains: "step body"
"#,
        );
        let target = Target::parse("example.test").unwrap();

        let verdict = eval.evaluate(&target, &two_probes).await;
        assert!(verdict.is_match());
        assert_eq!(
            verdict.evidence().unwrap().request,
            "GET http://example.test/step-two"
        );
        assert_eq!(transport.hits().len(), 2);
    }

    #[tokio::test]
    async fn test_blind_rule_without_correlator_degrades_to_no_match() {
        let transport = Arc::new(MockTransport::status(200));
        let eval = Evaluator::new(
            transport.clone(),
            Correlator::disabled(),
            Duration::ZERO,
        );
        let blind = rule(
            r#"
name: blind
probes:
  - path: /
    headers:
      X-Probe: "{{reverse}}"
    matcher: never
"#,
        );
        let target = Target::parse("example.test").unwrap();

        let verdict = eval.evaluate(&target, &blind).await;
        assert_eq!(verdict.kind(), "no-match");
        // Every probe in this rule needs the echo, so nothing goes out.
        assert!(transport.hits().is_empty());
    }

    #[tokio::test]
    async fn test_degraded_rule_keeps_its_direct_probes() {
        let transport = Arc::new(MockTransport::status(200).with_body("exposed"));
        let eval = Evaluator::new(
            transport.clone(),
            Correlator::disabled(),
            Duration::ZERO,
        );
        let mixed = rule(
            r#"
name: mixed
probes:
  - path: /
    headers:
      X-Probe: "{{reverse}}"
    matcher: never
  - path: /status
    matcher:
      all:
        - status_is: 200
        - body_contains: "exposed"
"#,
        );
        let target = Target::parse("example.test").unwrap();

        let verdict = eval.evaluate(&target, &mixed).await;
        // The blind probe is skipped but direct detection still works.
        assert!(verdict.is_match());
        assert_eq!(transport.hits(), vec!["http://example.test/status"]);
    }

    #[tokio::test]
    async fn test_callback_confirmation_turns_miss_into_match() {
        let provider = Arc::new(MockProvider::new("dig.example.test"));
        provider.hit_everything();
        let transport = Arc::new(MockTransport::status(200));
        let eval = Evaluator::new(
            transport.clone(),
            Correlator::with_provider(provider.clone()),
            Duration::ZERO,
        );

        let blind = rule(
            r#"
name: blind
probes:
  - path: /
    headers:
      X-Probe: "{{reverse}}"
    matcher: never
"#,
        );
        let target = Target::parse("example.test").unwrap();

        let verdict = eval.evaluate(&target, &blind).await;
        assert!(verdict.is_match());
        assert_eq!(transport.hits().len(), 1);
        assert!(provider.query_count() >= 1);

        let evidence = verdict.evidence().unwrap();
        assert_eq!(evidence.status, None);
        assert!(evidence
            .callback
            .as_deref()
            .unwrap()
            .ends_with(".dig.example.test"));
    }

    #[tokio::test]
    async fn test_unconfirmed_callback_stays_no_match() {
        let provider = Arc::new(MockProvider::new("dig.example.test"));
        let transport = Arc::new(MockTransport::status(200));
        let eval = Evaluator::new(
            transport.clone(),
            Correlator::with_provider(provider.clone()),
            Duration::ZERO,
        );

        let blind = rule(
            r#"
name: blind
probes:
  - path: /
    headers:
      X-Probe: "{{reverse}}"
    matcher: never
"#,
        );
        let target = Target::parse("example.test").unwrap();

        let verdict = eval.evaluate(&target, &blind).await;
        assert_eq!(verdict.kind(), "no-match");
        // The payload did go out; only the confirmation was missing.
        assert_eq!(transport.hits().len(), 1);
        assert!(provider.query_count() >= 1);
    }

    #[tokio::test]
    async fn test_evaluation_is_idempotent() {
        let eval = evaluator(MockTransport::status(200).with_body("[core]"));
        let target = Target::parse("example.test").unwrap();
        let rule = git_rule();

        let first = eval.evaluate(&target, &rule).await;
        let second = eval.evaluate(&target, &rule).await;
        assert_eq!(first.kind(), second.kind());
        assert_eq!(first.target, second.target);
        assert_eq!(first.rule, second.rule);
    }
}
