//! The scan engine.
//!
//! Owns the worker ceiling, the dispatch rate gate, the shared transport,
//! and the callback correlator, and exposes the four scan entry points:
//! one rule against one target, many rules against one target, one rule
//! across many targets, and the full cartesian batch. Only the cartesian
//! batch is paced by the rate gate; the other entry points run under the
//! worker ceiling alone.

mod evaluator;
mod rate_limit;
mod scheduler;
mod sink;

pub use evaluator::Evaluator;
pub use rate_limit::RateGate;
pub use scheduler::{BatchScheduler, Task};
pub use sink::{CollectingSink, NullSink, VerdictSink};

use crate::error::ScanResult;
use crate::http::HttpTransport;
use crate::reverse::Correlator;
use crate::rules::{RuleLocator, RuleSource};
use crate::types::{Target, Verdict};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Scan-wide knobs.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Worker ceiling for concurrently evaluated tasks.
    pub concurrency: usize,
    /// Batch dispatch budget in tasks per second; zero disables pacing.
    pub rate: u32,
    /// How long a blind rule may wait for callback confirmation.
    pub callback_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            rate: 100,
            callback_grace: Duration::from_secs(5),
        }
    }
}

impl EngineSettings {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_callback_grace(mut self, grace: Duration) -> Self {
        self.callback_grace = grace;
        self
    }
}

/// Concurrent vulnerability-probe engine.
///
/// Every entry point settles exactly one verdict per (target, rule) pair
/// it dispatches, whatever happens on the wire.
pub struct ScanEngine {
    evaluator: Evaluator,
    rules: Arc<dyn RuleSource>,
    settings: EngineSettings,
    sink: Arc<dyn VerdictSink>,
    cancel: CancellationToken,
}

impl ScanEngine {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        correlator: Correlator,
        rules: Arc<dyn RuleSource>,
        settings: EngineSettings,
    ) -> Self {
        let evaluator = Evaluator::new(transport, correlator, settings.callback_grace);
        Self {
            evaluator,
            rules,
            settings,
            sink: Arc::new(NullSink),
            cancel: CancellationToken::new(),
        }
    }

    /// Stream verdicts into `sink` as they settle, on top of the
    /// returned list.
    pub fn with_sink(mut self, sink: Arc<dyn VerdictSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Token that halts further dispatch when cancelled. Probes already
    /// in flight finish and settle normally.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// One rule against one target.
    pub async fn probe_single(&self, target: &Target, rule_name: &str) -> ScanResult<Verdict> {
        let rule = self.rules.load_one(rule_name)?;
        let task = Task::new(Arc::new(target.clone()), rule);
        let mut verdicts = self.dispatch(vec![task], RateGate::disabled()).await;
        match verdicts.pop() {
            Some(verdict) => Ok(verdict),
            // The scheduler settles one verdict per task; this arm only
            // keeps a scheduler bug from taking the caller down with it.
            None => Ok(Verdict::error(
                target.to_string(),
                rule_name,
                "scheduler settled no verdict for the task",
                0,
            )),
        }
    }

    /// Every selected rule against one target. Not rate gated.
    pub async fn probe_target(
        &self,
        target: &Target,
        locator: &RuleLocator,
    ) -> ScanResult<Vec<Verdict>> {
        let rules = self.rules.load_many(locator)?;
        if rules.is_empty() {
            debug!(?locator, "selector matched no rules");
            return Ok(Vec::new());
        }
        let target = Arc::new(target.clone());
        let tasks = rules
            .into_iter()
            .map(|rule| Task::new(Arc::clone(&target), rule))
            .collect();
        Ok(self.dispatch(tasks, RateGate::disabled()).await)
    }

    /// One rule across many targets. Worker ceiling only.
    pub async fn probe_targets(
        &self,
        targets: &[Target],
        rule_name: &str,
    ) -> ScanResult<Vec<Verdict>> {
        let rule = self.rules.load_one(rule_name)?;
        let tasks = targets
            .iter()
            .map(|target| Task::new(Arc::new(target.clone()), Arc::clone(&rule)))
            .collect();
        Ok(self.dispatch(tasks, RateGate::disabled()).await)
    }

    /// The full batch: every selected rule against every target, paced by
    /// the rate gate. Tasks are ordered target-major.
    pub async fn probe_batch(
        &self,
        targets: &[Target],
        locator: &RuleLocator,
    ) -> ScanResult<Vec<Verdict>> {
        let rules = self.rules.load_many(locator)?;
        if rules.is_empty() {
            debug!(?locator, "selector matched no rules");
            return Ok(Vec::new());
        }
        let mut tasks = Vec::with_capacity(targets.len() * rules.len());
        for target in targets {
            let target = Arc::new(target.clone());
            for rule in &rules {
                tasks.push(Task::new(Arc::clone(&target), Arc::clone(rule)));
            }
        }
        info!(
            targets = targets.len(),
            rules = rules.len(),
            tasks = tasks.len(),
            "starting batch scan"
        );
        Ok(self.dispatch(tasks, self.gate()).await)
    }

    fn gate(&self) -> RateGate {
        RateGate::per_second(self.settings.rate)
    }

    async fn dispatch(&self, tasks: Vec<Task>, gate: RateGate) -> Vec<Verdict> {
        let scheduler = BatchScheduler::new(
            self.evaluator.clone(),
            gate,
            self.settings.concurrency,
            self.cancel.clone(),
        );
        scheduler.run(tasks, self.sink.as_ref()).await
    }
}
