//! Bounded-concurrency task dispatch.

use crate::engine::evaluator::Evaluator;
use crate::engine::rate_limit::RateGate;
use crate::engine::sink::VerdictSink;
use crate::rules::Rule;
use crate::types::{Target, Verdict};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One schedulable unit: a target paired with a rule.
#[derive(Clone)]
pub struct Task {
    pub target: Arc<Target>,
    pub rule: Arc<dyn Rule>,
}

impl Task {
    pub fn new(target: Arc<Target>, rule: Arc<dyn Rule>) -> Self {
        Self { target, rule }
    }
}

/// Drives a task list to completion under a worker ceiling and a dispatch
/// rate gate.
///
/// Accounting is exact: every task settles into exactly one verdict,
/// collected in completion order. Cancellation marks undispatched tasks
/// instead of dropping them; a panicking rule poisons only its own task.
pub struct BatchScheduler {
    evaluator: Evaluator,
    gate: RateGate,
    concurrency: usize,
    cancel: CancellationToken,
}

impl BatchScheduler {
    pub fn new(
        evaluator: Evaluator,
        gate: RateGate,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            evaluator,
            gate,
            concurrency: concurrency.max(1),
            cancel,
        }
    }

    /// Run every task to a verdict, handing each to the sink as it settles.
    pub async fn run(&self, tasks: Vec<Task>, sink: &dyn VerdictSink) -> Vec<Verdict> {
        let total = tasks.len();
        let mut verdicts = Vec::with_capacity(total);
        let mut settled = stream::iter(tasks.into_iter().map(|task| self.settle(task)))
            .buffer_unordered(self.concurrency);
        while let Some(verdict) = settled.next().await {
            sink.accept(&verdict);
            verdicts.push(verdict);
        }
        debug!(total, settled = verdicts.len(), "task batch drained");
        verdicts
    }

    /// Settle one task, absorbing every failure mode into the verdict.
    async fn settle(&self, task: Task) -> Verdict {
        let label = task.target.to_string();
        let rule_name = task.rule.name().to_string();

        if self.cancel.is_cancelled() {
            return Verdict::cancelled(label, rule_name);
        }
        tokio::select! {
            _ = self.gate.wait() => {}
            _ = self.cancel.cancelled() => {
                return Verdict::cancelled(label, rule_name);
            }
        }

        // Rules are third-party code; run them on their own task so a
        // panic cannot take the rest of the batch down with it.
        let evaluator = self.evaluator.clone();
        let target = Arc::clone(&task.target);
        let rule = Arc::clone(&task.rule);
        let handle = tokio::spawn(async move { evaluator.evaluate(&target, rule.as_ref()).await });

        match handle.await {
            Ok(verdict) => verdict,
            Err(e) if e.is_panic() => {
                warn!(target = %label, rule = %rule_name, "rule evaluation panicked");
                Verdict::error(label, rule_name, "rule evaluation panicked", 0)
            }
            Err(_) => Verdict::cancelled(label, rule_name),
        }
    }
}
