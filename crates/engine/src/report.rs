//! Run statistics, cost estimation, and the final run report.

use std::time::Duration;

use serde::Serialize;

use reclass_classifier::TokenUsage;
use reclass_core::RunId;

/// Per-token pricing used to estimate the spend of a run, in dollars per
/// million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostModel {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            input_per_million: 15.0,
            output_per_million: 60.0,
        }
    }
}

impl CostModel {
    pub fn estimate(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        input_tokens as f64 / 1_000_000.0 * self.input_per_million
            + output_tokens as f64 / 1_000_000.0 * self.output_per_million
    }
}

/// Counters accumulated over one run. Reported even when the run stops
/// early or aborts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Products pulled from the pending set and processed to a terminal
    /// outcome (or dropped on a storage failure).
    pub processed: u64,
    pub completed: u64,
    pub errored: u64,
    /// Terminal outcomes that could not be persisted (non-fatal storage
    /// failures); these products stay pending for a later run.
    pub storage_failures: u64,
    pub batches: u64,
    /// Individual retry attempts across all products.
    pub retries: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    confidence_sum: f64,
}

impl RunStats {
    pub(crate) fn record_completed(&mut self, confidence: f64) {
        self.processed += 1;
        self.completed += 1;
        self.confidence_sum += confidence;
    }

    pub(crate) fn record_errored(&mut self) {
        self.processed += 1;
        self.errored += 1;
    }

    pub(crate) fn record_storage_failure(&mut self) {
        self.processed += 1;
        self.storage_failures += 1;
    }

    pub(crate) fn record_usage(&mut self, usage: TokenUsage) {
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
    }

    /// Mean confidence over completed products, `None` when nothing
    /// completed.
    pub fn avg_confidence(&self) -> Option<f64> {
        (self.completed > 0).then(|| self.confidence_sum / self.completed as f64)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The pending set was drained.
    Completed,
    /// A stop was requested; the in-flight product was finished and
    /// persisted first.
    Stopped,
    /// A fatal condition (store unreachable) ended the run early.
    Aborted { reason: String },
}

impl RunOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, RunOutcome::Aborted { .. })
    }
}

/// Final report of one orchestrator run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    pub stats: RunStats,
    pub elapsed: Duration,
    /// Estimated capability spend in dollars, from the accumulated token
    /// counts.
    pub estimated_cost: f64,
}
