//! Retry/backoff policy.
//!
//! A pure function of (attempt number, failure kind): no clock, no I/O, so
//! it is testable independently of the I/O-bound classifier. The orchestrator
//! owns the actual sleeping.

use std::time::Duration;

use crate::classifier::FailureKind;

/// Shape of the delay curve between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffCurve {
    /// Same delay before every retry.
    Fixed,
    /// base * 2^(attempt-1), capped at the ceiling. Doubling keeps retries
    /// from compounding rate-limit pressure.
    #[default]
    Exponential,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first (so 3 means the original
    /// call plus up to two retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling on any single delay.
    pub max_delay: Duration,
    pub curve: BackoffCurve,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            curve: BackoffCurve::Exponential,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            curve: BackoffCurve::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            curve: BackoffCurve::Exponential,
        }
    }

    /// Delay before the retry following failed attempt `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match self.curve {
            BackoffCurve::Fixed => self.base_delay.min(self.max_delay),
            BackoffCurve::Exponential => {
                let exp = 2u32.saturating_pow(attempt.saturating_sub(1)).min(1 << 16);
                self.base_delay
                    .saturating_mul(exp)
                    .min(self.max_delay)
            }
        }
    }

    /// Decide the fate of failed attempt `attempt` (1-indexed).
    ///
    /// Permanent failures are never retried; transient failures are retried
    /// with backoff until the attempt budget is spent.
    pub fn decide(&self, attempt: u32, kind: FailureKind) -> RetryDecision {
        match kind {
            FailureKind::Permanent => RetryDecision::GiveUp,
            FailureKind::Transient if attempt >= self.max_attempts => RetryDecision::GiveUp,
            FailureKind::Transient => RetryDecision::RetryAfter(self.delay_for_attempt(attempt)),
        }
    }
}
