//! Retry policy for transient failures.
//!
//! The policy is a pure function of the attempt number and the error, so
//! the executor loop stays small and the decisions are testable without
//! waiting on real timers.

use std::time::Duration;

use async_trait::async_trait;

use super::error::ApiError;
use crate::config::HttpSettings;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make attempt `next_attempt`.
    Retry { next_attempt: u32, delay: Duration },
    /// Surface the error.
    GiveUp,
}

/// Exponential backoff with a fixed attempt ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub base_delay: Duration,
    /// Upper bound for computed delays. Server hints are not capped.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&HttpSettings::default())
    }
}

impl RetryPolicy {
    /// Build the policy from HTTP settings.
    pub fn from_settings(settings: &HttpSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }

    /// Delay after failed attempt `attempt` (1-based).
    ///
    /// A server hint wins; otherwise `base * 2^(attempt - 1)`, capped.
    pub fn backoff_delay(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Decide whether failed attempt `attempt` should be retried.
    ///
    /// Non-idempotent requests are only resent when the service cannot
    /// have acted on them.
    pub fn decide(&self, attempt: u32, error: &ApiError, idempotent: bool) -> RetryDecision {
        if attempt >= self.max_attempts || !error.is_transient() {
            return RetryDecision::GiveUp;
        }
        if !idempotent && !error.is_safe_to_resend() {
            return RetryDecision::GiveUp;
        }

        RetryDecision::Retry {
            next_attempt: attempt + 1,
            delay: self.backoff_delay(attempt, error.retry_after()),
        }
    }
}

/// Something that can wait.
#[async_trait]
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
