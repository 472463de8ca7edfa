// ABOUTME: Retry policy with bounded exponential backoff.
// ABOUTME: Environmental failures retry at 5s, 10s, 20s; logic failures never retry.

use serde::Deserialize;
use std::time::Duration;

use super::FailureType;

/// Whether to retry a failed attempt, and how long to wait first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub should_retry: bool,
    pub delay: Duration,
}

impl RetryDecision {
    pub const STOP: RetryDecision = RetryDecision {
        should_retry: false,
        delay: Duration::ZERO,
    };

    pub fn retry_after(delay: Duration) -> Self {
        Self {
            should_retry: true,
            delay,
        }
    }

    pub fn delay_seconds(&self) -> u64 {
        self.delay.as_secs()
    }
}

/// Per-deployment retry policy.
///
/// `attempt` is the 0-based index of the failed attempt. The delay before
/// retry `n` is `base_delay * 2^n`, and at most `max_retries` retries are made.
/// Unknown failures are not retried unless `retry_unknown` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_base_delay", with = "humantime_serde")]
    pub base_delay: Duration,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default)]
    pub retry_unknown: bool,
}

fn default_base_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_max_retries() -> u32 {
    3
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            base_delay: default_base_delay(),
            max_retries: default_max_retries(),
            retry_unknown: false,
        }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, failure_type: FailureType) -> bool {
        match failure_type {
            FailureType::Logic => false,
            FailureType::Environmental => true,
            FailureType::Unknown => self.retry_unknown,
        }
    }

    pub fn retry_strategy(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if !self.should_retry(failure_type) || attempt >= self.max_retries {
            return RetryDecision::STOP;
        }

        let delay = 2u32
            .checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX);
        RetryDecision::retry_after(delay)
    }
}
