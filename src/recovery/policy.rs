//! Retry policy for failed exchanges.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Decides whether a failed exchange is retried and how long to back off.
///
/// The default retries forever, which suits an attended lab run. Unattended
/// runs should bound it with `MaxAttempts` or `Backoff { max_attempts }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Retry until an exchange validates.
    #[default]
    Unbounded,
    /// Give up once `max_attempts` exchanges have failed.
    MaxAttempts { max_attempts: u32 },
    /// Add an exponentially growing delay before each retry.
    Backoff {
        initial_ms: u64,
        max_ms: u64,
        factor: u32,
        #[serde(default)]
        max_attempts: Option<u32>,
    },
}

impl RetryPolicy {
    /// Extra delay before retrying after `failures` failed attempts, or
    /// `None` to give up.
    pub fn next_retry(&self, failures: u32) -> Option<Duration> {
        match *self {
            RetryPolicy::Unbounded => Some(Duration::ZERO),
            RetryPolicy::MaxAttempts { max_attempts } => {
                (failures < max_attempts).then_some(Duration::ZERO)
            }
            RetryPolicy::Backoff {
                initial_ms,
                max_ms,
                factor,
                max_attempts,
            } => {
                if max_attempts.is_some_and(|max| failures >= max) {
                    return None;
                }
                let exponent = failures.saturating_sub(1);
                let delay = initial_ms.saturating_mul(u64::from(factor).saturating_pow(exponent));
                Some(Duration::from_millis(delay.min(max_ms)))
            }
        }
    }

    /// Check if the policy can give up.
    pub fn is_bounded(&self) -> bool {
        match self {
            RetryPolicy::Unbounded => false,
            RetryPolicy::MaxAttempts { .. } => true,
            RetryPolicy::Backoff { max_attempts, .. } => max_attempts.is_some(),
        }
    }
}
