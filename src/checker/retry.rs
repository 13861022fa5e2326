// src/checker/retry.rs
// =============================================================================
// Backoff policy for transient network failures.
//
// The policy is a plain value: `delay(attempt)` is a pure function, the
// validator does the sleeping.
// =============================================================================

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use crate::config::{DEFAULT_MAX_ATTEMPTS, RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_secs(RETRY_MAX_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries immediately. Used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Sleep before the next try, after `attempt` tries have failed.
    ///
    /// Doubles from `2 * base_delay`: with the defaults 2s, 4s, 8s, then
    /// capped at `max_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        ExponentialBackoff::from_millis(2)
            .factor(base_ms)
            .max_delay(self.max_delay)
            .nth((attempt - 1) as usize)
            .unwrap_or(self.max_delay)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delays_double_then_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(8));
        assert_eq!(policy.delay(4), Duration::from_secs(10));
        assert_eq!(policy.delay(30), Duration::from_secs(10));
    }

    #[test]
    fn test_no_delay_before_first_attempt() {
        assert_eq!(RetryPolicy::default().delay(0), Duration::ZERO);
    }

    #[test]
    fn test_immediate_policy_never_sleeps() {
        let policy = RetryPolicy::immediate(3);
        for attempt in 0..5 {
            assert_eq!(policy.delay(attempt), Duration::ZERO);
        }
    }

    #[test]
    fn test_should_retry_is_bounded() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
