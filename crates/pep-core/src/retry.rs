//! Exponential backoff schedule for transient upstream errors.
//!
//! Literature APIs and text-generation providers throttle aggressively. Each
//! infrastructure crate decides which of its errors are transient; this
//! module only owns the schedule so every caller backs off the same way.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for retry behavior on transient upstream errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based: the delay after the
    /// first failure is `delay_for(1)`).
    ///
    /// Doubles from `base_delay` and caps at `max_delay`. A server-provided
    /// hint (e.g. `Retry-After`) takes precedence when larger, still capped.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32 << exp);
        let delay = hint.map_or(backoff, |h| h.max(backoff));
        delay.min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempts_made` tries.
    #[must_use]
    pub const fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_and_caps() {
        let cfg = RetryConfig {
            max_attempts: 6,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };
        assert_eq!(cfg.delay_for(1, None), Duration::from_millis(100));
        assert_eq!(cfg.delay_for(2, None), Duration::from_millis(200));
        assert_eq!(cfg.delay_for(3, None), Duration::from_millis(400));
        assert_eq!(cfg.delay_for(4, None), Duration::from_millis(500));
        assert_eq!(cfg.delay_for(40, None), Duration::from_millis(500));
    }

    #[test]
    fn hint_wins_when_larger_but_is_capped() {
        let cfg = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        };
        assert_eq!(
            cfg.delay_for(1, Some(Duration::from_secs(1))),
            Duration::from_secs(1)
        );
        assert_eq!(
            cfg.delay_for(1, Some(Duration::from_secs(60))),
            Duration::from_secs(2)
        );
        assert_eq!(
            cfg.delay_for(2, Some(Duration::from_millis(10))),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn none_never_retries() {
        let cfg = RetryConfig::none();
        assert!(!cfg.should_retry(1));
        assert!(RetryConfig::default().should_retry(1));
        assert!(!RetryConfig::default().should_retry(4));
    }
}
