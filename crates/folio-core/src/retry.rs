//! Exponential backoff with jitter for upstream API calls.

use std::time::Duration;

use rand::Rng;

/// Backoff policy for retryable upstream failures.
#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    /// Attempts after the first (0 disables retries).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Ceiling on any single delay.
    pub max_delay_ms: u64,
    /// Fraction of the delay added as random jitter, in `[0, 1]`.
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    /// Delay before retry `attempt` (0-based), with exponential growth and jitter.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(16))
            .min(self.max_delay_ms);
        let jitter_cap = (exp as f64 * self.jitter_factor).round() as u64;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_cap)
        };
        Duration::from_millis((exp + jitter).min(self.max_delay_ms))
    }
}

/// Parse a `Retry-After` header value into a duration.
///
/// Only the delta-seconds form is supported; HTTP-date values return `None`.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_without_jitter() {
        let cfg = RetryConfig {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 10_000,
            jitter_factor: 0.0,
        };
        assert_eq!(cfg.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(cfg.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(cfg.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped() {
        let cfg = RetryConfig {
            max_retries: 10,
            base_delay_ms: 500,
            max_delay_ms: 2_000,
            jitter_factor: 0.0,
        };
        assert_eq!(cfg.delay_for_attempt(9), Duration::from_millis(2_000));
        // Large attempt counts must not overflow the shift.
        assert_eq!(cfg.delay_for_attempt(64), Duration::from_millis(2_000));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let cfg = RetryConfig {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            jitter_factor: 0.5,
        };
        for _ in 0..100 {
            let d = cfg.delay_for_attempt(0);
            assert!(d >= Duration::from_millis(1_000));
            assert!(d <= Duration::from_millis(1_500));
        }
    }

    #[test]
    fn retry_after_parses_seconds() {
        assert_eq!(parse_retry_after("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2026 07:28:00 GMT"), None);
    }
}
