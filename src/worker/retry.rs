use std::time::Duration;

use rand::Rng;

use crate::config::WorkerConfig;

/// Exponential backoff between task retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    base: Duration,
    multiplier: f64,
    max: Duration,
}

impl RetryPolicy {
    pub fn new(base: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            base,
            multiplier,
            max,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.retry_backoff_base_ms),
            config.retry_backoff_multiplier,
            Duration::from_millis(config.retry_backoff_max_ms),
        )
    }

    /// `base * multiplier^attempt`, capped at the maximum.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base.as_secs_f64() * self.multiplier.powi(exponent);
        if !delay.is_finite() || delay >= self.max.as_secs_f64() {
            return self.max;
        }
        Duration::from_secs_f64(delay.max(0.0))
    }

    /// [`backoff`](Self::backoff) with equal jitter: half fixed, half random.
    pub fn backoff_with_jitter(&self, attempt: u32) -> Duration {
        let delay = self.backoff(attempt);
        let half = delay / 2;
        let half_ms = u64::try_from(half.as_millis()).unwrap_or(u64::MAX);
        if half_ms == 0 {
            return delay;
        }
        half + Duration::from_millis(rand::rng().random_range(0..=half_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(1), 2.0, Duration::from_secs(60))
    }

    #[test]
    fn test_exponential_growth_and_cap() {
        let policy = policy();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(6), Duration::from_secs(60));
        assert_eq!(policy.backoff(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_from_config() {
        let config = WorkerConfig::default();
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(
            policy.backoff(0),
            Duration::from_millis(config.retry_backoff_base_ms)
        );
    }

    proptest! {
        #[test]
        fn test_jitter_stays_within_bounds(attempt in 0u32..20) {
            let policy = policy();
            let full = policy.backoff(attempt);
            let jittered = policy.backoff_with_jitter(attempt);

            prop_assert!(jittered <= full);
            prop_assert!(jittered >= full / 2);
        }
    }
}
