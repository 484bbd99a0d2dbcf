//! Exponential backoff retry policy for consumers

use std::time::Duration;

/// Bounded exponential backoff applied to every consumer.
///
/// Defaults: 1s initial, multiplier 2.0, capped at 8s, 4 attempts total
/// (delays 1s, 2s, 4s between attempts). On exhaustion the message is
/// dead-lettered unmodified.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial_interval: Duration,

    /// Backoff multiplier
    pub multiplier: f64,

    /// Upper bound on any single delay
    pub max_interval: Duration,

    /// Total handler attempts (first delivery included)
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            multiplier: 2.0,
            max_interval: Duration::from_secs(8),
            max_attempts: 4,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based),
    /// or `None` once attempts are exhausted.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay = self.initial_interval.mul_f64(factor);
        Some(delay.min(self.max_interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_after(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_after(4), None);
    }

    #[test]
    fn test_interval_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            ..Default::default()
        };
        assert_eq!(policy.delay_after(5), Some(Duration::from_secs(8)));
        assert_eq!(policy.delay_after(9), Some(Duration::from_secs(8)));
    }
}
