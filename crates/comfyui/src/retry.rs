//! Bounded retry budgets shared by the readiness probe and the
//! completion poller.

use std::time::Duration;

/// Interval between readiness probe attempts.
pub const API_AVAILABLE_INTERVAL: Duration = Duration::from_millis(50);
/// Readiness probe attempt budget.
pub const API_AVAILABLE_MAX_RETRIES: u32 = 500;
/// Interval between completion poll attempts.
pub const POLLING_INTERVAL: Duration = Duration::from_millis(250);
/// Completion poll attempt budget.
pub const POLLING_MAX_RETRIES: u32 = 500;

/// A fixed-interval attempt budget.
///
/// The interval is slept between attempts only, never after the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts. Zero means no attempt is made.
    pub max_attempts: u32,
    /// Delay between consecutive attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Default readiness probe budget (500 attempts, 50 ms apart).
    pub const fn readiness() -> Self {
        Self::new(API_AVAILABLE_MAX_RETRIES, API_AVAILABLE_INTERVAL)
    }

    /// Default completion poll budget (500 attempts, 250 ms apart).
    pub const fn polling() -> Self {
        Self::new(POLLING_MAX_RETRIES, POLLING_INTERVAL)
    }

    /// Same interval, different attempt budget.
    pub const fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self::new(max_attempts, self.interval)
    }

    /// Whether another attempt follows `attempt` (1-based).
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
