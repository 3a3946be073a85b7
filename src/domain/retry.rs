//! Bounded exponential backoff for the readiness poller.
//!
//! An unbounded poll would hang the whole run when the boot script fails
//! before writing its marker. This schedule bounds the loop and makes
//! exhaustion an explicit error (see `ReadinessError::TimedOut`).

use std::time::Duration;

/// A bounded, exponentially growing delay schedule.
#[derive(Debug, Clone, Copy)]
pub struct BackoffSchedule {
    /// Delay to wait once before the first probe, while the host is still
    /// bringing up its network stack.
    pub grace: Duration,
    /// Delay after the first failed probe.
    pub base_delay: Duration,
    /// Ceiling for the growing delay.
    pub max_delay: Duration,
    /// Total number of probes before giving up.
    pub max_attempts: u32,
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            max_attempts: 20,
        }
    }
}

impl BackoffSchedule {
    /// Delay to wait after failed attempt `attempt` (1-based): the base
    /// delay doubled per attempt, capped at `max_delay`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Worst-case total wait across the whole schedule, grace included.
    /// Used for the timeout error message.
    #[must_use]
    pub fn total_budget(&self) -> Duration {
        let mut total = self.grace;
        for attempt in 1..self.max_attempts {
            total = total.saturating_add(self.delay_after(attempt));
        }
        total
    }

    /// A schedule with zero delays, for tests that drive the poll loop
    /// without sleeping.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            grace: Duration::ZERO,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_until_cap() {
        let schedule = BackoffSchedule {
            grace: Duration::ZERO,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            max_attempts: 20,
        };
        assert_eq!(schedule.delay_after(1), Duration::from_secs(5));
        assert_eq!(schedule.delay_after(2), Duration::from_secs(10));
        assert_eq!(schedule.delay_after(3), Duration::from_secs(20));
        assert_eq!(schedule.delay_after(4), Duration::from_secs(40));
        assert_eq!(schedule.delay_after(5), Duration::from_secs(60));
        assert_eq!(schedule.delay_after(12), Duration::from_secs(60));
    }

    #[test]
    fn test_delay_does_not_overflow_on_large_attempts() {
        let schedule = BackoffSchedule::default();
        assert_eq!(schedule.delay_after(u32::MAX), schedule.max_delay);
    }

    #[test]
    fn test_total_budget_includes_grace() {
        let schedule = BackoffSchedule {
            grace: Duration::from_secs(30),
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            max_attempts: 3,
        };
        // grace + delay_after(1) + delay_after(2)
        assert_eq!(schedule.total_budget(), Duration::from_secs(45));
    }

    #[test]
    fn test_immediate_schedule_never_sleeps() {
        let schedule = BackoffSchedule::immediate(5);
        assert_eq!(schedule.grace, Duration::ZERO);
        assert_eq!(schedule.delay_after(4), Duration::ZERO);
        assert_eq!(schedule.max_attempts, 5);
    }
}
