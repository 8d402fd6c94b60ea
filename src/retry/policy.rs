//! Retry policy: cooldown schedule and recovery threshold.
//!
//! Unlike a multiplicative backoff, the schedule is an explicit ordered
//! sequence of cooldowns that saturates at its last entry — sustained rapid
//! failure settles on the longest cooldown instead of growing without
//! bound. A run that lasts at least [`RetryPolicy::reset_after`] counts as
//! recovered, so the next failure starts the schedule from the beginning.

use std::time::Duration;

/// Cooldown schedule for restarting a failing task.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use camvisor::RetryPolicy;
///
/// let policy = RetryPolicy {
///     reset_after: Duration::from_secs(2),
///     cooldowns: vec![
///         Duration::from_secs(2),
///         Duration::from_secs(30),
///         Duration::from_secs(120),
///     ],
/// };
///
/// // First failure waits the first cooldown...
/// assert_eq!(policy.delay_after(1), Duration::from_secs(2));
/// assert_eq!(policy.delay_after(2), Duration::from_secs(30));
/// assert_eq!(policy.delay_after(3), Duration::from_secs(120));
/// // ...and the schedule saturates at its last entry.
/// assert_eq!(policy.delay_after(7), Duration::from_secs(120));
/// ```
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Minimum run duration after which the attempt ordinal resets to 1.
    pub reset_after: Duration,
    /// Ordered cooldown schedule, saturating at the last entry.
    pub cooldowns: Vec<Duration>,
}

impl Default for RetryPolicy {
    /// Returns the schedule used for stream processors: `2s, 30s, 2m, 15m`
    /// with a 2s recovery threshold.
    fn default() -> Self {
        Self {
            reset_after: Duration::from_secs(2),
            cooldowns: vec![
                Duration::from_secs(2),
                Duration::from_secs(30),
                Duration::from_secs(120),
                Duration::from_secs(900),
            ],
        }
    }
}

impl RetryPolicy {
    /// Returns the cooldown to wait after a failure of the given attempt.
    ///
    /// `attempt` is the ordinal of the run that just failed (1-based; 0 is
    /// treated as a recovered run and maps to the first cooldown). An empty
    /// schedule yields no delay.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.cooldowns.len() {
            0 => Duration::ZERO,
            len => {
                let idx = (attempt.saturating_sub(1) as usize).min(len - 1);
                self.cooldowns[idx]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            reset_after: Duration::from_secs(2),
            cooldowns: vec![
                Duration::from_secs(2),
                Duration::from_secs(30),
                Duration::from_secs(120),
            ],
        }
    }

    #[test]
    fn schedule_escalates_then_saturates() {
        let p = policy();
        assert_eq!(p.delay_after(1), Duration::from_secs(2));
        assert_eq!(p.delay_after(2), Duration::from_secs(30));
        assert_eq!(p.delay_after(3), Duration::from_secs(120));
        assert_eq!(p.delay_after(4), Duration::from_secs(120));
        assert_eq!(p.delay_after(100), Duration::from_secs(120));
    }

    #[test]
    fn recovered_run_maps_to_first_cooldown() {
        assert_eq!(policy().delay_after(0), Duration::from_secs(2));
    }

    #[test]
    fn empty_schedule_yields_zero() {
        let p = RetryPolicy {
            reset_after: Duration::from_secs(2),
            cooldowns: Vec::new(),
        };
        assert_eq!(p.delay_after(5), Duration::ZERO);
    }
}
