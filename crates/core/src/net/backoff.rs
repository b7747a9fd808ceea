use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Exponential reconnect schedule: attempt `n` waits `unit * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub unit: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            unit: DEFAULT_BACKOFF_UNIT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// `None` once the attempts are used up.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.checked_pow(attempt)?;
        self.unit.checked_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_each_attempt() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<_> = (0..5).map(|n| policy.delay(n).unwrap().as_secs()).collect();
        assert_eq!(delays, [1, 2, 4, 8, 16]);
    }

    #[test]
    fn gives_up_at_max_attempts() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay(5), None);
        assert_eq!(policy.delay(40), None);
    }

    #[test]
    fn unit_scales_schedule() {
        let policy = ReconnectPolicy {
            unit: Duration::from_millis(10),
            max_attempts: 3,
        };
        assert_eq!(policy.delay(2), Some(Duration::from_millis(40)));
        assert_eq!(policy.delay(3), None);
    }

    #[test]
    fn huge_budgets_do_not_overflow() {
        let policy = ReconnectPolicy {
            unit: Duration::from_secs(1),
            max_attempts: 64,
        };
        assert_eq!(policy.delay(40), None);
    }
}
