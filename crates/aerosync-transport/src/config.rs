use std::time::Duration;

/// Reconnect policy for the connection supervisor.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Retries after an unexpected close before giving up. Default: 5.
    pub max_retries: u32,
    /// Delay before the first retry. Default: 1s.
    pub base_delay: Duration,
    /// Upper bound for any single retry delay. Default: 10s.
    pub max_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl ConnectionConfig {
    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let cfg = ConnectionConfig::default();
        let delays: Vec<u64> = (1..=6)
            .map(|attempt| cfg.backoff_delay(attempt).as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
    }

    #[test]
    fn backoff_survives_large_attempts() {
        let cfg = ConnectionConfig::default();
        assert_eq!(cfg.backoff_delay(u32::MAX), cfg.max_delay);
        assert_eq!(cfg.backoff_delay(0), cfg.base_delay);
    }
}
