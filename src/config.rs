//! Coordinator configuration.

use std::time::Duration;

/// Timing and fan-out settings of a [`BatchJob`](crate::coordinator::BatchJob).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Upper bound on one refresh round. Polls still outstanding at the
    /// deadline are dropped and their units keep their state.
    pub poll_timeout: Duration,
    /// Pause between refresh rounds in `wait_for_completion`.
    pub poll_interval: Duration,
    /// Default deadline used by `BatchJob::result`.
    pub wait_timeout: Duration,
    /// Maximum polls in flight. `None` polls every outstanding unit at once.
    pub max_concurrent_polls: Option<usize>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            wait_timeout: Duration::from_secs(5 * 60),
            max_concurrent_polls: None,
        }
    }
}

impl CoordinatorConfig {
    /// Set the refresh round timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the interval between refresh rounds.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the default wait deadline.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Limit the number of polls in flight (at least one).
    pub fn with_max_concurrent_polls(mut self, limit: usize) -> Self {
        self.max_concurrent_polls = Some(limit.max(1));
        self
    }

    /// Create config from environment variables.
    ///
    /// Environment variables:
    /// - `HAL_BATCH_POLL_TIMEOUT_MS`: refresh round timeout (default: 10000)
    /// - `HAL_BATCH_POLL_INTERVAL_MS`: pause between rounds (default: 500)
    /// - `HAL_BATCH_WAIT_TIMEOUT_MS`: default wait deadline (default: 300000)
    /// - `HAL_BATCH_MAX_CONCURRENT_POLLS`: fan-out limit (default: unbounded)
    ///
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        let defaults = Self::default();
        Self {
            poll_timeout: millis("HAL_BATCH_POLL_TIMEOUT_MS").unwrap_or(defaults.poll_timeout),
            poll_interval: millis("HAL_BATCH_POLL_INTERVAL_MS").unwrap_or(defaults.poll_interval),
            wait_timeout: millis("HAL_BATCH_WAIT_TIMEOUT_MS").unwrap_or(defaults.wait_timeout),
            max_concurrent_polls: lookup("HAL_BATCH_MAX_CONCURRENT_POLLS")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|&n| n > 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.poll_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert!(config.max_concurrent_polls.is_none());
    }

    #[test]
    fn test_builders() {
        let config = CoordinatorConfig::default()
            .with_poll_timeout(Duration::from_secs(1))
            .with_poll_interval(Duration::from_millis(10))
            .with_wait_timeout(Duration::from_secs(2))
            .with_max_concurrent_polls(0);
        assert_eq!(config.poll_timeout, Duration::from_secs(1));
        assert_eq!(config.wait_timeout, Duration::from_secs(2));
        assert_eq!(config.max_concurrent_polls, Some(1));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("HAL_BATCH_POLL_TIMEOUT_MS", "2500"),
            ("HAL_BATCH_POLL_INTERVAL_MS", "not-a-number"),
            ("HAL_BATCH_MAX_CONCURRENT_POLLS", "4"),
        ]
        .into_iter()
        .collect();
        let config = CoordinatorConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.poll_timeout, Duration::from_millis(2500));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.wait_timeout, Duration::from_secs(300));
        assert_eq!(config.max_concurrent_polls, Some(4));
    }

    #[test]
    fn test_poll_interval_from_lookup() {
        let config = CoordinatorConfig::from_lookup(|k| {
            (k == "HAL_BATCH_POLL_INTERVAL_MS").then(|| " 50 ".to_string())
        });
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.poll_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_fan_out_ignored() {
        let config = CoordinatorConfig::from_lookup(|k| {
            (k == "HAL_BATCH_MAX_CONCURRENT_POLLS").then(|| "0".to_string())
        });
        assert!(config.max_concurrent_polls.is_none());
    }
}
