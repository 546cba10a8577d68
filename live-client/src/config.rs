//! Engine configuration.

use live_core::RetryPolicy;
use std::time::Duration;

/// Timing knobs for [`LiveEngine`](crate::LiveEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Period of the full-state pull.
    pub pull_interval: Duration,
    /// Push reconnect policy.
    pub retry: RetryPolicy,
    /// How long a countdown pulse dims the display.
    pub pulse_duration: Duration,
    /// Bound on opening the push connection.
    pub connect_timeout: Duration,
    /// Bound on each pull request.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pull_interval: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            pulse_duration: Duration::from_millis(200),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(4),
        }
    }
}

impl EngineConfig {
    /// Set the pull period.
    pub fn with_pull_interval(mut self, interval: Duration) -> Self {
        self.pull_interval = interval;
        self
    }

    /// Set the reconnect policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the pulse duration.
    pub fn with_pulse_duration(mut self, duration: Duration) -> Self {
        self.pulse_duration = duration;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_firmware_page() {
        let config = EngineConfig::default();
        assert_eq!(config.pull_interval, Duration::from_secs(5));
        assert_eq!(config.pulse_duration, Duration::from_millis(200));
        assert_eq!(config.retry, RetryPolicy::fixed(Duration::from_secs(5)));
    }

    #[test]
    fn builders_override() {
        let config = EngineConfig::default()
            .with_pull_interval(Duration::from_secs(1))
            .with_retry(RetryPolicy::default().with_max_attempts(3));
        assert_eq!(config.pull_interval, Duration::from_secs(1));
        assert_eq!(config.retry.max_attempts, Some(3));
    }
}
