//! Retry policy for the push connection.
//!
//! The device is a local embedded controller that comes back quickly, so
//! the default is a fixed interval with no attempt limit. Stricter policies
//! plug in here without touching the state machine.

use std::time::Duration;

/// How the delay between reconnect attempts evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every attempt.
    Fixed(Duration),
    /// `base * 2^(attempt-1)`, capped at `max`.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
        /// Upper bound on any delay.
        max: Duration,
    },
}

/// Reconnect policy injected into the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay schedule.
    pub backoff: Backoff,
    /// Give up after this many retries (`None` = retry forever).
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Default fixed retry interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Fixed interval, unbounded attempts.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            backoff: Backoff::Fixed(interval),
            max_attempts: None,
        }
    }

    /// Exponential backoff, unbounded attempts.
    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self {
            backoff: Backoff::Exponential { base, max },
            max_attempts: None,
        }
    }

    /// Limit the number of retries.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before retry number `attempt` (1-based), or `None` once the
    /// policy gives up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if let Some(max_attempts) = self.max_attempts {
            if attempt > max_attempts {
                return None;
            }
        }

        let delay = match self.backoff {
            Backoff::Fixed(interval) => interval,
            Backoff::Exponential { base, max } => {
                let exponent = attempt.saturating_sub(1).min(16);
                base.saturating_mul(2u32.saturating_pow(exponent)).min(max)
            }
        };
        Some(delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_INTERVAL)
    }
}
