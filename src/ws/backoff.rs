use std::time::Duration;

use backoff::backoff::Backoff;

use super::config::ReconnectConfig;

/// Doubling reconnect delay: `delay(n) = min(initial * 2^n, max)`.
///
/// `n` counts reconnects scheduled since the last successful open. The
/// [`Backoff`] impl hands out the current delay and then advances, and
/// [`Backoff::reset`] returns to the initial delay.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    initial: Duration,
    max: Duration,
    max_attempts: Option<u32>,
    attempt: u32,
}

impl BackoffPolicy {
    #[must_use]
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            initial: config.initial_backoff,
            max: config.max_backoff,
            max_attempts: config.max_attempts,
            attempt: 0,
        }
    }

    /// Delay for the given attempt number, independent of the current state.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        2_u32
            .checked_pow(attempt)
            .and_then(|factor| self.initial.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Delay the next scheduled reconnect will wait for.
    #[must_use]
    pub fn current_delay(&self) -> Duration {
        self.delay(self.attempt)
    }

    /// Reconnects scheduled since the last reset.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Backoff for BackoffPolicy {
    fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Returns `None` once `max_attempts` consecutive reconnects have been handed out.
    fn next_backoff(&mut self) -> Option<Duration> {
        if let Some(max) = self.max_attempts
            && self.attempt >= max
        {
            return None;
        }

        let delay = self.current_delay();
        self.attempt = self.attempt.saturating_add(1);
        Some(delay)
    }
}
