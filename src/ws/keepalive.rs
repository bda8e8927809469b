use std::future;

use tokio::time::{Duration, Instant, Interval, MissedTickBehavior, interval_at, sleep_until};

use super::config::KeepAlive;

/// Outstanding keep-alive probe, if any.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheck {
    deadline: Option<Instant>,
}

impl HealthCheck {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the transport is terminated if the probe is still unanswered.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// What the monitor wants the session to do next.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveEvent {
    /// Send a probe and call [`KeepAliveMonitor::ping_sent`]
    Ping,
    /// The outstanding probe went unanswered; terminate the transport
    Expired,
}

/// Periodic liveness probe for one open transport.
///
/// Both timers (the probe interval and the response deadline) live in this
/// struct. They are cancelled by [`KeepAliveMonitor::disarm`], which the
/// connection driver calls whenever a session ends, or by dropping the monitor.
#[derive(Debug)]
pub struct KeepAliveMonitor {
    ticker: Option<Interval>,
    pong_timeout: Duration,
    health: HealthCheck,
}

impl KeepAliveMonitor {
    /// Arm the monitor. The first probe is due one full interval from now.
    #[must_use]
    pub fn new(keep_alive: Option<KeepAlive>) -> Self {
        let Some(keep_alive) = keep_alive else {
            return Self::disabled();
        };

        let mut ticker = interval_at(Instant::now() + keep_alive.interval, keep_alive.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            ticker: Some(ticker),
            pong_timeout: keep_alive.pong_timeout,
            health: HealthCheck::default(),
        }
    }

    /// A monitor that never asks for a probe.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            ticker: None,
            pong_timeout: Duration::ZERO,
            health: HealthCheck::default(),
        }
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.ticker.is_some()
    }

    #[must_use]
    pub const fn health(&self) -> HealthCheck {
        self.health
    }

    /// Wait for the next thing the session has to act on.
    ///
    /// While a probe is outstanding only its deadline is watched, so at most one
    /// probe is in flight. Pends forever when disarmed. Cancel safe.
    pub async fn next_event(&mut self) -> KeepAliveEvent {
        let Some(ticker) = self.ticker.as_mut() else {
            return future::pending().await;
        };

        match self.health.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                KeepAliveEvent::Expired
            }
            None => {
                ticker.tick().await;
                KeepAliveEvent::Ping
            }
        }
    }

    /// Record that a probe went out and start its response deadline.
    pub fn ping_sent(&mut self) -> Instant {
        let deadline = Instant::now() + self.pong_timeout;
        self.health.deadline = Some(deadline);
        deadline
    }

    /// Clear the outstanding probe. Returns whether one was outstanding.
    pub fn pong_received(&mut self) -> bool {
        self.health.deadline.take().is_some()
    }

    /// Cancel the interval and any pending deadline.
    pub fn disarm(&mut self) {
        self.ticker = None;
        self.health = HealthCheck::default();
    }
}
