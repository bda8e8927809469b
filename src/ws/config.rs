#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use bon::Builder;
use url::Url;

use crate::Result;
use crate::error::Error;
use crate::rpc::types::request::LogFilter;

const DEFAULT_KEEP_ALIVE_INTERVAL_DURATION: Duration = Duration::from_secs(60);
const DEFAULT_PONG_TIMEOUT_DURATION: Duration = Duration::from_secs(15);
const DEFAULT_INITIAL_BACKOFF_DURATION: Duration = Duration::from_secs(1);
const DEFAULT_MAX_BACKOFF_DURATION: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT_DURATION: Duration = Duration::from_secs(10);
/// Ceiling for timer durations. Longer values are clamped so that deadlines
/// computed from `Instant::now()` cannot overflow.
pub const MAX_TIMER_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Caller-facing listener configuration.
///
/// Unset optional fields are filled in by [`Config::resolve`], which is the only
/// place defaults are applied. A keep-alive interval of zero disables keep-alive.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use evm_log_listener::rpc::types::request::LogFilter;
/// use evm_log_listener::types::{address, b256};
/// use evm_log_listener::ws::config::Config;
///
/// let filter = LogFilter::new(
///     address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
///     [b256!("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")],
/// );
/// let config = Config::builder()
///     .endpoint("wss://node.example.com")
///     .filter(filter)
///     .keep_alive_interval(Duration::from_secs(30))
///     .build();
///
/// let settings = config.resolve().unwrap();
/// assert_eq!(settings.keep_alive.unwrap().pong_timeout, Duration::from_secs(15));
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// WebSocket URL of the JSON-RPC node (`ws://` or `wss://`)
    #[builder(into)]
    pub endpoint: String,
    /// Contract address and topics to subscribe to
    pub filter: LogFilter,
    /// Interval between keep-alive probes. Defaults to 60 seconds, zero disables probing.
    pub keep_alive_interval: Option<Duration>,
    /// Maximum time to wait for a probe response. Defaults to 15 seconds.
    pub pong_timeout: Option<Duration>,
    /// Maximum time for the TCP, TLS and WebSocket handshake of one attempt.
    /// Defaults to 10 seconds.
    pub connect_timeout: Option<Duration>,
    /// Reconnection strategy configuration
    #[builder(default)]
    pub reconnect: ReconnectConfig,
}

impl Config {
    /// Validate the configuration and apply defaults, producing the immutable
    /// [`Settings`] a listener runs with.
    ///
    /// Timer durations above [`MAX_TIMER_DURATION`] are clamped to it.
    pub fn resolve(self) -> Result<Settings> {
        let endpoint = Url::parse(&self.endpoint)?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(Error::validation(format!(
                "endpoint scheme must be ws or wss, got {}",
                endpoint.scheme()
            )));
        }

        let interval = self
            .keep_alive_interval
            .unwrap_or(DEFAULT_KEEP_ALIVE_INTERVAL_DURATION)
            .min(MAX_TIMER_DURATION);
        let pong_timeout = self
            .pong_timeout
            .unwrap_or(DEFAULT_PONG_TIMEOUT_DURATION)
            .min(MAX_TIMER_DURATION);
        let keep_alive = if interval.is_zero() {
            None
        } else if pong_timeout.is_zero() {
            return Err(Error::validation(
                "pong timeout must be non-zero while keep-alive is enabled",
            ));
        } else {
            Some(KeepAlive {
                interval,
                pong_timeout,
            })
        };

        let connect_timeout = self
            .connect_timeout
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_DURATION)
            .min(MAX_TIMER_DURATION);
        if connect_timeout.is_zero() {
            return Err(Error::validation("connect timeout must be non-zero"));
        }

        self.reconnect.validate()?;

        Ok(Settings {
            endpoint,
            filter: self.filter,
            keep_alive,
            connect_timeout,
            reconnect: self.reconnect,
        })
    }
}

/// Fully resolved configuration, fixed for the lifetime of a listener.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: Url,
    pub filter: LogFilter,
    /// `None` when keep-alive probing is disabled
    pub keep_alive: Option<KeepAlive>,
    /// Limit for a single connection attempt; expiry is retried like a refused connection
    pub connect_timeout: Duration,
    pub reconnect: ReconnectConfig,
}

/// Resolved keep-alive timing.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    /// Interval between `net_listening` probes
    pub interval: Duration,
    /// Time allowed for the probe response before the transport is terminated
    pub pong_timeout: Duration,
}

/// Configuration for automatic reconnection behavior.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of reconnects scheduled in a row without a successful
    /// open before giving up. `None` means infinite retries.
    pub max_attempts: Option<u32>,
    /// Delay before the first reconnection attempt
    pub initial_backoff: Duration,
    /// Upper bound for the doubling delay
    pub max_backoff: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: None, // Infinite reconnection by default
            initial_backoff: DEFAULT_INITIAL_BACKOFF_DURATION,
            max_backoff: DEFAULT_MAX_BACKOFF_DURATION,
        }
    }
}

impl ReconnectConfig {
    fn validate(&self) -> Result<()> {
        if self.initial_backoff.is_zero() {
            return Err(Error::validation("initial backoff must be non-zero"));
        }
        if self.max_backoff < self.initial_backoff {
            return Err(Error::validation(
                "max backoff must not be smaller than the initial backoff",
            ));
        }
        Ok(())
    }
}
