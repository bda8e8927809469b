//! Connection lifecycle for a single log subscription.
//!
//! # Architecture
//!
//! - [`ConnectionManager`]: background task that connects, subscribes and reconnects
//! - [`BackoffPolicy`]: doubling reconnect delay with a cap
//! - [`KeepAliveMonitor`]: periodic `net_listening` probe with a response deadline
//! - [`ConnectionState`]: observable lifecycle, driven by [`Transition`]s
//! - [`Connector`]: how a transport is opened, [`TungsteniteConnector`] in production
//! - [`Decoder`] and [`EventHandler`]: what happens to each routed log

pub mod backoff;
pub mod config;
pub mod connection;
pub mod error;
pub mod keepalive;
pub mod state;
pub mod traits;
pub mod transport;

pub use backoff::BackoffPolicy;
pub use config::{Config, KeepAlive, MAX_TIMER_DURATION, ReconnectConfig, Settings};
pub use connection::ConnectionManager;
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use keepalive::{HealthCheck, KeepAliveEvent, KeepAliveMonitor};
pub use state::{ConnectionState, InvalidTransition, Transition};
pub use traits::*;
pub use transport::{BoxTransport, Connector, Transport, TungsteniteConnector};
