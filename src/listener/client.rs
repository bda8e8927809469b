use std::sync::Arc;

use futures::Stream;
use futures::stream;
use tokio::sync::{mpsc, watch};

use crate::Result;
use crate::rpc::types::response::SubscriptionId;
use crate::ws::config::{Config, Settings};
use crate::ws::connection::ConnectionManager;
use crate::ws::state::ConnectionState;
use crate::ws::transport::{Connector, TungsteniteConnector};
use crate::ws::{Decoder, EventHandler};

/// Durable `eth_subscribe("logs")` listener.
///
/// Starting a listener dials the endpoint right away and keeps the subscription
/// alive until [`Listener::stop`] is called. Clones share the same connection;
/// dropping the last one stops it.
///
/// # Example
///
/// ```rust, no_run
/// use std::time::Duration;
///
/// use evm_log_listener::listener::{Listener, RawLogDecoder};
/// use evm_log_listener::rpc::{LogFilter, RawLog};
/// use evm_log_listener::types::{address, b256};
/// use evm_log_listener::ws::Config;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let filter = LogFilter::new(
///         address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
///         [b256!("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")],
///     );
///     let config = Config::builder()
///         .endpoint("wss://polygon-rpc.example/ws")
///         .filter(filter)
///         .build();
///
///     let listener = Listener::start(config, RawLogDecoder, |log: evm_log_listener::Result<RawLog>| {
///         match log {
///             Ok(log) => println!("log in block {:?}", log.block()),
///             Err(e) => eprintln!("{e}"),
///         }
///     })?;
///
///     tokio::time::sleep(Duration::from_secs(3600)).await;
///     listener.stop();
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Listener {
    inner: Arc<ListenerInner>,
}

#[derive(Debug)]
struct ListenerInner {
    /// Resolved configuration the connection runs with
    settings: Settings,
    /// Connection manager for the WebSocket
    connection: ConnectionManager,
}

impl Listener {
    /// Resolve `config` and start listening over TCP/TLS.
    ///
    /// Must be called within a Tokio runtime. Fails only if the configuration
    /// is invalid; connection problems are retried in the background.
    ///
    /// # Subscription rejection
    ///
    /// If the node answers `eth_subscribe` with an error, the handler receives
    /// [`WsError::SubscriptionFailed`](crate::ws::WsError::SubscriptionFailed).
    /// The connection stays open in [`ConnectionState::Subscribing`] and no logs
    /// are delivered, while keep-alive probes keep succeeding. The listener does
    /// not retry on its own: call [`Listener::stop`] and fix the filter.
    pub fn start<D, H>(config: Config, decoder: D, handler: H) -> Result<Self>
    where
        D: Decoder,
        H: EventHandler<D::Event>,
    {
        Self::start_with_connector(config, TungsteniteConnector, decoder, handler)
    }

    /// Like [`Listener::start`], opening transports with `connector`.
    pub fn start_with_connector<C, D, H>(
        config: Config,
        connector: C,
        decoder: D,
        handler: H,
    ) -> Result<Self>
    where
        C: Connector,
        D: Decoder,
        H: EventHandler<D::Event>,
    {
        let settings = config.resolve()?;
        let connection = ConnectionManager::start(settings.clone(), connector, decoder, handler);

        Ok(Self {
            inner: Arc::new(ListenerInner {
                settings,
                connection,
            }),
        })
    }

    /// Start listening and receive events as a stream instead of through a callback.
    ///
    /// The stream ends once the listener stops. Events are buffered without
    /// bound, so the stream should be polled promptly.
    pub fn stream<D: Decoder>(
        config: Config,
        decoder: D,
    ) -> Result<(Self, impl Stream<Item = Result<D::Event>>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Self::start(config, decoder, move |event: Result<D::Event>| {
            // The receiver may be gone; the listener keeps running until stopped
            _ = tx.send(event);
        })?;

        let events = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok((listener, events))
    }

    /// Stop the listener for good. Idempotent.
    pub fn stop(&self) {
        self.inner.connection.stop();
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.state_receiver()
    }

    /// The id the node assigned to the current subscription, while streaming.
    #[must_use]
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.inner.connection.subscription()
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.connection.is_stopped()
    }

    /// Wait until the listener has stopped, either through [`Listener::stop`]
    /// or because the endpoint rejected it for good.
    pub async fn stopped(&self) {
        self.inner.connection.stopped().await;
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }
}
