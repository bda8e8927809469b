#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::sync::Arc;

use backoff::backoff::Backoff as _;
use futures::{SinkExt as _, StreamExt as _};
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::backoff::BackoffPolicy;
use super::config::Settings;
use super::error::WsError;
use super::keepalive::{KeepAliveEvent, KeepAliveMonitor};
use super::state::{ConnectionState, Transition};
use super::traits::{Decoder, EventHandler};
use super::transport::{BoxTransport, Connector};
use crate::error::Error;
use crate::rpc::protocol::{Ignored, Inbound, SubscriptionProtocol};
use crate::rpc::types::response::SubscriptionId;

/// Owns the background task that keeps one log subscription alive.
///
/// The task connects, subscribes, routes notifications to the handler and
/// reconnects with exponential backoff whenever the transport goes away. It
/// runs until [`ConnectionManager::stop`] is called, a fatal error occurs, the
/// reconnect budget is exhausted, or the last clone of the manager is dropped.
///
/// # Example
///
/// ```no_run
/// use evm_log_listener::Result;
/// use evm_log_listener::rpc::{LogFilter, RawLog};
/// use evm_log_listener::types::Address;
/// use evm_log_listener::ws::{Config, ConnectionManager, TungsteniteConnector};
/// use evm_log_listener::listener::RawLogDecoder;
///
/// # async fn run() -> Result<()> {
/// let settings = Config::builder()
///     .endpoint("wss://node.example/ws")
///     .filter(LogFilter::new(Address::ZERO, []))
///     .build()
///     .resolve()?;
///
/// let connection = ConnectionManager::start(
///     settings,
///     TungsteniteConnector,
///     RawLogDecoder,
///     |log: Result<RawLog>| println!("{log:?}"),
/// );
///
/// connection.stop();
/// connection.stopped().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    /// Shared with the driver task; every state change goes through it
    state_tx: watch::Sender<ConnectionState>,
    /// Kept for cheap reads of the current state
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    /// Cancels the driver once the last clone is dropped
    _guard: Arc<DropGuard>,
}

impl ConnectionManager {
    /// Spawn the connection task. Must be called within a Tokio runtime.
    ///
    /// Nothing is dialed before this call, and the first attempt starts
    /// immediately.
    pub fn start<C, D, H>(settings: Settings, connector: C, decoder: D, handler: H) -> Self
    where
        C: Connector,
        D: Decoder,
        H: EventHandler<D::Event>,
    {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let cancel = CancellationToken::new();

        let driver = Driver {
            backoff: BackoffPolicy::new(&settings.reconnect),
            protocol: SubscriptionProtocol::new(settings.filter.clone()),
            keep_alive: KeepAliveMonitor::disabled(),
            settings,
            connector,
            decoder,
            handler,
            state_tx: state_tx.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(driver.run());

        Self {
            state_tx,
            state_rx,
            _guard: Arc::new(cancel.clone().drop_guard()),
            cancel,
        }
    }

    /// Stop for good: cancel any pending reconnect, close the transport and
    /// cancel keep-alive timers. Idempotent.
    ///
    /// The state is [`ConnectionState::Stopped`] when this returns; the
    /// driver task winds down shortly after.
    pub fn stop(&self) {
        self.cancel.cancel();
        advance(&self.state_tx, Transition::Stop);
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// The confirmed subscription, while streaming.
    #[must_use]
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.state_rx.borrow().subscription().cloned()
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state_rx.borrow().is_terminal()
    }

    /// Subscribe to connection state changes.
    ///
    /// Every transition is published, which makes this the place to watch for
    /// reconnects or a fatal stop.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Wait until the listener has stopped, for whatever reason.
    pub async fn stopped(&self) {
        let mut state_rx = self.state_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting
        _ = state_rx.wait_for(ConnectionState::is_terminal).await;
    }
}

/// Apply `transition` to the shared state. Returns whether it was defined.
fn advance(state_tx: &watch::Sender<ConnectionState>, transition: Transition) -> bool {
    let mut applied = false;

    state_tx.send_if_modified(|state| match state.apply(transition) {
        Ok(next) => {
            #[cfg(feature = "tracing")]
            tracing::trace!(from = %state, to = %next, "Connection state changed");
            *state = next;
            applied = true;
            true
        }
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::trace!(error = %e, "Ignoring transition");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
            false
        }
    });

    applied
}

/// How a connection attempt or session ended.
#[derive(Debug)]
enum Exit {
    /// Stop requested
    Stopped,
    /// Transport lost; try again after a backoff delay
    Retry(WsError),
    /// Retrying cannot help
    Fatal(Error),
}

impl From<WsError> for Exit {
    fn from(e: WsError) -> Self {
        if e.is_fatal() {
            Self::Fatal(e.into())
        } else {
            Self::Retry(e)
        }
    }
}

/// State owned by the background task.
///
/// `protocol` and `keep_alive` make up the session state. They are armed when
/// a transport opens and cleared on every way out of the session.
struct Driver<C, D, H> {
    settings: Settings,
    connector: C,
    decoder: D,
    handler: H,
    backoff: BackoffPolicy,
    protocol: SubscriptionProtocol,
    keep_alive: KeepAliveMonitor,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl<C, D, H> Driver<C, D, H>
where
    C: Connector,
    D: Decoder,
    H: EventHandler<D::Event>,
{
    /// Main connection loop with automatic reconnection.
    async fn run(mut self) {
        loop {
            if !self.transition(Transition::Connect) {
                break;
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(endpoint = %self.settings.endpoint, "Connecting");

            let connected = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                result = timeout(
                    self.settings.connect_timeout,
                    self.connector.connect(&self.settings.endpoint),
                ) => match result {
                    Ok(connected) => connected.map_err(Exit::from),
                    Err(_elapsed) => Err(Exit::Retry(WsError::ConnectTimeout)),
                },
            };

            let exit = match connected {
                Ok(transport) => {
                    if !self.transition(Transition::Opened) {
                        break;
                    }
                    #[cfg(feature = "tracing")]
                    tracing::info!(endpoint = %self.settings.endpoint, "Connection opened");
                    self.backoff.reset();
                    self.run_session(transport).await
                }
                Err(exit) => exit,
            };

            match exit {
                Exit::Stopped => break,
                Exit::Fatal(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(error = %e, endpoint = %self.settings.endpoint, "Giving up on endpoint");
                    #[cfg(not(feature = "tracing"))]
                    let _ = &e;
                    break;
                }
                Exit::Retry(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %e, "Connection lost");
                    #[cfg(not(feature = "tracing"))]
                    let _ = &e;
                }
            }

            if !self.transition(Transition::Closed) {
                break;
            }

            let Some(delay) = self.backoff.next_backoff() else {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    attempts = self.backoff.attempt(),
                    "Reconnect attempts exhausted"
                );
                break;
            };

            #[cfg(feature = "tracing")]
            tracing::info!(?delay, attempt = self.backoff.attempt(), "Reconnecting");

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                () = sleep(delay) => {}
            }
        }

        self.transition(Transition::Stop);
    }

    /// Run one session on a fresh transport, then clear the session state.
    async fn run_session(&mut self, transport: BoxTransport) -> Exit {
        self.protocol.reset();
        self.keep_alive = KeepAliveMonitor::new(self.settings.keep_alive);

        let exit = self.stream(transport).await;

        // No keep-alive deadline or subscription id outlives its transport
        self.keep_alive.disarm();
        self.protocol.reset();

        exit
    }

    /// Subscribe and route frames until the transport goes away.
    async fn stream(&mut self, transport: BoxTransport) -> Exit {
        let (mut write, mut read) = transport.split();

        let request = match self.protocol.subscribe_request() {
            Ok(request) => request,
            Err(e) => return Exit::Fatal(e),
        };
        if let Err(e) = write.send(Message::Text(request.into())).await {
            return Exit::Retry(WsError::Connection(e));
        }
        if !self.transition(Transition::SubscribeSent) {
            return Exit::Stopped;
        }

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => return Exit::Stopped,

                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(%text, "Received WebSocket text message");
                        self.dispatch(text.as_str());
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Exit::Retry(WsError::ConnectionClosed);
                    }
                    Some(Ok(_)) => {
                        // Binary and control frames carry nothing for us.
                        // Pings are answered by tungstenite itself.
                    }
                    Some(Err(e)) => return Exit::Retry(WsError::Connection(e)),
                },

                event = self.keep_alive.next_event() => match event {
                    KeepAliveEvent::Ping => {
                        let probe = match self.protocol.keep_alive_request() {
                            Ok(probe) => probe,
                            Err(e) => return Exit::Fatal(e),
                        };
                        if let Err(e) = write.send(Message::Text(probe.into())).await {
                            return Exit::Retry(WsError::Connection(e));
                        }
                        let deadline = self.keep_alive.ping_sent();
                        #[cfg(feature = "tracing")]
                        tracing::trace!(?deadline, "Sent keep-alive probe");
                        #[cfg(not(feature = "tracing"))]
                        let _ = deadline;
                    }
                    KeepAliveEvent::Expired => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("Keep-alive probe unanswered, terminating transport");
                        return Exit::Retry(WsError::Timeout);
                    }
                },
            }
        }
    }

    fn dispatch(&mut self, text: &str) {
        match self.protocol.handle(text) {
            Inbound::Subscribed(subscription) => {
                #[cfg(feature = "tracing")]
                tracing::info!(%subscription, "Subscription confirmed");
                self.transition(Transition::Confirmed(subscription));
            }
            Inbound::SubscribeRejected(error) => {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    %error,
                    "Subscription rejected; the session stays open but will not deliver logs"
                );
                self.handler
                    .handle(Err(WsError::SubscriptionFailed(error.to_string()).into()));
            }
            Inbound::Pong => {
                self.keep_alive.pong_received();
            }
            Inbound::Log(log) => {
                let event = self.decoder.decode(&log);
                self.handler.handle(event);
            }
            Inbound::Ignored(Ignored::Malformed(reason)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%text, %reason, "Dropping malformed frame");
                #[cfg(not(feature = "tracing"))]
                let _ = &reason;
            }
            Inbound::Ignored(reason) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(?reason, "Ignoring frame");
                #[cfg(not(feature = "tracing"))]
                let _ = &reason;
            }
        }
    }

    fn transition(&self, transition: Transition) -> bool {
        advance(&self.state_tx, transition)
    }
}
