#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests, and https://github.com/rust-lang/rust-clippy/issues/13981"
)]
#![allow(
    unused,
    reason = "Not every test binary uses every helper"
)]

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use evm_log_listener::rpc::{LogFilter, RawLog};
use evm_log_listener::types::{Address, B256, address, b256};
use evm_log_listener::ws::{BoxTransport, Connector, WsError};
use futures_util::{SinkExt as _, StreamExt as _};
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing_subscriber::EnvFilter;
use url::Url;

pub const TOKEN: Address = address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
pub const TRANSFER: B256 =
    b256!("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

#[must_use]
pub fn filter() -> LogFilter {
    LogFilter::new(TOKEN, [TRANSFER])
}

/// Transfer log payload as a node would send it.
#[must_use]
pub fn log_payload(block: u64) -> Value {
    json!({
        "address": TOKEN,
        "topics": [
            TRANSFER,
            "0x0000000000000000000000001111111111111111111111111111111111111111",
            "0x0000000000000000000000002222222222222222222222222222222222222222"
        ],
        "data": "0x00000000000000000000000000000000000000000000000000000000000003e8",
        "blockNumber": format!("{block:#x}"),
        "logIndex": "0x0",
        "removed": false
    })
}

/// Route library logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Assert `actual` is `expected`, allowing for timer granularity.
pub fn assert_duration(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(10),
        "expected {expected:?}, got {actual:?}"
    );
}

/// Server side of one accepted connection.
pub struct Peer<S> {
    ws: WebSocketStream<S>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Peer<S> {
    #[must_use]
    pub fn new(ws: WebSocketStream<S>) -> Self {
        Self { ws }
    }

    /// Next text frame, or `None` once the client has gone away.
    pub async fn next_text(&mut self) -> Option<String> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),
                Some(Ok(Message::Close(_)) | Err(_)) | None => return None,
                Some(Ok(_)) => {}
            }
        }
    }

    pub async fn recv_json(&mut self) -> Value {
        let text = self.next_text().await.expect("client closed the connection");
        serde_json::from_str(&text).unwrap()
    }

    pub async fn send_json(&mut self, value: &Value) {
        self.send_text(&value.to_string()).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws.send(Message::Text(text.to_owned().into())).await.unwrap();
    }

    /// Read the subscribe request and confirm it with `subscription`.
    pub async fn accept_subscription(&mut self, subscription: &str) -> Value {
        let request = self.recv_json().await;
        assert_eq!(request["method"], "eth_subscribe");
        self.send_json(&json!({ "jsonrpc": "2.0", "id": request["id"], "result": subscription }))
            .await;
        request
    }

    /// Read the next keep-alive probe and answer it.
    pub async fn answer_ping(&mut self) -> Value {
        let probe = self.recv_json().await;
        assert_eq!(probe["method"], "net_listening");
        self.send_json(&json!({ "jsonrpc": "2.0", "id": probe["id"], "result": true }))
            .await;
        probe
    }

    pub async fn notify(&mut self, subscription: &str, log: Value) {
        self.send_json(&json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": { "subscription": subscription, "result": log }
        }))
        .await;
    }

    /// Whether the client closes the connection within `within`.
    pub async fn closed_within(&mut self, within: Duration) -> bool {
        timeout(within, async {
            while self.next_text().await.is_some() {}
        })
        .await
        .is_ok()
    }

    pub async fn close(mut self) {
        _ = self.ws.close(None).await;
    }
}

/// What [`MemoryConnector`] does on a connect call.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    /// Hand out an in-memory transport
    Accept,
    /// Fail as if the TCP connection was refused
    Refuse,
    /// Fail as if the server answered the upgrade with this HTTP status
    Reject(u16),
    /// Accept TCP but never finish the handshake
    Stall,
}

struct Plan {
    outcomes: VecDeque<Outcome>,
    attempts: Vec<Instant>,
}

/// Connector over `tokio::io::duplex` pipes, following a scripted plan.
///
/// Connect calls beyond the plan are accepted. Works with a paused clock.
#[derive(Clone)]
pub struct MemoryConnector {
    plan: Arc<Mutex<Plan>>,
    peers: mpsc::UnboundedSender<Peer<DuplexStream>>,
}

impl MemoryConnector {
    #[must_use]
    pub fn new<I: IntoIterator<Item = Outcome>>(
        outcomes: I,
    ) -> (Self, mpsc::UnboundedReceiver<Peer<DuplexStream>>) {
        let (peers, peers_rx) = mpsc::unbounded_channel();
        let plan = Plan {
            outcomes: outcomes.into_iter().collect(),
            attempts: Vec::new(),
        };

        (
            Self {
                plan: Arc::new(Mutex::new(plan)),
                peers,
            },
            peers_rx,
        )
    }

    /// When each connect call happened.
    #[must_use]
    pub fn attempts(&self) -> Vec<Instant> {
        self.plan.lock().unwrap().attempts.clone()
    }

    /// Gaps between consecutive connect calls.
    #[must_use]
    pub fn gaps(&self) -> Vec<Duration> {
        self.attempts()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _endpoint: &Url) -> Result<BoxTransport, WsError> {
        let outcome = {
            let mut plan = self.plan.lock().unwrap();
            plan.attempts.push(Instant::now());
            plan.outcomes.pop_front().unwrap_or(Outcome::Accept)
        };

        match outcome {
            Outcome::Accept => {
                let (client, server) = tokio::io::duplex(64 * 1024);
                let client = WebSocketStream::from_raw_socket(client, Role::Client, None).await;
                let server = WebSocketStream::from_raw_socket(server, Role::Server, None).await;
                _ = self.peers.send(Peer::new(server));
                Ok(Box::new(client))
            }
            Outcome::Refuse => Err(WsError::Connection(tungstenite::Error::Io(io::Error::from(
                io::ErrorKind::ConnectionRefused,
            )))),
            Outcome::Reject(status) => Err(WsError::HandshakeRejected { status }),
            Outcome::Stall => std::future::pending().await,
        }
    }
}

/// Mock node listening on a real TCP port.
///
/// Every accepted connection is handed to the test as a [`Peer`].
pub struct MockWsServer {
    addr: SocketAddr,
    peers: mpsc::UnboundedReceiver<Peer<TcpStream>>,
}

impl MockWsServer {
    /// Start a mock WebSocket server on a random port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (peers_tx, peers) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };

                let Ok(ws_stream) = tokio_tungstenite::accept_async(stream).await else {
                    continue;
                };

                if peers_tx.send(Peer::new(ws_stream)).is_err() {
                    break;
                }
            }
        });

        Self { addr, peers }
    }

    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Wait for the next client connection.
    pub async fn next_peer(&mut self) -> Peer<TcpStream> {
        timeout(Duration::from_secs(5), self.peers.recv())
            .await
            .expect("no client connected in time")
            .unwrap()
    }
}

/// Collects handler invocations into a channel.
#[must_use]
pub fn channel_handler<E: Send + 'static>() -> (
    impl FnMut(evm_log_listener::Result<E>) + Send + 'static,
    mpsc::UnboundedReceiver<evm_log_listener::Result<E>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |event| {
            _ = tx.send(event);
        },
        rx,
    )
}
