#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error connecting to or communicating with the WebSocket server
    Connection(tokio_tungstenite::tungstenite::Error),
    /// The server answered the upgrade request with something other than `101 Switching Protocols`
    HandshakeRejected {
        /// HTTP status returned instead of the upgrade
        status: u16,
    },
    /// The endpoint cannot be dialed as a WebSocket URL
    InvalidEndpoint(String),
    /// Subscription request was refused by the node
    SubscriptionFailed(String),
    /// WebSocket connection was closed
    ConnectionClosed,
    /// A keep-alive probe went unanswered within the pong timeout
    Timeout,
    /// A connection attempt did not complete within the connect timeout
    ConnectTimeout,
}

impl WsError {
    /// Whether retrying the connection is pointless without operator action.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HandshakeRejected { .. } | Self::InvalidEndpoint(_)
        )
    }
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::HandshakeRejected { status } => {
                write!(f, "WebSocket handshake rejected with HTTP status {status}")
            }
            Self::InvalidEndpoint(reason) => write!(f, "Invalid WebSocket endpoint: {reason}"),
            Self::SubscriptionFailed(reason) => write!(f, "Subscription failed: {reason}"),
            Self::ConnectionClosed => write!(f, "WebSocket connection closed"),
            Self::Timeout => write!(f, "Keep-alive probe timed out"),
            Self::ConnectTimeout => write!(f, "WebSocket connection attempt timed out"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            _ => None,
        }
    }
}

// Integration with main Error type
impl From<WsError> for crate::error::Error {
    fn from(e: WsError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, e)
    }
}
