use async_trait::async_trait;
use futures::{Sink, Stream};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as TungsteniteError, Message};
use url::Url;

use super::error::WsError;

/// A bidirectional WebSocket message stream.
///
/// Implemented for every `tokio-tungstenite` stream, whatever the underlying
/// I/O, so tests can run the listener over in-memory pipes.
pub trait Transport:
    Stream<Item = Result<Message, TungsteniteError>>
    + Sink<Message, Error = TungsteniteError>
    + Send
    + Unpin
{
}

impl<T> Transport for T where
    T: Stream<Item = Result<Message, TungsteniteError>>
        + Sink<Message, Error = TungsteniteError>
        + Send
        + Unpin
{
}

pub type BoxTransport = Box<dyn Transport>;

/// Opens transports to an endpoint.
///
/// Errors for which [`WsError::is_fatal`] holds stop the listener; any other
/// error is retried after a backoff delay.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, endpoint: &Url) -> Result<BoxTransport, WsError>;
}

/// Dials the endpoint over TCP, with TLS for `wss://`.
#[expect(clippy::exhaustive_structs, reason = "Stateless connector passed by value")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, endpoint: &Url) -> Result<BoxTransport, WsError> {
        match connect_async(endpoint.as_str()).await {
            Ok((stream, _response)) => Ok(Box::new(stream)),
            Err(e) => Err(classify(e)),
        }
    }
}

/// Split connect failures into fatal handshake problems and transient I/O.
fn classify(error: TungsteniteError) -> WsError {
    match error {
        TungsteniteError::Http(response) => WsError::HandshakeRejected {
            status: response.status().as_u16(),
        },
        TungsteniteError::Url(e) => WsError::InvalidEndpoint(e.to_string()),
        other => WsError::Connection(other),
    }
}
