//! Extension points of the listener: how logs are decoded and where they go.

use crate::Result;
use crate::rpc::types::response::RawLog;

/// Turns a raw log into an application event.
///
/// Decoding runs on the connection task, once per routed notification. A
/// failure is handed to the [`EventHandler`] as an `Err` of
/// [`Kind::Decode`](crate::error::Kind::Decode); it never affects the connection.
///
/// # Example
///
/// ```
/// use evm_log_listener::Result;
/// use evm_log_listener::rpc::RawLog;
/// use evm_log_listener::ws::Decoder;
///
/// struct BlockNumber;
///
/// impl Decoder for BlockNumber {
///     type Event = Option<u64>;
///
///     fn decode(&self, log: &RawLog) -> Result<Self::Event> {
///         Ok(log.block())
///     }
/// }
/// ```
pub trait Decoder: Send + Sync + 'static {
    /// Decoded event type
    type Event: Send + 'static;

    fn decode(&self, log: &RawLog) -> Result<Self::Event>;
}

/// Receives every decoded event, or the reason one could not be produced.
///
/// Called sequentially from the connection task, in arrival order. Any
/// `FnMut(Result<E>)` closure is a handler.
pub trait EventHandler<E>: Send + 'static {
    fn handle(&mut self, event: Result<E>);
}

impl<E, F> EventHandler<E> for F
where
    F: FnMut(Result<E>) + Send + 'static,
{
    fn handle(&mut self, event: Result<E>) {
        self(event);
    }
}
