use std::fmt;
use std::marker::PhantomData;

use alloy::sol_types::SolEvent;

use crate::Result;
use crate::error::Error;
use crate::rpc::types::response::RawLog;
use crate::ws::Decoder;

/// Hands every log to the handler as received.
#[expect(clippy::exhaustive_structs, reason = "Stateless decoder passed by value")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RawLogDecoder;

impl Decoder for RawLogDecoder {
    type Event = RawLog;

    fn decode(&self, log: &RawLog) -> Result<Self::Event> {
        Ok(log.clone())
    }
}

/// A decoded event together with the log it came from.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog<E> {
    pub event: E,
    /// Block and transaction metadata, and the `removed` flag set on reorgs
    pub log: RawLog,
}

/// Decodes logs into a `sol!` generated event type.
///
/// # Example
///
/// ```
/// use alloy::sol;
/// use evm_log_listener::listener::SolEventDecoder;
/// use evm_log_listener::rpc::LogFilter;
/// use evm_log_listener::types::Address;
///
/// sol! {
///     event Transfer(address indexed from, address indexed to, uint256 value);
/// }
///
/// let filter = LogFilter::for_event::<Transfer>(Address::ZERO);
/// let decoder = SolEventDecoder::<Transfer>::new();
/// # let _ = (filter, decoder);
/// ```
pub struct SolEventDecoder<E> {
    _event: PhantomData<fn() -> E>,
}

impl<E> SolEventDecoder<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _event: PhantomData,
        }
    }
}

impl<E> Default for SolEventDecoder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for SolEventDecoder<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E: SolEvent> fmt::Debug for SolEventDecoder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolEventDecoder")
            .field("event", &E::SIGNATURE)
            .finish()
    }
}

impl<E> Decoder for SolEventDecoder<E>
where
    E: SolEvent + Send + 'static,
{
    type Event = DecodedLog<E>;

    fn decode(&self, log: &RawLog) -> Result<Self::Event> {
        if !E::ANONYMOUS {
            match log.topics.first() {
                Some(topic) if *topic == E::SIGNATURE_HASH => {}
                Some(topic) => {
                    return Err(Error::decode(format!(
                        "topic {topic} is not the signature of {}",
                        E::SIGNATURE
                    )));
                }
                None => {
                    return Err(Error::decode(format!(
                        "log without topics cannot be {}",
                        E::SIGNATURE
                    )));
                }
            }
        }

        let event = E::decode_raw_log(log.topics.iter().copied(), &log.data)?;

        Ok(DecodedLog {
            event,
            log: log.clone(),
        })
    }
}
