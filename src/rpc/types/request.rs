use alloy::sol_types::SolEvent;
use bon::Builder;
use serde::Serialize;
use serde_json::Value;

use crate::types::{Address, B256};

const JSONRPC_VERSION: &str = "2.0";

/// Request id of the `eth_subscribe` call. One subscribe is sent per connection.
pub const SUBSCRIBE_REQUEST_ID: u64 = 1;
/// Request id of the `net_listening` keep-alive probe.
pub const KEEP_ALIVE_REQUEST_ID: u64 = 2;

/// Outbound JSON-RPC request envelope.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct Request<P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: P,
}

impl Request<(&'static str, LogFilter)> {
    /// `eth_subscribe` for logs matching `filter`.
    #[must_use]
    pub fn subscribe(filter: LogFilter) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: SUBSCRIBE_REQUEST_ID,
            method: "eth_subscribe",
            params: ("logs", filter),
        }
    }
}

impl Request<Vec<Value>> {
    /// `net_listening` probe used as keep-alive.
    #[must_use]
    pub fn keep_alive() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: KEEP_ALIVE_REQUEST_ID,
            method: "net_listening",
            params: Vec::new(),
        }
    }
}

/// Log subscription filter: one emitting contract and its positional topics.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Builder)]
pub struct LogFilter {
    /// Positional topic filter; the first entry is the event signature hash
    pub topics: Vec<B256>,
    /// Contract emitting the logs
    pub address: Address,
}

impl LogFilter {
    #[must_use]
    pub fn new<I: IntoIterator<Item = B256>>(address: Address, topics: I) -> Self {
        Self {
            topics: topics.into_iter().collect(),
            address,
        }
    }

    /// Filter on the signature hash of a `sol!` generated event.
    #[must_use]
    pub fn for_event<E: SolEvent>(address: Address) -> Self {
        Self::new(address, [E::SIGNATURE_HASH])
    }
}
