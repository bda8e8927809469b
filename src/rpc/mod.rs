//! JSON-RPC wire format for `eth_subscribe` log subscriptions.
//!
//! [`types`] holds the request and response payloads, [`protocol`] correlates
//! responses with outstanding requests and classifies notifications.

pub mod protocol;
pub mod types;

pub use protocol::{Ignored, Inbound, PendingRequest, RequestKind, SubscriptionProtocol};
pub use types::request::{LogFilter, Request};
pub use types::response::{RawLog, RpcError, SubscriptionId};
