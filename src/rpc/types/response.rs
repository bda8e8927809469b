use std::fmt;

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Address, B256, Bytes, U64};

/// Opaque identifier a node assigns to a confirmed subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SubscriptionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// JSON-RPC error object.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Any inbound frame, before it is classified.
///
/// Responses carry `id` and one of `result`/`error`; notifications carry
/// `method` and `params`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// `params` of an `eth_subscription` notification.
#[derive(Debug, Deserialize)]
pub(crate) struct NotificationParams {
    pub subscription: SubscriptionId,
    pub result: Value,
}

/// Log record as delivered by `eth_subscribe("logs")`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    /// Contract that emitted the log
    pub address: Address,
    /// Indexed topics, signature hash first for non-anonymous events
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed arguments
    pub data: Bytes,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub transaction_index: Option<U64>,
    #[serde(default)]
    pub log_index: Option<U64>,
    /// Set when the log was dropped by a chain reorganization
    #[serde(default)]
    #[builder(default)]
    pub removed: bool,
}

impl RawLog {
    /// Block number as a plain integer.
    #[must_use]
    pub fn block(&self) -> Option<u64> {
        self.block_number.map(|n| n.to::<u64>())
    }
}
