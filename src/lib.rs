#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod error;
pub mod listener;
pub mod rpc;
pub(crate) mod serde_helpers;
pub mod types;
pub mod ws;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

pub use listener::{DecodedLog, Listener, RawLogDecoder, SolEventDecoder};
pub use rpc::{LogFilter, RawLog, SubscriptionId};
pub use ws::{Config, ConnectionState, Decoder, EventHandler, ReconnectConfig};
