//! Re-exported types from external crates for convenience.
//!
//! These types appear throughout the public API and are re-exported here
//! so users don't need to add `alloy` to their `Cargo.toml` for simple setups.

/// Ethereum address type and the [`address!`] macro for compile-time address literals.
/// [`B256`] is the 32-byte word used for topics, block and transaction hashes.
/// [`Bytes`] holds the ABI-encoded, non-indexed log data.
/// [`U64`] is the hex quantity used for block numbers and log indices.
pub use alloy::primitives::{Address, B256, Bytes, U64, address, b256, keccak256};
/// Trait implemented by every event generated with `alloy::sol!`.
pub use alloy::sol_types::SolEvent;
