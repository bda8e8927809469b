#![expect(
    clippy::module_name_repetitions,
    reason = "Re-exported names intentionally match their modules for API clarity"
)]

//! Public entry point: start a [`Listener`] with a [`Decoder`](crate::ws::Decoder)
//! and a handler, and stop it when done.
//!
//! Two decoders ship with the crate. [`RawLogDecoder`] passes logs through
//! untouched and [`SolEventDecoder`] decodes them into a `sol!` event.

pub mod client;
pub mod decoder;

pub use client::Listener;
pub use decoder::{DecodedLog, RawLogDecoder, SolEventDecoder};
