//! Core data types shared by the reader, decoder and forwarder.

pub mod trade;

pub use trade::*;
