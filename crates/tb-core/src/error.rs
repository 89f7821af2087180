//! Typed error definitions for the trade bridge.
//!
//! Provides [`BridgeError`] for bring-up failures and [`SendError`] for the
//! drop taxonomy of the telemetry path. All variants implement
//! `std::error::Error` via `thiserror`, so they integrate seamlessly with
//! `anyhow::Result`.

use thiserror::Error;

/// Domain-specific errors raised while bringing the bridge up.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Register window mapping or access error.
    #[error("register error: {0}")]
    Register(String),

    /// UDP socket setup error.
    #[error("udp error: {0}")]
    Udp(String),
}

/// Reasons a telemetry datagram was dropped.
///
/// None of these are fatal: the caller logs the error and moves on.
#[derive(Debug, Error)]
pub enum SendError {
    /// The payload did not fit the formatting buffer.
    #[error("payload formatting failed")]
    Format,

    /// The outbound buffer could not be allocated.
    #[error("buffer allocation failed (len={len})")]
    Alloc { len: usize },

    /// The socket rejected the datagram (including would-block).
    #[error("transmit failed: {0}")]
    Transmit(#[from] std::io::Error),

    /// The socket accepted only part of the datagram.
    #[error("short send: {sent} of {len} bytes")]
    Short { sent: usize, len: usize },
}
