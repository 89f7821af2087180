//! Trade record and FIFO packet types.
//!
//! A trade record travels through the bridge packed into one hardware word:
//!
//! ```text
//!  31  30                    16 15                      0
//! ┌───┬────────────────────────┬────────────────────────┐
//! │ S │ quantity (15 bits)     │ price (16 bits)        │
//! └───┴────────────────────────┴────────────────────────┘
//!   S = 1 → BUY, S = 0 → SELL
//! ```

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// An opaque 32-bit value popped from the FIFO data register.
pub type RawWord = u32;

/// Upper bound (inclusive) on a FIFO packet length in bytes.
pub const MAX_PACKET_LEN: u32 = 65_536;

/// Largest quantity representable in the 15-bit field.
pub const MAX_QUANTITY: u16 = 0x7FFF;

/// Number of 32-bit words that carry `length_bytes` bytes.
#[inline]
pub const fn word_count(length_bytes: u32) -> u32 {
    length_bytes.div_ceil(4)
}

/// Trade direction, carried in bit 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Wire text used in the forwarded payload.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded trade.
///
/// `quantity` only ever holds 15 significant bits when produced by the
/// decoder; anything wider is masked off again on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TradeRecord {
    pub side: Side,
    pub quantity: u16,
    pub price: u16,
}

impl std::fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.side, self.quantity, self.price)
    }
}

/// One entry drained from the hardware FIFO.
///
/// Only the first word is retained; the rest were read to advance the FIFO
/// and then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoPacket {
    pub length_bytes: u32,
    pub word_count: u32,
    pub first_word: RawWord,
}

impl FifoPacket {
    /// Build a packet for a validated length.
    pub const fn new(length_bytes: u32, first_word: RawWord) -> Self {
        Self { length_bytes, word_count: word_count(length_bytes), first_word }
    }
}

/// Destination of the telemetry datagrams. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardEndpoint {
    pub address: Ipv4Addr,
    pub port: u16,
}

impl ForwardEndpoint {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.address, self.port))
    }
}

impl std::fmt::Display for ForwardEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}
