//! # tb-fifo
//!
//! The FIFO-to-UDP pipeline and the cooperative loop that drives it.
//!
//! ## Architecture
//!
//! ```text
//! registers ──► reader ──► decoder ──► tb_core::udp forwarder ──► UDP
//!                 ▲
//!   scheduler ────┘  (also services timer flags and stack hooks)
//! ```
//!
//! - [`reader`]: occupancy/length/data register protocol
//! - [`decoder`]: word ⇄ trade bit layout
//! - [`scheduler`]: the polling loop
//! - [`stack`]: network stack hooks and the hosted adapter
//! - [`timer`]: timer flags and the hosted tick source
//! - [`feed`]: synthetic trades for the simulated FIFO

pub mod decoder;
pub mod feed;
pub mod reader;
pub mod scheduler;
pub mod stack;
pub mod timer;
