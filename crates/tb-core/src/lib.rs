//! # tb-core
//!
//! Core crate for the trade bridge, providing:
//!
//! - **Types** (`types`): trade record, FIFO packet, forward endpoint
//! - **Registers** (`regs`): register map + MMIO window over a memory device
//! - **Simulator** (`sim`): in-memory FIFO peripheral model
//! - **UDP** (`udp`): non-blocking telemetry forwarder
//! - **Configuration** (`config`): JSON config deserialization
//! - **Error types** (`error`): `BridgeError` and `SendError` via thiserror
//! - **CPU affinity** (`cpu_affinity`): pinning the polling loop
//! - **Latency** (`latency`): FIFO-to-wire latency histogram
//! - **Time utilities** (`time_util`): monotonic timestamps
//! - **Logging** (`logging`): tracing-based structured logging

pub mod config;
pub mod cpu_affinity;
pub mod error;
pub mod latency;
pub mod logging;
pub mod regs;
pub mod sim;
pub mod time_util;
pub mod types;
pub mod udp;

// Re-export types at crate root for convenience.
pub use types::*;
