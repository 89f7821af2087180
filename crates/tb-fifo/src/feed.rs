//! Synthetic trade feed for `--simulate` runs.
//!
//! Pushes one single-word trade packet into a [`SimulatedFifo`] per period,
//! cycling side, quantity and price with a fixed LCG so runs are repeatable.

use std::sync::Arc;
use std::time::Duration;

use tb_core::sim::SimulatedFifo;
use tb_core::{Side, TradeRecord};
use tokio::task::JoinHandle;
use tracing::info;

use crate::decoder::encode;

/// Deterministic trade generator.
#[derive(Debug, Clone)]
pub struct SyntheticTrades {
    state: u32,
}

impl SyntheticTrades {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }
}

impl Iterator for SyntheticTrades {
    type Item = TradeRecord;

    fn next(&mut self) -> Option<TradeRecord> {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let s = self.state;
        Some(TradeRecord {
            side: if s & 1 == 0 { Side::Buy } else { Side::Sell },
            quantity: ((s >> 8) & 0x3FF) as u16 + 1,
            price: ((s >> 16) & 0xFFFF) as u16,
        })
    }
}

/// Spawn a task that feeds `fifo` one trade every `period`.
pub fn spawn_synthetic_feed(fifo: Arc<SimulatedFifo>, period: Duration) -> JoinHandle<()> {
    info!("synthetic feed: one trade every {period:?}");
    tokio::spawn(async move {
        let mut trades = SyntheticTrades::new(0x5EED);
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Some(trade) = trades.next() {
                fifo.push_packet(4, &[encode(&trade)]);
            }
        }
    })
}
