//! In-memory model of the AXI-Stream FIFO receive path.
//!
//! Used by tests and by the runner's `--simulate` mode. The model keeps the
//! packet lengths and the data words in two separate queues, the same way
//! the peripheral does, so a reader that skips an entry without draining its
//! words sees them prepended to the next packet.
//!
//! - `RDFO` reports the number of words not yet popped.
//! - `RLR` pops the next queued length (0 if none).
//! - `RDFD` pops the next word (0 if none).
//! - writing [`RESET_KEY`] to `RDFR` clears both queues.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::regs::{REG_DATA, REG_LENGTH, REG_OCCUPANCY, REG_RESET, RESET_KEY, RegisterBank};
use crate::types::{RawWord, word_count};

#[derive(Default)]
struct Queues {
    lengths: VecDeque<u32>,
    words: VecDeque<RawWord>,
}

/// Simulated receive FIFO with per-register read counters.
#[derive(Default)]
pub struct SimulatedFifo {
    queues: Mutex<Queues>,
    occupancy_reads: AtomicU64,
    length_reads: AtomicU64,
    data_reads: AtomicU64,
    resets: AtomicU64,
}

impl SimulatedFifo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a well-formed packet: `ceil(len/4)` words are expected.
    pub fn push_packet(&self, length_bytes: u32, words: &[RawWord]) {
        debug_assert_eq!(words.len() as u32, word_count(length_bytes));
        self.push_raw(length_bytes, words);
    }

    /// Queue a length and words without checking that they agree.
    pub fn push_raw(&self, length_bytes: u32, words: &[RawWord]) {
        let mut q = self.lock();
        q.lengths.push_back(length_bytes);
        q.words.extend(words.iter().copied());
    }

    /// Words still waiting to be popped.
    pub fn pending_words(&self) -> usize {
        self.lock().words.len()
    }

    /// Lengths still waiting to be popped.
    pub fn pending_lengths(&self) -> usize {
        self.lock().lengths.len()
    }

    pub fn occupancy_reads(&self) -> u64 {
        self.occupancy_reads.load(Ordering::Relaxed)
    }

    pub fn length_reads(&self) -> u64 {
        self.length_reads.load(Ordering::Relaxed)
    }

    pub fn data_reads(&self) -> u64 {
        self.data_reads.load(Ordering::Relaxed)
    }

    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Queues> {
        // A poisoned lock only means a test panicked mid-push; the queues
        // themselves are still consistent.
        self.queues.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RegisterBank for SimulatedFifo {
    fn read32(&self, offset: usize) -> u32 {
        match offset {
            REG_OCCUPANCY => {
                self.occupancy_reads.fetch_add(1, Ordering::Relaxed);
                self.lock().words.len() as u32
            }
            REG_LENGTH => {
                self.length_reads.fetch_add(1, Ordering::Relaxed);
                self.lock().lengths.pop_front().unwrap_or(0)
            }
            REG_DATA => {
                self.data_reads.fetch_add(1, Ordering::Relaxed);
                self.lock().words.pop_front().unwrap_or(0)
            }
            _ => 0,
        }
    }

    fn write32(&self, offset: usize, value: u32) {
        if offset == REG_RESET && value == RESET_KEY {
            self.resets.fetch_add(1, Ordering::Relaxed);
            let mut q = self.lock();
            q.lengths.clear();
            q.words.clear();
        }
    }
}
