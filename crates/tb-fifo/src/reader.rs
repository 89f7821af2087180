//! FIFO reader: turns the receive registers into [`FifoPacket`]s.
//!
//! One call to [`FifoReader::try_read_packet`] touches the hardware in this
//! order and never waits:
//!
//! ```text
//! RDFO == 0 ──► None                      (nothing else is read)
//! RDFO  > 0 ──► RLR ──► invalid ──► None  (policy applied, no RDFD reads)
//!                   └─► valid   ──► RDFD × ceil(len/4) ──► Some(packet)
//! ```
//!
//! Every `RDFD` read pops a word, so a valid packet is always drained in
//! full even though only its first word is kept.

use tb_core::config::InvalidLengthPolicy;
use tb_core::regs::{REG_DATA, REG_LENGTH, REG_OCCUPANCY, REG_RESET, RESET_KEY, RegisterBank};
use tb_core::{FifoPacket, MAX_PACKET_LEN, word_count};
use tracing::{debug, warn};

/// Polls and drains the receive side of the FIFO peripheral.
pub struct FifoReader<R> {
    regs: R,
    policy: InvalidLengthPolicy,
    rejected: u64,
}

impl<R: RegisterBank> FifoReader<R> {
    pub fn new(regs: R, policy: InvalidLengthPolicy) -> Self {
        Self { regs, policy, rejected: 0 }
    }

    /// Read one packet if the FIFO holds any data.
    pub fn try_read_packet(&mut self) -> Option<FifoPacket> {
        if self.regs.read32(REG_OCCUPANCY) == 0 {
            return None;
        }

        let len = self.regs.read32(REG_LENGTH);
        if len == 0 || len > MAX_PACKET_LEN {
            self.rejected += 1;
            match self.policy {
                InvalidLengthPolicy::Skip => {
                    warn!("FIFO: bogus length {len}; skipping");
                }
                InvalidLengthPolicy::Reset => {
                    warn!("FIFO: bogus length {len}; resetting receive FIFO");
                    self.reset();
                }
            }
            return None;
        }

        let words = word_count(len);
        let first_word = self.regs.read32(REG_DATA);
        for _ in 1..words {
            let _ = self.regs.read32(REG_DATA);
        }

        debug!(
            "FIFO: packet len={len} words={words} first={first_word:#010x} remaining={}",
            self.regs.read32(REG_OCCUPANCY)
        );
        Some(FifoPacket::new(len, first_word))
    }

    /// Clear the receive FIFO, dropping everything queued.
    pub fn reset(&self) {
        self.regs.write32(REG_RESET, RESET_KEY);
    }

    /// Number of lengths rejected since construction.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tb_core::sim::SimulatedFifo;

    use super::*;

    fn reader(policy: InvalidLengthPolicy) -> (Arc<SimulatedFifo>, FifoReader<Arc<SimulatedFifo>>) {
        let fifo = Arc::new(SimulatedFifo::new());
        (fifo.clone(), FifoReader::new(fifo, policy))
    }

    #[test]
    fn empty_fifo_reads_only_occupancy() {
        let (fifo, mut r) = reader(InvalidLengthPolicy::Skip);
        assert!(r.try_read_packet().is_none());
        assert_eq!(fifo.occupancy_reads(), 1);
        assert_eq!(fifo.length_reads(), 0);
        assert_eq!(fifo.data_reads(), 0);
    }

    #[test]
    fn single_word_packet() {
        let (fifo, mut r) = reader(InvalidLengthPolicy::Skip);
        fifo.push_packet(4, &[0x8001_0064]);
        let p = r.try_read_packet().unwrap();
        assert_eq!(p, FifoPacket { length_bytes: 4, word_count: 1, first_word: 0x8001_0064 });
        assert_eq!(fifo.data_reads(), 1);
        assert_eq!(fifo.pending_words(), 0);
    }

    #[test]
    fn multi_word_packet_is_fully_drained() {
        let (fifo, mut r) = reader(InvalidLengthPolicy::Skip);
        fifo.push_packet(10, &[0xAAAA_0001, 0xBBBB_0002, 0xCCCC_0003]);
        fifo.push_packet(4, &[0x0000_0009]);

        let p = r.try_read_packet().unwrap();
        assert_eq!(p.length_bytes, 10);
        assert_eq!(p.word_count, 3);
        assert_eq!(p.first_word, 0xAAAA_0001);

        // The next packet starts on its own first word.
        let p = r.try_read_packet().unwrap();
        assert_eq!(p.first_word, 0x0000_0009);
        assert_eq!(fifo.pending_words(), 0);
    }

    #[test]
    fn largest_length_is_accepted() {
        let (fifo, mut r) = reader(InvalidLengthPolicy::Skip);
        let words: Vec<u32> = (0..word_count(MAX_PACKET_LEN)).collect();
        fifo.push_packet(MAX_PACKET_LEN, &words);

        let p = r.try_read_packet().unwrap();
        assert_eq!(p.length_bytes, MAX_PACKET_LEN);
        assert_eq!(p.word_count, 16_384);
        assert_eq!(p.first_word, 0);
        assert_eq!(fifo.data_reads(), 16_384);
        assert_eq!(r.rejected(), 0);
    }

    #[test]
    fn zero_length_is_rejected_without_draining() {
        let (fifo, mut r) = reader(InvalidLengthPolicy::Skip);
        fifo.push_raw(0, &[0x8001_0064]);
        assert!(r.try_read_packet().is_none());
        assert_eq!(fifo.length_reads(), 1);
        assert_eq!(fifo.data_reads(), 0);
        assert_eq!(fifo.pending_words(), 1);
        assert_eq!(r.rejected(), 1);
    }

    #[test]
    fn oversized_length_is_rejected_without_draining() {
        let (fifo, mut r) = reader(InvalidLengthPolicy::Skip);
        fifo.push_raw(MAX_PACKET_LEN + 1, &[1, 2]);
        assert!(r.try_read_packet().is_none());
        assert_eq!(fifo.data_reads(), 0);
        assert_eq!(fifo.pending_words(), 2);
        assert_eq!(r.rejected(), 1);
        assert_eq!(fifo.resets(), 0);
    }

    #[test]
    fn skip_policy_leaves_stale_words_ahead_of_next_packet() {
        let (fifo, mut r) = reader(InvalidLengthPolicy::Skip);
        fifo.push_raw(0, &[0xDEAD_0000]);
        fifo.push_packet(4, &[0x8001_0064]);

        assert!(r.try_read_packet().is_none());
        // The next length belongs to the good packet, but the data register
        // still yields the rejected entry's word first.
        let p = r.try_read_packet().unwrap();
        assert_eq!(p.first_word, 0xDEAD_0000);
        assert_eq!(fifo.pending_words(), 1);

        // With no lengths left, the orphaned word keeps producing rejects.
        assert!(r.try_read_packet().is_none());
        assert_eq!(r.rejected(), 2);
    }

    #[test]
    fn reset_policy_realigns_fifo() {
        let (fifo, mut r) = reader(InvalidLengthPolicy::Reset);
        fifo.push_raw(0, &[0xDEAD_0000]);
        fifo.push_packet(4, &[0x8001_0064]);

        assert!(r.try_read_packet().is_none());
        assert_eq!(fifo.resets(), 1);
        assert_eq!(fifo.pending_words(), 0);
        assert_eq!(fifo.pending_lengths(), 0);

        fifo.push_packet(4, &[0x0002_00C8]);
        let p = r.try_read_packet().unwrap();
        assert_eq!(p.first_word, 0x0002_00C8);
    }

    #[test]
    fn explicit_reset_clears_queue() {
        let (fifo, r) = reader(InvalidLengthPolicy::Skip);
        fifo.push_packet(4, &[1]);
        r.reset();
        assert_eq!(fifo.pending_words(), 0);
        assert_eq!(fifo.resets(), 1);
    }
}
