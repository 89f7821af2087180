//! The cooperative polling loop.
//!
//! One [`Scheduler`] owns the FIFO reader, the telemetry forwarder and the
//! network stack hooks, and runs them in a fixed order on a single thread:
//!
//! ```text
//! ┌─► fast flag? ──► stack.fast_timer(), clear
//! │   slow flag? ──► stack.slow_timer(), clear
//! │   stack.pump_input()
//! │   reader.try_read_packet() ──► decode ──► forwarder.forward()
//! │   stack.protocol_hook()
//! └── (self-test / stats bookkeeping)
//! ```
//!
//! Timers are serviced before the FIFO path so their latency is bounded by
//! one iteration. Nothing in the loop blocks and no error stops it.

use std::sync::Arc;

use tb_core::config::LoopConfig;
use tb_core::latency::LatencyCollector;
use tb_core::regs::RegisterBank;
use tb_core::time_util;
use tb_core::udp::{DatagramSink, SELF_TEST_PAYLOAD, TelemetryForwarder};
use tracing::{debug, info, warn};

use crate::decoder::decode;
use crate::reader::FifoReader;
use crate::stack::NetworkStack;
use crate::timer::TimerFlags;

/// Counters kept by the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub fast_timers: u64,
    pub slow_timers: u64,
    pub packets: u64,
    pub forwarded: u64,
    pub send_failures: u64,
    pub rejected_lengths: u64,
    pub self_tests: u64,
}

impl std::fmt::Display for LoopStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "iter={} fast={} slow={} packets={} fwd={} send_fail={} rejected={} self_test={}",
            self.iterations,
            self.fast_timers,
            self.slow_timers,
            self.packets,
            self.forwarded,
            self.send_failures,
            self.rejected_lengths,
            self.self_tests,
        )
    }
}

/// Loop tuning taken from the `loop` config section.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerOptions {
    /// Send the self-test datagram every this many iterations.
    pub self_test_interval: Option<u64>,
    /// Report stats every this many iterations (0 disables).
    pub stats_interval: u64,
}

impl From<&LoopConfig> for SchedulerOptions {
    fn from(cfg: &LoopConfig) -> Self {
        Self { self_test_interval: cfg.self_test_interval, stats_interval: cfg.stats_interval_iterations }
    }
}

pub struct Scheduler<R, S, N> {
    reader: FifoReader<R>,
    forwarder: TelemetryForwarder<S>,
    stack: N,
    flags: Arc<TimerFlags>,
    opts: SchedulerOptions,
    stats: LoopStats,
    latency: LatencyCollector,
}

impl<R, S, N> Scheduler<R, S, N>
where
    R: RegisterBank,
    S: DatagramSink,
    N: NetworkStack,
{
    pub fn new(
        reader: FifoReader<R>,
        forwarder: TelemetryForwarder<S>,
        stack: N,
        flags: Arc<TimerFlags>,
        opts: SchedulerOptions,
    ) -> Self {
        Self { reader, forwarder, stack, flags, opts, stats: LoopStats::default(), latency: LatencyCollector::new() }
    }

    /// Poll forever. Only a process reset ends the loop.
    pub fn run(mut self) -> ! {
        info!("polling loop started, forwarding to {}", self.forwarder.endpoint());
        loop {
            self.poll_once();
        }
    }

    /// Run exactly one iteration.
    pub fn poll_once(&mut self) {
        self.stats.iterations += 1;

        if self.flags.fast_due() {
            self.stack.fast_timer();
            self.flags.clear_fast();
            self.stats.fast_timers += 1;
        }
        if self.flags.slow_due() {
            self.stack.slow_timer();
            self.flags.clear_slow();
            self.stats.slow_timers += 1;
        }

        self.stack.pump_input();
        self.process_fifo();
        self.stack.protocol_hook();

        self.housekeeping();
    }

    fn process_fifo(&mut self) {
        let Some(packet) = self.reader.try_read_packet() else {
            return;
        };
        let start_ns = time_util::monotonic_ns();
        self.stats.packets += 1;

        let record = decode(packet.first_word);
        match self.forwarder.forward(&record) {
            Ok(()) => {
                self.stats.forwarded += 1;
                self.latency.record(time_util::monotonic_ns().saturating_sub(start_ns));
                debug!("forwarded {record}");
            }
            Err(e) => {
                self.stats.send_failures += 1;
                warn!("dropping {record}: {e}");
            }
        }
    }

    fn housekeeping(&mut self) {
        let iter = self.stats.iterations;

        if let Some(every) = self.opts.self_test_interval
            && every > 0
            && iter % every == 0
        {
            match self.forwarder.send_raw(SELF_TEST_PAYLOAD) {
                Ok(()) => {
                    self.stats.self_tests += 1;
                    info!("sent self-test datagram to {}", self.forwarder.endpoint());
                }
                Err(e) => warn!("self-test datagram dropped: {e}"),
            }
        }

        if self.opts.stats_interval > 0 && iter % self.opts.stats_interval == 0 {
            info!("loop stats: {}", self.stats());
            if let Some(lat) = self.latency.stats() {
                info!("fifo->udp latency: {lat}");
            }
            self.latency.reset();
        }
    }

    /// Snapshot of the loop counters.
    pub fn stats(&self) -> LoopStats {
        LoopStats { rejected_lengths: self.reader.rejected(), ..self.stats }
    }

    pub fn stack(&self) -> &N {
        &self.stack
    }

    pub fn forwarder(&self) -> &TelemetryForwarder<S> {
        &self.forwarder
    }

    pub fn latency(&self) -> &LatencyCollector {
        &self.latency
    }
}
