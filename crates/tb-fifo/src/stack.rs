//! Hooks into the network stack that the polling loop drives.
//!
//! On a bare-metal target these are the stack's own entry points (TCP fast
//! and slow timers, the MAC input pump, the application's periodic hook).
//! On a Linux host the kernel owns the IP stack, so [`HostedStack`] only
//! keeps per-hook counters and traces each call.

use tracing::trace;

/// Entry points the loop calls every iteration. None may block.
pub trait NetworkStack {
    /// Fast timer service (fires every fast tick).
    fn fast_timer(&mut self);
    /// Slow timer service (fires every slow tick).
    fn slow_timer(&mut self);
    /// Move any received link-layer frames into the stack.
    fn pump_input(&mut self);
    /// Per-protocol periodic work, run after FIFO processing.
    fn protocol_hook(&mut self);
}

/// Call counts for each hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackCounters {
    pub fast_timer: u64,
    pub slow_timer: u64,
    pub pump_input: u64,
    pub protocol_hook: u64,
}

/// Network stack adapter for a Linux host.
#[derive(Debug, Default)]
pub struct HostedStack {
    counters: StackCounters,
}

impl HostedStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> StackCounters {
        self.counters
    }
}

impl NetworkStack for HostedStack {
    fn fast_timer(&mut self) {
        self.counters.fast_timer += 1;
        trace!("fast timer #{}", self.counters.fast_timer);
    }

    fn slow_timer(&mut self) {
        self.counters.slow_timer += 1;
        trace!("slow timer #{}", self.counters.slow_timer);
    }

    #[inline]
    fn pump_input(&mut self) {
        self.counters.pump_input += 1;
    }

    #[inline]
    fn protocol_hook(&mut self) {
        self.counters.protocol_hook += 1;
    }
}
