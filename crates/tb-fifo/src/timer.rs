//! Timer flags shared between the tick source and the polling loop.
//!
//! Each flag is a single-producer / single-consumer handoff:
//!
//! - the producer (timer interrupt, or its hosted stand-in) stores `true`
//!   with `Release`;
//! - the loop loads with `Acquire`, runs the timer service, then stores
//!   `false` with `Release`.
//!
//! A tick raised while the service is running is absorbed by the clear that
//! follows it, so ticks coalesce rather than queue up.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// The two periodic timer signals of the network stack.
#[derive(Debug, Default)]
pub struct TimerFlags {
    fast: AtomicBool,
    slow: AtomicBool,
}

impl TimerFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side: mark the fast timer as due.
    #[inline]
    pub fn raise_fast(&self) {
        self.fast.store(true, Ordering::Release);
    }

    /// Producer side: mark the slow timer as due.
    #[inline]
    pub fn raise_slow(&self) {
        self.slow.store(true, Ordering::Release);
    }

    #[inline]
    pub fn fast_due(&self) -> bool {
        self.fast.load(Ordering::Acquire)
    }

    #[inline]
    pub fn slow_due(&self) -> bool {
        self.slow.load(Ordering::Acquire)
    }

    /// Consumer side: acknowledge the fast timer after servicing it.
    #[inline]
    pub fn clear_fast(&self) {
        self.fast.store(false, Ordering::Release);
    }

    /// Consumer side: acknowledge the slow timer after servicing it.
    #[inline]
    pub fn clear_slow(&self) {
        self.slow.store(false, Ordering::Release);
    }
}

/// Spawn the hosted tick source on the current tokio runtime.
///
/// Two interval tasks raise the fast and slow flags at their periods.
/// Missed ticks are skipped, matching a hardware timer that simply
/// re-asserts an already-set flag.
pub fn spawn_tick_source(flags: Arc<TimerFlags>, fast: Duration, slow: Duration) -> Vec<JoinHandle<()>> {
    debug!("tick source: fast={fast:?} slow={slow:?}");
    let fast_flags = flags.clone();
    let fast_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(fast);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;
        loop {
            interval.tick().await;
            fast_flags.raise_fast();
        }
    });

    let slow_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(slow);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;
        loop {
            interval.tick().await;
            flags.raise_slow();
        }
    });

    vec![fast_task, slow_task]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_start_clear_and_are_independent() {
        let flags = TimerFlags::new();
        assert!(!flags.fast_due());
        assert!(!flags.slow_due());

        flags.raise_fast();
        assert!(flags.fast_due());
        assert!(!flags.slow_due());

        flags.raise_slow();
        flags.clear_fast();
        assert!(!flags.fast_due());
        assert!(flags.slow_due());
    }

    #[test]
    fn repeated_raise_coalesces() {
        let flags = TimerFlags::new();
        flags.raise_slow();
        flags.raise_slow();
        flags.clear_slow();
        assert!(!flags.slow_due());
    }

    #[tokio::test(start_paused = true)]
    async fn tick_source_raises_both_flags() {
        let flags = Arc::new(TimerFlags::new());
        let tasks = spawn_tick_source(flags.clone(), Duration::from_millis(250), Duration::from_millis(500));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(flags.fast_due());
        assert!(!flags.slow_due());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(flags.slow_due());

        for t in tasks {
            t.abort();
        }
    }
}
