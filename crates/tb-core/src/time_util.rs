//! Monotonic timestamps for latency measurement on the polling loop.
//!
//! Uses `clock_gettime(CLOCK_MONOTONIC_RAW)` on Linux and an `Instant`
//! origin elsewhere. Values are only meaningful as differences.

#[cfg(target_os = "linux")]
#[inline]
fn clock_monotonic() -> (u64, u64) {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    // SAFETY: CLOCK_MONOTONIC_RAW is always valid on Linux; on failure the
    // zeroed ts is returned.
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC_RAW, &mut ts);
    }
    (ts.tv_sec as u64, ts.tv_nsec as u64)
}

#[cfg(not(target_os = "linux"))]
#[inline]
fn clock_monotonic() -> (u64, u64) {
    use std::{sync::LazyLock, time::Instant};
    static ORIGIN: LazyLock<Instant> = LazyLock::new(Instant::now);
    let d = ORIGIN.elapsed();
    (d.as_secs(), d.subsec_nanos() as u64)
}

/// Monotonic clock in **nanoseconds**.
#[inline]
pub fn monotonic_ns() -> u64 {
    let (sec, nsec) = clock_monotonic();
    sec * 1_000_000_000 + nsec
}
