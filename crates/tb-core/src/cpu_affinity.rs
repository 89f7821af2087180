//! Pinning the polling loop to a CPU core.
//!
//! The cooperative loop spins without ever sleeping, so it owns a core.
//! Pinning keeps it from migrating and sharing caches with the tokio
//! runtime that emulates the timer interrupts.

use tracing::{info, warn};

/// Bind the current thread to the specified CPU core.
///
/// Returns `true` if the binding succeeded, `false` if the core ID is invalid
/// or the OS rejected the request.
pub fn bind_to_core(core_id: usize) -> bool {
    let core_ids = core_affinity::get_core_ids().unwrap_or_default();
    let Some(core) = core_ids.get(core_id) else {
        warn!("CPU core {core_id} not available (system has {} cores)", core_ids.len());
        return false;
    };
    let ok = core_affinity::set_for_current(*core);
    if ok {
        info!("loop thread bound to CPU core {core_id}");
    } else {
        warn!("failed to bind loop thread to CPU core {core_id}");
    }
    ok
}

/// Bind the current thread if a non-negative core is configured.
///
/// Returns whether the thread ended up pinned.
pub fn maybe_bind(core_id: Option<i32>) -> bool {
    match core_id {
        Some(id) if id >= 0 => bind_to_core(id as usize),
        _ => false,
    }
}
