//! Register access layer for the AXI-Stream FIFO peripheral.
//!
//! The receive side of the peripheral exposes four 32-bit registers at fixed
//! byte offsets from its base address:
//!
//! ```text
//! ┌────────┬───────────┬──────────────────────────────────────────┐
//! │ offset │ register  │ purpose                                  │
//! ├────────┼───────────┼──────────────────────────────────────────┤
//! │ 0x18   │ RDFR      │ write RESET_KEY to clear the receive FIFO│
//! │ 0x1C   │ RDFO      │ number of ready entries                  │
//! │ 0x20   │ RDFD      │ pop one 32-bit word                      │
//! │ 0x24   │ RLR       │ length in bytes of the pending packet    │
//! └────────┴───────────┴──────────────────────────────────────────┘
//! ```
//!
//! [`MmioRegion`] maps the register page from a memory device and performs
//! volatile accesses. Reads of `RDFD` and `RLR` have side effects on the
//! hardware, so callers must never read them speculatively.

use std::sync::Arc;

/// Receive Data FIFO Reset.
pub const REG_RESET: usize = 0x18;
/// Receive Data FIFO Occupancy.
pub const REG_OCCUPANCY: usize = 0x1C;
/// Receive Data FIFO Data.
pub const REG_DATA: usize = 0x20;
/// Receive Length Register.
pub const REG_LENGTH: usize = 0x24;

/// Value that must be written to [`REG_RESET`] to clear the receive FIFO.
pub const RESET_KEY: u32 = 0xA5;

/// Bytes of register space the reader touches.
pub const REGISTER_SPAN: usize = REG_LENGTH + 4;

/// Uncached 32-bit register access at byte offsets from a peripheral base.
///
/// Methods take `&self` because hardware registers are not Rust memory: a
/// read may mutate device state without any Rust-visible mutation.
pub trait RegisterBank {
    fn read32(&self, offset: usize) -> u32;
    fn write32(&self, offset: usize, value: u32);
}

impl<R: RegisterBank + ?Sized> RegisterBank for Arc<R> {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        (**self).write32(offset, value)
    }
}

impl<R: RegisterBank + ?Sized> RegisterBank for &R {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        (**self).write32(offset, value)
    }
}

// ---------------------------------------------------------------------------
// MmioRegion
// ---------------------------------------------------------------------------

/// A memory-mapped register window.
pub struct MmioRegion {
    /// Start of the mapping (page aligned).
    map_base: *mut u8,
    /// Length of the mapping in bytes.
    map_len: usize,
    /// Distance from `map_base` to the peripheral base.
    page_offset: usize,
    /// Usable bytes starting at the peripheral base.
    span: usize,
}

// SAFETY: the mapping lives as long as the struct and every access is a
// single aligned volatile load or store. The loop is the only reader.
unsafe impl Send for MmioRegion {}

impl MmioRegion {
    /// Map `span` bytes of physical memory starting at `base_addr`.
    ///
    /// `device` is normally `/dev/mem` (or a UIO node exposing the same
    /// window). The base does not need to be page aligned.
    #[cfg(target_os = "linux")]
    pub fn map(device: &str, base_addr: u64, span: usize) -> anyhow::Result<Self> {
        use std::ffi::CString;

        use crate::error::BridgeError;

        // SAFETY: sysconf has no preconditions.
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if page_size <= 0 {
            return Err(BridgeError::Register("cannot determine page size".into()).into());
        }
        let page_size = page_size as u64;
        let page_base = base_addr & !(page_size - 1);
        let page_offset = (base_addr - page_base) as usize;
        let map_len = (page_offset + span).div_ceil(page_size as usize) * page_size as usize;

        let c_path = CString::new(device)?;

        // SAFETY: open + mmap + close, the mapping outlives the descriptor.
        unsafe {
            let fd = libc::open(c_path.as_ptr(), libc::O_RDWR | libc::O_SYNC);
            if fd < 0 {
                return Err(BridgeError::Register(format!(
                    "open {device} failed: {}",
                    std::io::Error::last_os_error()
                ))
                .into());
            }

            let base = libc::mmap(
                std::ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                page_base as libc::off_t,
            );
            libc::close(fd);

            if base == libc::MAP_FAILED {
                return Err(BridgeError::Register(format!(
                    "mmap {device} @ {base_addr:#x} failed: {}",
                    std::io::Error::last_os_error()
                ))
                .into());
            }

            Ok(Self { map_base: base as *mut u8, map_len, page_offset, span })
        }
    }

    /// Register windows are only mapped on Linux targets.
    #[cfg(not(target_os = "linux"))]
    pub fn map(device: &str, base_addr: u64, _span: usize) -> anyhow::Result<Self> {
        Err(crate::error::BridgeError::Register(format!(
            "cannot map {device} @ {base_addr:#x}: MMIO requires Linux"
        ))
        .into())
    }

    #[inline]
    fn reg_ptr(&self, offset: usize) -> *mut u32 {
        debug_assert!(offset % 4 == 0 && offset + 4 <= self.span, "bad register offset {offset:#x}");
        // SAFETY: offset is within the mapped span (checked in debug builds).
        unsafe { self.map_base.add(self.page_offset + offset) as *mut u32 }
    }
}

impl RegisterBank for MmioRegion {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        // SAFETY: aligned pointer into a live device mapping.
        unsafe { std::ptr::read_volatile(self.reg_ptr(offset)) }
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        // SAFETY: aligned pointer into a live device mapping.
        unsafe { std::ptr::write_volatile(self.reg_ptr(offset), value) }
    }
}

impl Drop for MmioRegion {
    fn drop(&mut self) {
        #[cfg(target_os = "linux")]
        unsafe {
            libc::munmap(self.map_base as *mut libc::c_void, self.map_len);
        }
    }
}
