//! The CHIP-side register file, and the `BusRegisters` capability that
//! abstracts "read/write a 32-bit register at offset O" (`spec.md` §1(d)
//! leaves the physical bus itself explicitly out of scope).
//!
//! The offsets and interrupt bits below are a straight translation of
//! `spec.md` §3's register table and `examples/original_source/shared.h`'s
//! `CHIP_REG_*`/`CHIP_INT_*` macros. The two concrete implementations mirror
//! a familiar split for this kind of register file: a raw volatile pointer
//! for real hardware (the same shape as `XskRing::new` over an mmap), and an
//! atomics-backed in-process stand-in for testing
//! (`examples/original_source/shared.h`'s `SIMULATION_MODE` register array,
//! generalized to `core::sync::atomic`).
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU32, Ordering};

/// CHIP's current TX consumption pointer. Written by CHIP, read by HOST.
pub const TX_TAIL_PTR: u32 = 0x00;
/// CHIP's current RX production pointer. Written by CHIP, read by HOST.
pub const RX_HEAD_PTR: u32 = 0x04;
/// HOST's current TX production pointer. Written by HOST, read by CHIP.
pub const HOST_TX_HEAD_PUB: u32 = 0x08;
/// HOST's current RX consumption pointer. Written by HOST, read by CHIP.
pub const HOST_RX_TAIL_PUB: u32 = 0x0C;
/// Bitmask of pending interrupt sources. Written by CHIP, read by HOST.
pub const INT_STATUS: u32 = 0x10;
/// Write-1-to-clear mask for `INT_STATUS`. Written by HOST, read by CHIP.
pub const INT_CLEAR: u32 = 0x14;
/// Bitmask: which `INT_STATUS` bits raise the IRQ line. Written by HOST,
/// read by CHIP.
pub const INT_ENABLE: u32 = 0x18;

/// Number of 32-bit registers in the block (the table in `spec.md` §3).
pub const REGISTER_COUNT: usize = 7;

/// Raised by CHIP when RX fill rises through `rx_high_watermark`.
pub const INT_RX_DATA_READY: u32 = 1 << 0;
/// Raised by CHIP when TX free space rises through `tx_low_watermark` after
/// consumption.
pub const INT_TX_SPACE_AVAIL: u32 = 1 << 1;
/// Raised by CHIP on an internal (opaque) error.
pub const INT_ERROR: u32 = 1 << 2;

/// All interrupt bits this crate knows about, for the default `INT_ENABLE`
/// mask written during HOST init.
pub const INT_ALL: u32 = INT_RX_DATA_READY | INT_TX_SPACE_AVAIL | INT_ERROR;

/// Read/write access to the 7-register block at a byte offset. The only
/// seam a real hardware backend needs to fill in; everything else in this
/// crate is written against this trait.
pub trait BusRegisters {
    /// Read the 32-bit register at `offset`.
    fn read(&self, offset: u32) -> u32;

    /// Write the 32-bit register at `offset`.
    fn write(&self, offset: u32, value: u32);

    /// OR `bit` into `INT_STATUS`. Only ever called from the CHIP side (the
    /// sole writer of `INT_STATUS`, per the register table); provided here
    /// so `ChipTxHandle`/`ChipRxHandle` don't need their own read-modify-write
    /// loop over the raw trait.
    fn raise_interrupt(&self, bit: u32) {
        let status = self.read(INT_STATUS);
        self.write(INT_STATUS, status | bit);
    }
}

/// In-process, atomics-backed register file. Used both as the "coherent
/// host, no real CHIP silicon" production backend and, re-exported as
/// [`crate::sim::SimBus`], as the register half of the test/demo harness.
///
/// A write to `INT_CLEAR` does not store into a literal seventh slot (no one
/// ever reads it back) — it performs the edge-triggered `INT_STATUS &= !mask`
/// that `spec.md` §4.7 describes as the CHIP hardware's own behavior on
/// receiving a clear write.
#[derive(Debug, Default)]
pub struct AtomicRegisters {
    slots: [AtomicU32; REGISTER_COUNT],
}

impl AtomicRegisters {
    /// A freshly zeroed register file.
    pub fn new() -> Self {
        AtomicRegisters { slots: core::array::from_fn(|_| AtomicU32::new(0)) }
    }

    fn slot(offset: u32) -> usize {
        let index = (offset / 4) as usize;
        debug_assert!(index < REGISTER_COUNT, "register offset out of range: {offset:#x}");
        index
    }
}

impl BusRegisters for AtomicRegisters {
    fn read(&self, offset: u32) -> u32 {
        self.slots[Self::slot(offset)].load(Ordering::Acquire)
    }

    fn write(&self, offset: u32, value: u32) {
        if offset == INT_CLEAR {
            self.slots[Self::slot(INT_STATUS)].fetch_and(!value, Ordering::AcqRel);
            return;
        }
        self.slots[Self::slot(offset)].store(value, Ordering::Release);
    }
}

/// Real-hardware backend: the register block as a raw volatile MMIO window.
///
/// Unlike [`AtomicRegisters`], this performs no `INT_CLEAR` masking itself —
/// on real silicon that edge-triggered behavior lives in the CHIP's own
/// hardware logic, invisible to the host's MMIO write. This type is a plain
/// passthrough.
#[derive(Debug, Clone, Copy)]
pub struct MmioRegisters {
    base: NonNull<u32>,
}

impl MmioRegisters {
    /// Wrap a live MMIO mapping of the register block.
    ///
    /// # Safety
    ///
    /// `base` must point to a valid mapping of [`REGISTER_COUNT`] 32-bit
    /// registers laid out per the offsets in this module, and must outlive
    /// this value and any copy of it.
    pub unsafe fn new(base: NonNull<u32>) -> Self {
        MmioRegisters { base }
    }
}

// Safety: access is volatile MMIO; the single-writer-per-register discipline
// is enforced by the caller, as for every other raw pointer in this crate.
unsafe impl Send for MmioRegisters {}
unsafe impl Sync for MmioRegisters {}

impl BusRegisters for MmioRegisters {
    fn read(&self, offset: u32) -> u32 {
        let index = (offset / 4) as usize;
        unsafe { core::ptr::read_volatile(self.base.as_ptr().add(index)) }
    }

    fn write(&self, offset: u32, value: u32) {
        let index = (offset / 4) as usize;
        unsafe { core::ptr::write_volatile(self.base.as_ptr().add(index), value) }
    }
}
