//! Named memory-ordering primitives and cache maintenance.
//!
//! `spec.md` §9 asks for three named fences mapped to whatever the target
//! actually needs, plus a `CacheOps` capability that collapses to no-ops on
//! coherent or simulated targets. A single-ring producer/consumer design can
//! get equivalent ordering for free from `Ordering::Release`/`Ordering::Acquire`
//! on the one index it publishes; here the fences are pulled out as their own
//! named primitives
//! because this protocol's barrier requirements are explicit, not implicit
//! in an atomic store/load pair.
use core::sync::atomic::{fence, Ordering};

/// Must run after all data-buffer stores a producer is about to reveal, and
/// before the index publish that reveals them.
#[inline(always)]
pub fn fence_release() {
    fence(Ordering::Release);
}

/// Must run after a consumer's read of the peer's published index, and
/// before any data-buffer loads that index governs.
#[inline(always)]
pub fn fence_acquire() {
    fence(Ordering::Acquire);
}

/// Must run after a register write that gates peer action, ensuring the
/// write is globally visible before the local side proceeds (relevant on
/// systems where bus writes are posted).
#[inline(always)]
pub fn fence_sync() {
    fence(Ordering::SeqCst);
}

/// Up to two linear `(offset, len)` byte ranges, for describing a span that
/// may straddle the ring's wrap boundary without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRanges {
    segments: [(u32, u32); 2],
    count: u8,
}

impl ByteRanges {
    /// A single contiguous range.
    pub fn one(offset: u32, len: u32) -> Self {
        ByteRanges { segments: [(offset, len), (0, 0)], count: 1 }
    }

    /// Two ranges, as produced when a span straddles the wrap boundary.
    pub fn two(offset_a: u32, len_a: u32, offset_b: u32, len_b: u32) -> Self {
        ByteRanges { segments: [(offset_a, len_a), (offset_b, len_b)], count: 2 }
    }

    /// Iterate the `(offset, len)` segments in order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.segments[..self.count as usize].iter().copied()
    }
}

/// Cache maintenance on systems where shared RAM is not DMA-coherent with
/// the local data cache. A producer cleans (writes back) what it wrote
/// before publishing; a consumer invalidates what it's about to read before
/// loading it.
pub trait CacheOps {
    /// Write back the given ranges so a peer's subsequent load goes to
    /// memory rather than a stale local line.
    fn clean(&self, ranges: ByteRanges);

    /// Discard local cache lines covering the given ranges so the next load
    /// goes to memory.
    fn invalidate(&self, ranges: ByteRanges);
}

/// `CacheOps` impl for coherent or fully-simulated targets: both operations
/// are no-ops, but the memory barriers above are still required and not
/// skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoherentCache;

impl CacheOps for CoherentCache {
    fn clean(&self, _ranges: ByteRanges) {}
    fn invalidate(&self, _ranges: ByteRanges) {}
}
