//! CHIP-side driver: `spec.md` §4.5–§4.8.
//!
//! Mirrors `src/host.rs`'s shape exactly, with producer and consumer roles
//! swapped: CHIP produces onto the RX ring and consumes from the TX ring.
//! Each producing/consuming call samples the fill or free level both before
//! and after its own effect and raises its interrupt only when that single
//! call crosses the watermark (`spec.md` §9's resolution of the
//! watermark-edge ambiguity), rather than every time the level happens to
//! sit past the threshold.
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::barrier::{self, CacheOps};
use crate::bus::{self, BusRegisters};
use crate::error::Error;
use crate::frame;
use crate::ring::{self, RingRegion};
use crate::LinkConfig;

type Bus = dyn BusRegisters + Send + Sync;
type Cache = dyn CacheOps + Send + Sync;

/// Entry point for bringing up the CHIP side of a link.
pub struct ChipLink;

impl ChipLink {
    /// Initialize the CHIP side and split it into its handles.
    ///
    /// `tx_region`/`rx_region` must be the same backing memory given to the
    /// HOST side's [`crate::host::HostLink::init`].
    pub fn init(
        bus: Arc<Bus>,
        cache: Arc<Cache>,
        tx_region: RingRegion,
        rx_region: RingRegion,
        config: &LinkConfig,
    ) -> (ChipTxHandle, ChipRxHandle) {
        bus.write(bus::TX_TAIL_PTR, 0);
        bus.write(bus::RX_HEAD_PTR, 0);
        barrier::fence_sync();
        log::debug!("chip: link initialized, tx={} rx={}", config.tx_buffer_size, config.rx_buffer_size);

        let tx = ChipTxHandle {
            bus: bus.clone(),
            cache: cache.clone(),
            region: tx_region,
            local_tail: 0,
            capacity: config.tx_buffer_size,
            low_watermark: config.tx_low_watermark,
            scratch: Vec::new(),
        };
        let rx = ChipRxHandle {
            bus,
            cache,
            region: rx_region,
            local_head: 0,
            capacity: config.rx_buffer_size,
            high_watermark: config.rx_high_watermark,
        };

        (tx, rx)
    }
}

/// CHIP's TX consumer handle: drains frames HOST enqueued.
pub struct ChipTxHandle {
    bus: Arc<Bus>,
    cache: Arc<Cache>,
    region: RingRegion,
    local_tail: u32,
    capacity: u32,
    low_watermark: u32,
    scratch: Vec<u8>,
}

impl ChipTxHandle {
    /// Consume every complete frame currently available on the TX ring
    /// (`spec.md` §4.5), delivering each payload to `sink` in FIFO order.
    /// Raises `TX_SPACE_AVAIL` once, after publishing, if free space (judged
    /// against the most recent HOST head sample) rose through
    /// [`LinkConfig::tx_low_watermark`] over the course of this call.
    ///
    /// Returns the number of frames consumed. A malformed advertised length
    /// is treated as a fatal protocol violation: publishes progress for the
    /// valid prefix, raises `INT_ERROR`, and returns
    /// [`Error::MalformedFrame`].
    pub fn consume(&mut self, mut sink: impl FnMut(&[u8])) -> Result<usize, Error> {
        let mut host_tx_head = self.bus.read(bus::HOST_TX_HEAD_PUB);
        barrier::fence_acquire();

        let initial_tail = self.local_tail;
        let mut tail = initial_tail;
        let mut consumed = 0usize;
        let mut malformed = None;
        let mut header = [0u8; 2];
        let max_payload = frame::max_payload(self.capacity);

        loop {
            if tail == host_tx_head {
                break;
            }
            let available = ring::used(host_tx_head, tail, self.capacity);
            if available < frame::LENGTH_FIELD_SIZE {
                break;
            }

            unsafe {
                self.region.read_wrapping(tail, &mut header);
            }
            let len = u16::from_le_bytes(header);
            if u32::from(len) > max_payload {
                log::error!("chip: malformed tx frame, advertised length {len}");
                malformed = Some(len);
                break;
            }

            let total = u32::from(len) + frame::LENGTH_FIELD_SIZE;
            if available < total {
                break;
            }

            let payload_offset = ring::wrap_add(tail, frame::LENGTH_FIELD_SIZE, self.capacity);
            self.scratch.clear();
            self.scratch.resize(len as usize, 0);
            unsafe {
                self.region.read_wrapping(payload_offset, &mut self.scratch);
            }
            sink(&self.scratch);

            tail = ring::wrap_add(tail, total, self.capacity);
            consumed += 1;
            host_tx_head = self.bus.read(bus::HOST_TX_HEAD_PUB);
        }

        self.bus.write(bus::TX_TAIL_PTR, tail);
        barrier::fence_sync();
        self.local_tail = tail;

        let free_before = ring::free(host_tx_head, initial_tail, self.capacity);
        let free_after = ring::free(host_tx_head, tail, self.capacity);
        if free_after >= self.low_watermark && free_before < self.low_watermark {
            self.bus.raise_interrupt(bus::INT_TX_SPACE_AVAIL);
        }

        match malformed {
            Some(len) => {
                self.bus.raise_interrupt(bus::INT_ERROR);
                Err(Error::MalformedFrame(len))
            }
            None => {
                log::trace!("chip: tx consumed {consumed} frames, tail now {tail}");
                Ok(consumed)
            }
        }
    }
}

/// CHIP's RX producer handle: enqueues frames for HOST to consume.
pub struct ChipRxHandle {
    bus: Arc<Bus>,
    cache: Arc<Cache>,
    region: RingRegion,
    local_head: u32,
    capacity: u32,
    high_watermark: u32,
}

impl ChipRxHandle {
    /// Enqueue `payload` as one frame on the RX ring (`spec.md` §4.6).
    /// Raises `RX_DATA_READY` once, after publishing, if fill (judged
    /// against the HOST tail sampled at the start of this call) rose
    /// through [`LinkConfig::rx_high_watermark`] as a result of this call.
    pub fn produce(&mut self, payload: &[u8]) -> Result<(), Error> {
        let len = payload.len();
        if len as u64 > u64::from(frame::max_payload(self.capacity)) {
            return Err(Error::TooLarge);
        }
        let total = len as u32 + frame::LENGTH_FIELD_SIZE;

        let host_rx_tail = self.bus.read(bus::HOST_RX_TAIL_PUB);
        let free = ring::free(self.local_head, host_rx_tail, self.capacity);
        if free < total {
            log::trace!("chip: rx no space, free={free} needed={total}");
            return Err(Error::NoSpace);
        }

        let header_offset = self.local_head;
        unsafe {
            self.region.write_wrapping(header_offset, &(len as u16).to_le_bytes());
        }
        let payload_offset = ring::wrap_add(header_offset, frame::LENGTH_FIELD_SIZE, self.capacity);
        unsafe {
            self.region.write_wrapping(payload_offset, payload);
        }

        barrier::fence_release();
        self.cache.clean(ring::wrap_segments(header_offset, total, self.capacity));

        let new_head = ring::wrap_add(header_offset, total, self.capacity);
        self.bus.write(bus::RX_HEAD_PTR, new_head);
        barrier::fence_sync();
        self.local_head = new_head;

        let used_before = ring::used(header_offset, host_rx_tail, self.capacity);
        let used_after = ring::used(new_head, host_rx_tail, self.capacity);
        if used_after >= self.high_watermark && used_before < self.high_watermark {
            self.bus.raise_interrupt(bus::INT_RX_DATA_READY);
        }

        log::trace!("chip: rx produced {len} bytes, head now {new_head}");
        Ok(())
    }
}
