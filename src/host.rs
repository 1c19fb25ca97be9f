//! HOST-side driver: `spec.md` §4.2–§4.4 and §4.9.
//!
//! The application context (calls [`HostTxHandle::send_packet`]) and the
//! IRQ context (calls [`HostRxHandle::drain_rx`] via [`HostIrq::dispatch`])
//! share no index (`spec.md` §5): splitting the link into separate handle
//! types at [`HostLink::init`] is the type-level enforcement `spec.md` §9
//! asks for, the same shape as `XskRingProd`/`XskRingCons` and the
//! `WriteTx`/`ReadRx` proxy handles in `src/xsk/user.rs`.
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::barrier::{self, ByteRanges, CacheOps};
use crate::bus::{self, BusRegisters};
use crate::error::Error;
use crate::frame;
use crate::ring::{self, RingRegion};
use crate::LinkConfig;

type Bus = dyn BusRegisters + Send + Sync;
type Cache = dyn CacheOps + Send + Sync;

/// Entry point for bringing up the HOST side of a link: performs `spec.md`
/// §4.9's initialization sequence and hands back the three handles the rest
/// of the HOST driver is built from.
pub struct HostLink;

impl HostLink {
    /// Initialize the HOST side of a link and split it into its
    /// single-writer handles.
    ///
    /// `tx_region`/`rx_region` must describe the same backing memory the
    /// CHIP side was (or will be) given — this crate does not set up shared
    /// memory itself, only the protocol running over it.
    pub fn init(
        bus: Arc<Bus>,
        cache: Arc<Cache>,
        tx_region: RingRegion,
        rx_region: RingRegion,
        config: &LinkConfig,
    ) -> (HostTxHandle, HostRxHandle, HostIrq) {
        // Clear any interrupt state left over from a previous session.
        bus.write(bus::INT_CLEAR, 0xFFFF_FFFF);

        bus.write(bus::HOST_TX_HEAD_PUB, 0);
        bus.write(bus::HOST_RX_TAIL_PUB, 0);
        barrier::fence_sync();

        bus.write(bus::INT_ENABLE, bus::INT_ALL);
        log::debug!("host: link initialized, tx={} rx={}", config.tx_buffer_size, config.rx_buffer_size);

        let tx = HostTxHandle {
            bus: bus.clone(),
            cache: cache.clone(),
            region: tx_region,
            local_head: 0,
            capacity: config.tx_buffer_size,
        };
        let rx = HostRxHandle {
            bus: bus.clone(),
            cache,
            region: rx_region,
            local_tail: 0,
            capacity: config.rx_buffer_size,
            scratch: Vec::new(),
        };
        let irq = HostIrq { bus };

        (tx, rx, irq)
    }
}

/// HOST's TX producer handle. Reachable only from the application context;
/// owns `host_tx_head` exclusively.
pub struct HostTxHandle {
    bus: Arc<Bus>,
    cache: Arc<Cache>,
    region: RingRegion,
    local_head: u32,
    capacity: u32,
}

impl HostTxHandle {
    /// Enqueue `data` as one frame onto the TX ring (`spec.md` §4.2).
    ///
    /// Non-blocking: returns [`Error::NoSpace`] immediately if the ring
    /// can't fit the frame right now, with no state change and no partial
    /// write.
    pub fn send_packet(&mut self, data: &[u8]) -> Result<(), Error> {
        let len = data.len();
        if len as u64 > u64::from(frame::max_payload(self.capacity)) {
            return Err(Error::TooLarge);
        }
        let total = len as u32 + frame::LENGTH_FIELD_SIZE;

        let chip_tx_tail = self.bus.read(bus::TX_TAIL_PTR);
        let free = ring::free(self.local_head, chip_tx_tail, self.capacity);
        if free < total {
            log::trace!("host: tx no space, free={free} needed={total}");
            return Err(Error::NoSpace);
        }

        let header_offset = self.local_head;
        // Safety: we are the sole writer of the TX ring, and `free` above
        // proved this range is not currently owned by the consumer.
        unsafe {
            self.region.write_wrapping(header_offset, &(len as u16).to_le_bytes());
        }
        let payload_offset = ring::wrap_add(header_offset, frame::LENGTH_FIELD_SIZE, self.capacity);
        unsafe {
            self.region.write_wrapping(payload_offset, data);
        }

        barrier::fence_release();
        self.cache.clean(ring::wrap_segments(header_offset, total, self.capacity));

        let new_head = ring::wrap_add(header_offset, total, self.capacity);
        self.bus.write(bus::HOST_TX_HEAD_PUB, new_head);
        barrier::fence_sync();

        self.local_head = new_head;
        log::trace!("host: tx sent {len} bytes, head now {new_head}");
        Ok(())
    }
}

/// HOST's RX consumer handle. Reachable only from the IRQ context; owns
/// `host_rx_tail` exclusively.
pub struct HostRxHandle {
    bus: Arc<Bus>,
    cache: Arc<Cache>,
    region: RingRegion,
    local_tail: u32,
    capacity: u32,
    scratch: Vec<u8>,
}

impl HostRxHandle {
    /// Drain every complete frame currently available on the RX ring
    /// (`spec.md` §4.3), delivering each payload to `on_rx` in FIFO order.
    ///
    /// Stops at the first partial header or partial frame without
    /// advancing past it — the CHIP hasn't finished publishing it yet.
    /// Returns the number of frames delivered. On a malformed advertised
    /// length, publishes the tail for whatever was validly consumed before
    /// the bad frame (preserving the already-delivered prefix) and returns
    /// [`Error::MalformedFrame`].
    pub fn drain_rx(&mut self, mut on_rx: impl FnMut(&[u8])) -> Result<usize, Error> {
        let mut chip_rx_head = self.bus.read(bus::RX_HEAD_PTR);
        self.cache.invalidate(ByteRanges::one(0, self.capacity));
        barrier::fence_acquire();

        let mut tail = self.local_tail;
        let mut delivered = 0usize;
        let mut malformed = None;
        let mut header = [0u8; 2];
        let max_payload = frame::max_payload(self.capacity);

        loop {
            if tail == chip_rx_head {
                break;
            }
            let available = ring::used(chip_rx_head, tail, self.capacity);
            if available < frame::LENGTH_FIELD_SIZE {
                break;
            }

            unsafe {
                self.region.read_wrapping(tail, &mut header);
            }
            let len = u16::from_le_bytes(header);
            if u32::from(len) > max_payload {
                log::error!("host: malformed rx frame, advertised length {len}");
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
            on_rx(&self.scratch);

            tail = ring::wrap_add(tail, total, self.capacity);
            delivered += 1;
            chip_rx_head = self.bus.read(bus::RX_HEAD_PTR);
        }

        barrier::fence_release();
        self.bus.write(bus::HOST_RX_TAIL_PUB, tail);
        barrier::fence_sync();
        self.local_tail = tail;

        match malformed {
            Some(len) => Err(Error::MalformedFrame(len)),
            None => {
                log::trace!("host: rx drained {delivered} frames, tail now {tail}");
                Ok(delivered)
            }
        }
    }
}

/// HOST's interrupt dispatcher (`spec.md` §4.4). Holds only a bus handle —
/// it never touches ring state directly, delegating RX draining to whatever
/// [`HostRxHandle`] the caller passes in.
pub struct HostIrq {
    bus: Arc<Bus>,
}

impl HostIrq {
    /// Service pending, enabled interrupts once. Clears each bit before
    /// invoking its action, per `spec.md` §4.4, so a coincident re-assertion
    /// isn't lost. Never fails itself — per `spec.md` §7, all paths here are
    /// total; errors surface only through `on_error`.
    ///
    /// Returns the number of RX frames delivered this call.
    pub fn dispatch(
        &mut self,
        rx: &mut HostRxHandle,
        mut on_rx: impl FnMut(&[u8]),
        mut on_tx_space: impl FnMut(),
        mut on_error: impl FnMut(Error),
    ) -> usize {
        let status = self.bus.read(bus::INT_STATUS);
        let enabled = self.bus.read(bus::INT_ENABLE);
        let pending = status & enabled;
        let mut delivered = 0;

        if pending & bus::INT_RX_DATA_READY != 0 {
            self.bus.write(bus::INT_CLEAR, bus::INT_RX_DATA_READY);
            match rx.drain_rx(&mut on_rx) {
                Ok(n) => delivered = n,
                Err(err) => on_error(err),
            }
        }

        if pending & bus::INT_TX_SPACE_AVAIL != 0 {
            self.bus.write(bus::INT_CLEAR, bus::INT_TX_SPACE_AVAIL);
            on_tx_space();
        }

        if pending & bus::INT_ERROR != 0 {
            self.bus.write(bus::INT_CLEAR, bus::INT_ERROR);
            on_error(Error::LinkError);
        }

        delivered
    }
}
