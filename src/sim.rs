//! In-process fake peer, for tests and the `demos/host_chip_sim` binary
//! (`spec.md` §9's Design Notes call for exactly this: a way to exercise the
//! protocol "without real interrupts or real MMIO"). Reuses
//! [`bus::AtomicRegisters`] rather than a second register-file
//! implementation — the only thing test code needs beyond what production
//! already has is somewhere to put the ring backing memory, since a real
//! deployment's shared RAM doesn't exist in an ordinary process.
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::ptr::NonNull;

use crate::barrier::CoherentCache;
use crate::bus::{self, AtomicRegisters, BusRegisters};
use crate::chip::{ChipLink, ChipRxHandle, ChipTxHandle};
use crate::host::{HostIrq, HostLink, HostRxHandle, HostTxHandle};
use crate::ring::RingRegion;
use crate::LinkConfig;

/// The register file shared by both simulated sides of a link.
pub type SimBus = AtomicRegisters;

/// Heap-backed stand-in for the shared RAM a real deployment would map.
/// Both rings live here so the [`SimLink`] that owns this struct also owns
/// the only allocation either side's [`RingRegion`] points into.
pub struct SimRam {
    tx: Vec<u8>,
    rx: Vec<u8>,
}

impl SimRam {
    fn new(config: &LinkConfig) -> Self {
        SimRam {
            tx: vec![0u8; config.tx_buffer_size as usize],
            rx: vec![0u8; config.rx_buffer_size as usize],
        }
    }

    fn tx_region(&mut self, capacity: u32) -> RingRegion {
        let ptr = NonNull::new(self.tx.as_mut_ptr()).expect("non-null backing buffer");
        // Safety: `self` (and thus `tx`) outlives every region handed out
        // from it, by construction of `SimLink`.
        unsafe { RingRegion::new(ptr, capacity) }
    }

    fn rx_region(&mut self, capacity: u32) -> RingRegion {
        let ptr = NonNull::new(self.rx.as_mut_ptr()).expect("non-null backing buffer");
        unsafe { RingRegion::new(ptr, capacity) }
    }
}

/// A fully wired-up pair of link endpoints sharing one register file and one
/// block of simulated RAM. [`SimLink::init_host`]/[`SimLink::init_chip`] each
/// run the real initialization sequence from `src/host.rs`/`src/chip.rs`, so
/// tests exercise the same code path a real deployment does.
pub struct SimLink {
    bus: Arc<SimBus>,
    cache: Arc<CoherentCache>,
    ram: SimRam,
    config: LinkConfig,
}

impl SimLink {
    /// Build a fresh, not-yet-initialized link over `config`.
    pub fn new(config: LinkConfig) -> Self {
        SimLink {
            bus: Arc::new(AtomicRegisters::new()),
            cache: Arc::new(CoherentCache),
            ram: SimRam::new(&config),
            config,
        }
    }

    /// The shared register file, for tests that want to poke or inspect
    /// interrupt state directly.
    pub fn bus(&self) -> &SimBus {
        &self.bus
    }

    /// Run HOST's init sequence and return its three handles.
    pub fn init_host(&mut self) -> (HostTxHandle, HostRxHandle, HostIrq) {
        let tx_region = self.ram.tx_region(self.config.tx_buffer_size);
        let rx_region = self.ram.rx_region(self.config.rx_buffer_size);
        HostLink::init(self.bus.clone(), self.cache.clone(), tx_region, rx_region, &self.config)
    }

    /// Run CHIP's init sequence and return its two handles.
    pub fn init_chip(&mut self) -> (ChipTxHandle, ChipRxHandle) {
        let tx_region = self.ram.tx_region(self.config.tx_buffer_size);
        let rx_region = self.ram.rx_region(self.config.rx_buffer_size);
        ChipLink::init(self.bus.clone(), self.cache.clone(), tx_region, rx_region, &self.config)
    }
}
