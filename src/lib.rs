#![no_std]
//! Host/chip shared-memory packet transport.
//!
//! Two independent execution domains — a host CPU ("HOST") and a peripheral
//! compute element ("CHIP") — exchange packets over two single-producer/
//! single-consumer ring buffers in shared RAM, coordinated by a small
//! register file and an interrupt mailbox on the CHIP side. This crate
//! implements both sides of that protocol plus an in-process fake bus/RAM
//! (see [`sim`]) for driving the two against each other without real
//! hardware.
//!
//! The ring-buffer framing, index-publication ordering, and barrier/cache
//! contract are the only things this crate is concerned with. What a
//! delivered RX payload *means*, where a TX payload comes from, and how the
//! CHIP's internal compute behaves are all left to the caller.
extern crate alloc;

pub mod barrier;
pub mod bus;
pub mod chip;
pub mod config;
pub mod error;
pub mod frame;
pub mod host;
pub mod ring;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

#[cfg(test)]
mod scenarios;

pub use bus::BusRegisters;
pub use chip::{ChipLink, ChipRxHandle, ChipTxHandle};
pub use config::LinkConfig;
pub use error::Error;
pub use host::{HostIrq, HostLink, HostRxHandle, HostTxHandle};
pub use ring::RingRegion;
