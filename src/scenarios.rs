//! Boundary-scenario tests (small packet, wrap straddling the header,
//! wrap straddling the length field itself, back-pressure, oversize
//! rejection, watermark rising edge). One test per scenario in `spec.md`
//! §8's "Boundary scenarios" list, exercised through the public handle API
//! against [`crate::sim`] rather than by poking ring bytes directly — the
//! byte-level header/wrap mechanics already have direct unit coverage in
//! `src/ring.rs` and `src/frame.rs`.
use alloc::vec::Vec;

use crate::bus::{self, BusRegisters};
use crate::sim::SimLink;
use crate::{Error, LinkConfig};

/// S1 — single small packet, no wrap.
#[test]
fn single_small_packet_no_wrap() {
    let mut sim = SimLink::new(LinkConfig::default());
    let (mut host_tx, _host_rx, _irq) = sim.init_host();
    let (mut chip_tx, _chip_rx) = sim.init_chip();

    host_tx.send_packet(&[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
    assert_eq!(sim.bus().read(bus::HOST_TX_HEAD_PUB), 6);

    let mut seen = Vec::new();
    chip_tx.consume(|p| seen.push(p.to_vec())).unwrap();
    assert_eq!(seen, alloc::vec![alloc::vec![0xAA, 0xBB, 0xCC, 0xDD]]);
    assert_eq!(sim.bus().read(bus::TX_TAIL_PTR), 6);
}

/// Advance both sides' TX indices to `target` by sending and immediately
/// consuming one filler frame of the exact size needed, so later sends in a
/// test land at a chosen offset without reaching into ring internals.
fn advance_tx_to(sim: &mut SimLink, host_tx: &mut crate::HostTxHandle, chip_tx: &mut crate::ChipTxHandle, target: u32) {
    assert!(target >= crate::frame::LENGTH_FIELD_SIZE);
    let payload_len = (target - crate::frame::LENGTH_FIELD_SIZE) as usize;
    host_tx.send_packet(&alloc::vec![0u8; payload_len]).unwrap();
    chip_tx.consume(|_| {}).unwrap();
    assert_eq!(sim.bus().read(bus::TX_TAIL_PTR), target);
}

/// S2 — a frame straddling the wrap (header fully before the boundary).
#[test]
fn frame_straddles_wrap_boundary() {
    let mut sim = SimLink::new(LinkConfig::default());
    let (mut host_tx, _host_rx, _irq) = sim.init_host();
    let (mut chip_tx, _chip_rx) = sim.init_chip();

    advance_tx_to(&mut sim, &mut host_tx, &mut chip_tx, 4094);

    let payload = [1u8, 2, 3, 4, 5, 6, 7, 8];
    host_tx.send_packet(&payload).unwrap();
    // 4094 + 10 wraps once around the 4096-byte ring.
    assert_eq!(sim.bus().read(bus::HOST_TX_HEAD_PUB), 8);

    let mut seen = Vec::new();
    chip_tx.consume(|p| seen.push(p.to_vec())).unwrap();
    assert_eq!(seen, alloc::vec![payload.to_vec()]);
}

/// S3 — the 2-byte length field itself straddles the wrap boundary.
#[test]
fn length_field_straddles_wrap_boundary() {
    let mut sim = SimLink::new(LinkConfig::default());
    let (mut host_tx, _host_rx, _irq) = sim.init_host();
    let (mut chip_tx, _chip_rx) = sim.init_chip();

    advance_tx_to(&mut sim, &mut host_tx, &mut chip_tx, 4095);

    let payload = [1u8, 2, 3, 4, 5, 6, 7, 8];
    host_tx.send_packet(&payload).unwrap();

    let mut seen = Vec::new();
    chip_tx.consume(|p| seen.push(p.to_vec())).unwrap();
    assert_eq!(seen, alloc::vec![payload.to_vec()]);
}

/// S4 — back-pressure: a send that doesn't fit returns `NoSpace`, and
/// succeeds once the peer has consumed enough to make room.
#[test]
fn back_pressure_then_retry_succeeds() {
    let config = LinkConfig::default();
    let mut sim = SimLink::new(config);
    let (mut host_tx, _host_rx, _irq) = sim.init_host();
    let (mut chip_tx, _chip_rx) = sim.init_chip();

    // Fill the ring with max-size frames until less than 3 bytes remain free.
    let max_payload = config.max_tx_payload();
    loop {
        match host_tx.send_packet(&alloc::vec![0u8; max_payload as usize]) {
            Ok(()) => {}
            Err(Error::NoSpace) => break,
            Err(other) => panic!("unexpected error while filling: {other}"),
        }
    }

    assert_eq!(host_tx.send_packet(&[0u8]), Err(Error::NoSpace));

    let mut consumed = 0;
    chip_tx.consume(|_| consumed += 1).unwrap();
    assert!(consumed >= 1);

    host_tx.send_packet(&[0u8]).unwrap();
}

/// S5 — a payload too large for the ring, even empty, is rejected.
#[test]
fn too_large_for_ring_even_when_empty() {
    let config = LinkConfig::default();
    let mut sim = SimLink::new(config);
    let (mut host_tx, _host_rx, _irq) = sim.init_host();

    let oversized = config.tx_buffer_size as usize - 1;
    assert_eq!(host_tx.send_packet(&alloc::vec![0u8; oversized]), Err(Error::TooLarge));
}

/// S6 — `RX_DATA_READY` raises once on the rising edge through the
/// watermark, not again until it has fallen back below and risen again.
#[test]
fn watermark_interrupt_rising_edge_only() {
    let mut config = LinkConfig::default();
    config.rx_buffer_size = 4096;
    config.rx_high_watermark = 1024;
    let mut sim = SimLink::new(config);
    let (_host_tx, mut host_rx, _irq) = sim.init_host();
    let (_chip_tx, mut chip_rx) = sim.init_chip();

    // Frames totaling 1023 used bytes: a 1021-byte payload (1023 with header).
    chip_rx.produce(&alloc::vec![0u8; 1021]).unwrap();
    assert_eq!(sim.bus().read(bus::INT_STATUS) & bus::INT_RX_DATA_READY, 0);

    // One more byte of payload crosses the watermark.
    chip_rx.produce(&[0u8]).unwrap();
    assert_eq!(sim.bus().read(bus::INT_STATUS) & bus::INT_RX_DATA_READY, bus::INT_RX_DATA_READY);

    sim.bus().write(bus::INT_CLEAR, bus::INT_RX_DATA_READY);
    host_rx.drain_rx(|_| {}).unwrap();

    // Crossing again after a full drain raises a second time.
    chip_rx.produce(&alloc::vec![0u8; 1021]).unwrap();
    chip_rx.produce(&[0u8]).unwrap();
    assert_eq!(sim.bus().read(bus::INT_STATUS) & bus::INT_RX_DATA_READY, bus::INT_RX_DATA_READY);
}
