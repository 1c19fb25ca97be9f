//! Runs a simulated HOST/CHIP pair, in-process, over [`shmlink::sim`].
//!
//! Reproduces the demonstration loop in
//! `examples/original_source/host.c`'s `host_main_loop`/`main`: send a
//! couple of fixed packets, then run a fixed number of cycles in which the
//! HOST services interrupts and periodically retries a send, while the CHIP
//! drains TX and randomly generates RX traffic — the same structure as
//! `chip_emulator_run_cycle`, translated from direct register pokes into
//! calls against this crate's handle types.
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shmlink::sim::SimLink;
use shmlink::{Error, LinkConfig};

#[derive(Parser)]
#[command(about = "In-process HOST/CHIP shared-memory link simulator")]
struct Args {
    /// Number of simulation cycles to run.
    #[arg(long, default_value_t = 50)]
    cycles: u32,
    /// Send a retry packet every this many cycles (0 disables retries).
    #[arg(long, default_value_t = 10)]
    retry_every: u32,
    /// Chance (0-100) per cycle that the CHIP generates an RX packet.
    #[arg(long, default_value_t = 50)]
    rx_chance_pct: u8,
    /// Seed for the CHIP's RX traffic generator, for reproducible runs.
    #[arg(long, default_value_t = 0x5eed_cafe)]
    seed: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = LinkConfig::default();
    let mut sim = SimLink::new(config);
    let (mut host_tx, mut host_rx, mut host_irq) = sim.init_host();
    let (mut chip_tx, mut chip_rx) = sim.init_chip();

    let mut rng = StdRng::seed_from_u64(args.seed);

    send_or_log(&mut host_tx, &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x01, 0x02, 0x03, 0x04]);
    send_or_log(&mut host_tx, &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0x00, 0xA0, 0xB0]);

    log::info!("simulation start: {} cycles, seed {:#x}", args.cycles, args.seed);

    for cycle in 0..args.cycles {
        log::debug!("cycle {cycle}");

        let delivered = host_irq.dispatch(
            &mut host_rx,
            |payload| log::info!("host rx: {} bytes", payload.len()),
            || log::info!("host: tx space available"),
            |err| log::warn!("host: link error: {err}"),
        );
        if delivered > 0 {
            log::debug!("host delivered {delivered} frames this cycle");
        }

        match chip_tx.consume(|payload| log::debug!("chip consumed {} bytes", payload.len())) {
            Ok(_) => {}
            Err(err) => log::warn!("chip: tx consume failed: {err}"),
        }

        if rng.gen_range(0u32..100) < u32::from(args.rx_chance_pct) {
            let len = rng.gen_range(10usize..110);
            let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            match chip_rx.produce(&payload) {
                Ok(()) => {}
                Err(Error::NoSpace) => log::debug!("chip: rx ring full, dropping generated packet"),
                Err(err) => log::warn!("chip: rx produce failed: {err}"),
            }
        }

        if args.retry_every != 0 && cycle % args.retry_every == 0 {
            let packet: Vec<u8> = (0..20u8).map(|i| 0xDAu8.wrapping_add(i)).collect();
            send_or_log(&mut host_tx, &packet);
        }
    }

    log::info!("simulation end");
}

fn send_or_log(tx: &mut shmlink::HostTxHandle, data: &[u8]) {
    match tx.send_packet(data) {
        Ok(()) => log::info!("host tx: sent {} bytes", data.len()),
        Err(Error::NoSpace) => log::debug!("host: tx ring full, deferring {} byte packet", data.len()),
        Err(err) => log::warn!("host: tx send failed: {err}"),
    }
}
