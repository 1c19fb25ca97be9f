//! Link configuration.
//!
//! Ring sizes and watermarks are tunable per deployment but fixed for the
//! lifetime of a link (see `spec.md` §3); a plain `Copy` struct in the same
//! builder-style as `XskUmemConfig`/`XskSocketConfig`.

/// Configuration shared by both sides of a link. Both peers must agree on
/// the same values — there is no negotiation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Size in bytes of the HOST→CHIP ring.
    pub tx_buffer_size: u32,
    /// Size in bytes of the CHIP→HOST ring.
    pub rx_buffer_size: u32,
    /// CHIP raises `TX_SPACE_AVAIL` when free TX space rises through this
    /// many bytes.
    pub tx_low_watermark: u32,
    /// CHIP raises `RX_DATA_READY` when RX fill rises through this many
    /// bytes.
    pub rx_high_watermark: u32,
}

impl Default for LinkConfig {
    /// The default profile from `spec.md` §3: 4 KiB rings, watermarks at a
    /// quarter of the buffer (matching `examples/original_source/shared.h`'s
    /// `TX_LOW_WATERMARK_THRESHOLD`/`RX_HIGH_WATERMARK_THRESHOLD`, which
    /// happen to work out to the same 1024 bytes `spec.md` hardcodes).
    fn default() -> Self {
        const TX_BUFFER_SIZE: u32 = 4096;
        const RX_BUFFER_SIZE: u32 = 4096;
        LinkConfig {
            tx_buffer_size: TX_BUFFER_SIZE,
            rx_buffer_size: RX_BUFFER_SIZE,
            tx_low_watermark: TX_BUFFER_SIZE / 4,
            rx_high_watermark: RX_BUFFER_SIZE / 4,
        }
    }
}

impl LinkConfig {
    /// Largest payload `send_packet`/`produce` can ever deliver on a ring of
    /// `capacity` bytes: `min(65535, capacity - 3)` per `spec.md` §6.
    pub fn max_payload(capacity: u32) -> u32 {
        crate::frame::max_payload(capacity)
    }

    /// Largest TX payload this configuration can ever accept.
    pub fn max_tx_payload(&self) -> u32 {
        Self::max_payload(self.tx_buffer_size)
    }

    /// Largest RX payload this configuration can ever accept.
    pub fn max_rx_payload(&self) -> u32 {
        Self::max_payload(self.rx_buffer_size)
    }
}
