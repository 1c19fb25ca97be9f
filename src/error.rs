//! Protocol error taxonomy.
//!
//! Kept as a plain enum with hand-rolled `Display`/`Debug` rather than a
//! derive-macro error crate, just `core::fmt`.

/// Errors produced by the protocol layer. Nothing here ever unwinds; every
/// fallible operation is total and returns one of these.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The caller's payload cannot fit the ring no matter how empty it is.
    /// Fail fast, no state change: this is the caller's bug.
    TooLarge,
    /// Transient back-pressure: the ring doesn't have room right now. Retry
    /// later, optionally gated on a `TX_SPACE_AVAIL` signal.
    NoSpace,
    /// The peer advertised a frame length that can't fit the ring. A
    /// protocol violation; carries the offending advertised length for
    /// diagnostics. Recovery requires re-initializing the link.
    MalformedFrame(u16),
    /// The `ERROR` interrupt bit was observed. Ring state is untouched.
    LinkError,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::TooLarge => write!(f, "packet too large for the ring"),
            Error::NoSpace => write!(f, "not enough space in the ring"),
            Error::MalformedFrame(len) => {
                write!(f, "malformed frame: advertised length {len} exceeds ring capacity")
            }
            Error::LinkError => write!(f, "chip reported a link error"),
        }
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Error({self})")
    }
}

impl core::error::Error for Error {}
