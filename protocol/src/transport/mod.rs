//! Raw link-layer transport abstraction (spec.md §4.2).
//!
//! This is the seam the reliability engine is built on: it never touches
//! a socket directly, only a `Transport`. Two implementations are
//! provided — [`raw_socket::RawEthernetSocket`] for the real interface,
//! and [`loopback::LoopbackTransport`] for tests.

mod loopback;
mod raw_socket;

pub use loopback::LoopbackTransport;
pub use raw_socket::RawEthernetSocket;

use crate::core::FrameType;
use crate::error::Result;
use crate::mac::MacAddr;
use crate::seq::Seq;

/// A received frame together with the source address it arrived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub src: MacAddr,
    pub frame_type: FrameType,
    pub seq: Seq,
    pub payload: Vec<u8>,
}

/// Outcome of a non-blocking or timed `recv`.
#[derive(Debug)]
pub enum RecvOutcome {
    /// A well-formed frame for this protocol arrived.
    Frame(Received),
    /// Nothing arrived within the implementation's poll/timeout window.
    WouldBlock,
}

/// Sends and receives frames over a shared link-layer medium.
///
/// Implementations do **not** filter by source MAC (spec.md §4.2); the
/// codec's EtherType and marker checks are sufficient. Malformed frames
/// (bad EtherType, marker, or checksum) are dropped silently and
/// surfaced as `RecvOutcome::WouldBlock`, never as an error — per
/// spec.md §4.1's "drop, do not NACK" validation policy, a malformed
/// frame simply did not arrive as far as callers are concerned.
pub trait Transport {
    /// Sends one frame addressed to `dst`.
    fn send(&mut self, dst: MacAddr, frame_type: FrameType, seq: Seq, payload: &[u8]) -> Result<()>;

    /// Attempts to receive the next frame, blocking for at most the
    /// implementation's configured poll interval or read timeout.
    fn recv(&mut self) -> Result<RecvOutcome>;
}
