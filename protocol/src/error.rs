//! Error types for the treasure-hunt link-layer protocol.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the frame codec, transport, and reliability engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Buffer shorter than an Ethernet header plus the 5-byte frame header.
    #[error("short frame: {len} bytes")]
    ShortFrame { len: usize },

    /// EtherType did not match the custom `0x88B5` value.
    #[error("unexpected ethertype {0:#06x}")]
    UnknownEtherType(u16),

    /// The frame's first byte was not the `0x7E` marker.
    #[error("missing frame marker")]
    MissingMarker,

    /// The computed checksum did not match the one carried on the wire.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// `length` exceeded the 127-byte maximum payload.
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// A treasure or received filename exceeded `TAM_MAX_NOME`.
    #[error("name too long: {0} bytes")]
    NameTooLong(usize),

    /// The stop-and-wait engine exhausted its retry budget.
    #[error("max retries exceeded{}", .last_nack_code.map(|c| format!(" (last nack code {c})")).unwrap_or_default())]
    MaxRetriesExceeded { last_nack_code: Option<u8> },

    /// The engine or endpoint was asked to act from a state that forbids it.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Underlying transport I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A MAC address string could not be parsed.
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
}
