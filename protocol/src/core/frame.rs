//! Frame definition and byte-exact serialization for the treasure-hunt
//! link-layer protocol.
//!
//! # Wire format
//!
//! ```text
//! [marker:1 = 0x7E]
//! [length:1]   -- low 7 bits carry the payload length, 0..127
//! [seq:1]      -- low 5 bits carry the sequence number, 0..31
//! [type:1]     -- low 4 bits carry the frame type
//! [checksum:1]
//! [payload: length bytes]
//! ```
//!
//! This mirrors `original_source/treasure_protocol.c:enviar_pacote`: three
//! *separate* header bytes, one field per byte, not bit-packed, despite
//! spec.md's ASCII diagram suggesting otherwise. Preserving this layout is
//! required for wire compatibility (see `SPEC_FULL.md` §4.1/§6).

use super::checksum;
use crate::error::{Error, Result};
use crate::seq::Seq;

/// Frame marker, always the first byte of the link-layer payload.
pub const MARKER: u8 = 0x7E;

/// Custom EtherType carried by every frame of this protocol.
pub const ETHER_TYPE: u16 = 0x88B5;

/// `dst_mac(6) + src_mac(6) + ethertype(2)`.
pub const ETHERNET_HEADER_SIZE: usize = 14;

/// `marker + length + seq + type + checksum`.
pub const FRAME_HEADER_SIZE: usize = 5;

/// Maximum payload length (`length` is a 7-bit field).
pub const MAX_PAYLOAD_SIZE: usize = 127;

/// Four-bit frame type taxonomy (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Ack = 0,
    Nack = 1,
    OkAck = 2,
    Size = 4,
    Data = 5,
    Text = 6,
    Video = 7,
    Image = 8,
    EndOfFile = 9,
    MoveRight = 10,
    MoveUp = 11,
    MoveDown = 12,
    MoveLeft = 13,
    Error = 15,
}

impl FrameType {
    /// Recovers a `FrameType` from the low 4 bits of a wire byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        use FrameType::*;
        Some(match value & 0x0F {
            0 => Ack,
            1 => Nack,
            2 => OkAck,
            4 => Size,
            5 => Data,
            6 => Text,
            7 => Video,
            8 => Image,
            9 => EndOfFile,
            10 => MoveRight,
            11 => MoveUp,
            12 => MoveDown,
            13 => MoveLeft,
            15 => Error,
            _ => return None,
        })
    }

    /// True if this is a response to a prior send, rather than a fresh
    /// request that the receiver must act on and acknowledge.
    pub fn is_ack_or_nack(self) -> bool {
        matches!(self, FrameType::Ack | FrameType::Nack)
    }
}

/// One-byte error codes carried as the payload of `NACK`/`ERROR` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    NoPermission = 0,
    InsufficientSpace = 1,
}

impl ErrorCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ErrorCode::NoPermission),
            1 => Some(ErrorCode::InsufficientSpace),
            _ => None,
        }
    }
}

/// A decoded or to-be-encoded link-layer frame, excluding the Ethernet
/// addressing (that lives at the transport layer, §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub seq: Seq,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Builds a frame, rejecting payloads over `MAX_PAYLOAD_SIZE`.
    pub fn new(frame_type: FrameType, seq: Seq, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge(payload.len()));
        }
        Ok(Frame { frame_type, seq, payload })
    }

    /// Serializes this frame into its on-wire byte representation
    /// (marker through payload; does not include the Ethernet header).
    pub fn encode(&self) -> Vec<u8> {
        let length_byte = (self.payload.len() as u8) & 0x7F;
        let seq_byte = self.seq.get() & 0x1F;
        let type_byte = (self.frame_type as u8) & 0x0F;

        let sum = checksum::compute(&[length_byte, seq_byte, type_byte], &self.payload);

        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + self.payload.len());
        buf.push(MARKER);
        buf.push(length_byte);
        buf.push(seq_byte);
        buf.push(type_byte);
        buf.push(sum);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parses a frame from its on-wire byte representation (marker
    /// through payload). Rejects short buffers, a missing marker, and
    /// checksum mismatches per spec.md §4.1's "drop, do not NACK" policy.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err(Error::ShortFrame { len: buf.len() });
        }
        if buf[0] != MARKER {
            return Err(Error::MissingMarker);
        }

        let length_byte = buf[1];
        let seq_byte = buf[2];
        let type_byte = buf[3];
        let checksum_byte = buf[4];

        let length = (length_byte & 0x7F) as usize;
        if buf.len() < FRAME_HEADER_SIZE + length {
            return Err(Error::ShortFrame { len: buf.len() });
        }
        let payload = &buf[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + length];

        if !checksum::verify(&[length_byte, seq_byte, type_byte], payload, checksum_byte) {
            return Err(Error::ChecksumMismatch);
        }

        let frame_type = FrameType::from_u8(type_byte).ok_or(Error::MissingMarker)?;
        let seq = Seq::new(seq_byte & 0x1F);

        Ok(Frame { frame_type, seq, payload: payload.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_data_frame() {
        let frame = Frame::new(FrameType::Data, Seq::new(7), b"treasure".to_vec()).unwrap();
        let encoded = frame.encode();
        let decoded = Frame::decode(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn round_trips_an_empty_ack() {
        let frame = Frame::new(FrameType::Ack, Seq::new(31), Vec::new()).unwrap();
        let encoded = frame.encode();
        assert_eq!(encoded.len(), FRAME_HEADER_SIZE);
        let decoded = Frame::decode(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn rejects_oversized_payload() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];
        assert!(matches!(
            Frame::new(FrameType::Data, Seq::new(0), payload),
            Err(Error::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(matches!(Frame::decode(&[MARKER, 0, 0]), Err(Error::ShortFrame { .. })));
    }

    #[test]
    fn rejects_missing_marker() {
        let mut encoded = Frame::new(FrameType::Ack, Seq::new(1), Vec::new()).unwrap().encode();
        encoded[0] = 0x00;
        assert!(matches!(Frame::decode(&encoded), Err(Error::MissingMarker)));
    }

    #[test]
    fn rejects_corrupted_payload() {
        let mut encoded = Frame::new(FrameType::Data, Seq::new(2), vec![1, 2, 3]).unwrap().encode();
        let last = encoded.len() - 1;
        encoded[last] ^= 0x01;
        assert!(matches!(Frame::decode(&encoded), Err(Error::ChecksumMismatch)));
    }

    proptest::proptest! {
        #[test]
        fn codec_round_trip(
            seq in 0u8..32,
            type_tag in proptest::prelude::any::<u8>(),
            payload in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..128),
        ) {
            // Restrict to a known frame type; unknown types are a separate property.
            let types = [
                FrameType::Ack, FrameType::Nack, FrameType::OkAck, FrameType::Size,
                FrameType::Data, FrameType::Text, FrameType::Video, FrameType::Image,
                FrameType::EndOfFile, FrameType::MoveRight, FrameType::MoveUp,
                FrameType::MoveDown, FrameType::MoveLeft, FrameType::Error,
            ];
            let frame_type = types[(type_tag as usize) % types.len()];
            let frame = Frame::new(frame_type, Seq::new(seq), payload).unwrap();
            let encoded = frame.encode();
            let decoded = Frame::decode(&encoded).unwrap();
            proptest::prop_assert_eq!(decoded, frame);
        }
    }
}
