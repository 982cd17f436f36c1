//! Core wire-format data structures: the frame codec and its checksum.

mod checksum;
mod frame;

pub use checksum::{compute, verify};
pub use frame::{
    Frame, FrameType, ErrorCode, ETHERNET_HEADER_SIZE, ETHER_TYPE, FRAME_HEADER_SIZE, MARKER,
    MAX_PAYLOAD_SIZE,
};
