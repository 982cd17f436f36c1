//! File-transfer protocol (spec.md §4.6): SIZE → METADATA → DATA* → EOF,
//! each phase its own stop-and-wait exchange.

use std::io::Read;

use log::info;

use crate::core::{FrameType, MAX_PAYLOAD_SIZE};
use crate::error::{Error, Result};
use crate::mac::MacAddr;
use crate::reliable::{send_and_wait, AckSource, StopWaitConfig};
use crate::seq::Seq;
use crate::transport::Transport;
use crate::collaborators::FileKind;

/// `TAM_MAX_NOME`: maximum filename length including the terminating NUL.
pub const MAX_NAME_LEN: usize = 63;

/// Encodes a file size as 8 little-endian bytes, fixing the
/// host-endianness portability bug spec.md §6/§9 flag in the reference
/// (`memcpy(dados_tamanho, &tamanho_arquivo, sizeof(size_t))`).
pub fn encode_size(size: u64) -> [u8; 8] {
    size.to_le_bytes()
}

/// Decodes an 8-little-endian-byte size payload.
pub fn decode_size(payload: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = payload
        .try_into()
        .map_err(|_| Error::InvalidState("SIZE payload must be 8 bytes"))?;
    Ok(u64::from_le_bytes(bytes))
}

/// Encodes a filename as a NUL-terminated C string, rejecting names that
/// (including the NUL) would exceed `MAX_NAME_LEN`.
pub fn encode_name(name: &str) -> Result<Vec<u8>> {
    if name.len() + 1 > MAX_NAME_LEN {
        return Err(Error::NameTooLong(name.len()));
    }
    let mut buf = Vec::with_capacity(name.len() + 1);
    buf.extend_from_slice(name.as_bytes());
    buf.push(0);
    Ok(buf)
}

/// Decodes a NUL-terminated filename payload.
pub fn decode_name(payload: &[u8]) -> Result<String> {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    String::from_utf8(payload[..end].to_vec()).map_err(|_| Error::InvalidState("filename is not valid UTF-8"))
}

/// Drives the server side of a full transfer: SIZE, METADATA, chunked
/// DATA, then END_OF_FILE, each step independently ACKed. Surfaces
/// failure (per spec.md §4.6 "Atomicity") the moment any phase exceeds
/// its retry budget.
pub fn send_file<T: Transport, A: AckSource>(
    transport: &mut T,
    ack_source: &A,
    dst: MacAddr,
    next_seq: &mut Seq,
    kind: FileKind,
    name: &str,
    size: u64,
    reader: &mut dyn Read,
    cfg: &StopWaitConfig,
) -> Result<()> {
    let mut send_step = |transport: &mut T, next_seq: &mut Seq, frame_type: FrameType, payload: &[u8]| -> Result<()> {
        let seq = *next_seq;
        send_and_wait(transport, ack_source, dst, frame_type, seq, payload, cfg)?;
        *next_seq = seq.next();
        Ok(())
    };

    send_step(transport, next_seq, FrameType::Size, &encode_size(size))?;
    info!("SIZE={size} acked, sending metadata for {name:?}");

    send_step(transport, next_seq, kind.to_frame_type(), &encode_name(name)?)?;

    let mut remaining = size;
    let mut chunk = vec![0u8; MAX_PAYLOAD_SIZE];
    while remaining > 0 {
        let want = remaining.min(MAX_PAYLOAD_SIZE as u64) as usize;
        reader.read_exact(&mut chunk[..want])?;
        send_step(transport, next_seq, FrameType::Data, &chunk[..want])?;
        remaining -= want as u64;
    }

    send_step(transport, next_seq, FrameType::EndOfFile, &[])?;
    info!("transfer of {name:?} ({size} bytes) complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_round_trips_little_endian() {
        let encoded = encode_size(0x0102_0304_0506_0708);
        assert_eq!(encoded, [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(decode_size(&encoded).unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn name_round_trips_with_nul_terminator() {
        let encoded = encode_name("3.txt").unwrap();
        assert_eq!(encoded, b"3.txt\0");
        assert_eq!(decode_name(&encoded).unwrap(), "3.txt");
    }

    #[test]
    fn rejects_oversized_name() {
        let long = "x".repeat(MAX_NAME_LEN);
        assert!(matches!(encode_name(&long), Err(Error::NameTooLong(_))));
    }

    #[test]
    fn file_kind_defaults_unknown_extensions_to_text() {
        assert_eq!(FileKind::from_extension("3.mp4"), FileKind::Video);
        assert_eq!(FileKind::from_extension("3.JPG"), FileKind::Image);
        assert_eq!(FileKind::from_extension("3"), FileKind::Text);
        assert_eq!(FileKind::from_extension("3.dat"), FileKind::Text);
    }
}
