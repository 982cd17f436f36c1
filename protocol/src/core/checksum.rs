//! Wire checksum for the treasure-hunt frame format.
//!
//! The checksum is an 8-bit sum over the three packed header bytes
//! (length, seq, type — not the marker, not the checksum byte itself)
//! followed by the payload, matching
//! `original_source/treasure_protocol.c:calcula_checksum`. Addition is
//! carried in a wider accumulator and truncated to the low 8 bits.
//!
//! # Example
//!
//! ```
//! use protocol::core::checksum;
//!
//! let header = [4u8, 0, 5];
//! let payload = b"data";
//! let sum = checksum::compute(&header, payload);
//! assert!(checksum::verify(&header, payload, sum));
//! ```

/// Computes the 8-bit wrapping-sum checksum over `header` and `payload`.
pub fn compute(header: &[u8; 3], payload: &[u8]) -> u8 {
    let mut acc: u16 = 0;
    for &b in header.iter().chain(payload.iter()) {
        acc = acc.wrapping_add(b as u16);
    }
    (acc & 0xFF) as u8
}

/// Recomputes the checksum and compares it against `expected`.
pub fn verify(header: &[u8; 3], payload: &[u8], expected: u8) -> bool {
    compute(header, payload) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_header_and_payload() {
        let header = [4u8, 0, 5];
        let payload = [1u8, 2, 3];
        // 4 + 0 + 5 + 1 + 2 + 3 = 15
        assert_eq!(compute(&header, &payload), 15);
    }

    #[test]
    fn wraps_on_overflow() {
        let header = [0xFFu8, 0xFF, 0xFF];
        let payload = [0xFFu8];
        // sum = 1020 -> low byte = 252 (0xFC)
        assert_eq!(compute(&header, &payload), 0xFC);
    }

    #[test]
    fn verify_rejects_corrupted_payload() {
        let header = [4u8, 0, 5];
        let payload = [1u8, 2, 3, 4];
        let sum = compute(&header, &payload);

        let mut corrupted = payload;
        corrupted[2] ^= 0x01;
        assert!(!verify(&header, &corrupted, sum));
    }

    #[test]
    fn verify_rejects_corrupted_header() {
        let header = [4u8, 0, 5];
        let payload = [1u8, 2, 3, 4];
        let sum = compute(&header, &payload);
        assert!(!verify(&[4, 1, 5], &payload, sum));
    }

    proptest::proptest! {
        #[test]
        fn compute_then_verify_always_agrees(
            h0 in 0u8..=127, h1 in 0u8..=31, h2 in 0u8..=15,
            payload in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..128),
        ) {
            let header = [h0, h1, h2];
            let sum = compute(&header, &payload);
            proptest::prop_assert!(verify(&header, &payload, sum));
        }
    }
}
