//! CRC-32/ISO-HDLC (the zlib/PNG/ZIP variant).
//!
//! The register is kept in its raw form between calls so callers can feed
//! non-contiguous byte ranges without building new buffers. Only
//! [`finalize`] applies the output XOR.

use crate::matrix::BitMatrix;
use crate::types::Checksum;

/// Reflected form of polynomial 0x04C11DB7.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Register value before the first byte is processed.
pub const INITIAL_STATE: u32 = 0xFFFF_FFFF;

const FINAL_XOR: u32 = 0xFFFF_FFFF;

/// Per-byte lookup table, evaluated at compile time.
pub static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Advance the register by one byte.
#[inline]
pub fn checksum_continue(state: u32, byte: u8) -> u32 {
    (state >> 8) ^ TABLE[((state ^ byte as u32) & 0xFF) as usize]
}

/// Advance the register over `bytes`, left to right.
pub fn update(state: u32, bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(state, |state, &byte| checksum_continue(state, byte))
}

pub fn finalize(state: u32) -> Checksum {
    Checksum::new(state ^ FINAL_XOR)
}

pub fn checksum(bytes: &[u8]) -> Checksum {
    finalize(update(INITIAL_STATE, bytes))
}

/// Linear map advancing a raw register through `count` zero bytes.
///
/// With init and output XOR stripped away, feeding a zero byte is linear over
/// GF(2): `Z(s) = (s >> 8) ^ TABLE[s & 0xFF]`. Feeding a little-endian word
/// `w` from register `s` equals `Z^4(s ^ w)`, which is what the patch solver
/// builds on. Powers are taken by repeated squaring so the cost is
/// logarithmic in `count`.
pub fn zero_shift_operator(count: u64) -> BitMatrix {
    let one_byte = BitMatrix::from_fn(|column| checksum_continue(column, 0));
    one_byte.pow(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_finalizes_to_zero() {
        assert_eq!(checksum(&[]), Checksum::new(0x0000_0000));
        assert_eq!(finalize(INITIAL_STATE).value(), 0);
    }

    #[test]
    fn standard_check_value() {
        assert_eq!(checksum(b"123456789"), Checksum::new(0xCBF4_3926));
    }

    #[test]
    fn table_spot_values() {
        assert_eq!(TABLE[0], 0x0000_0000);
        assert_eq!(TABLE[1], 0x7707_3096);
        assert_eq!(TABLE[255], 0x2D02_EF8D);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let (head, tail) = data.split_at(17);
        let state = update(update(INITIAL_STATE, head), tail);
        assert_eq!(finalize(state), checksum(data));
        assert_eq!(checksum(data), Checksum::new(0x414F_A339));
    }

    #[test]
    fn agrees_with_crc32fast() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
        for len in [0usize, 1, 3, 4, 5, 63, 64, 1000, 4096] {
            let slice = &data[..len];
            assert_eq!(checksum(slice).value(), crc32fast::hash(slice), "len {len}");
        }
    }

    #[test]
    fn zero_operator_matches_feeding_zero_bytes() {
        for count in [0u64, 1, 4, 7, 100, 1025] {
            let op = zero_shift_operator(count);
            for state in [0x0000_0001u32, 0x8000_0000, 0xDEAD_BEEF, 0x1234_5678] {
                let zeros = vec![0u8; count as usize];
                assert_eq!(op.mul_vec(state), update(state, &zeros), "count {count}");
            }
        }
    }

    #[test]
    fn word_feed_equals_four_zero_shifts() {
        let state = 0x0BAD_F00Du32;
        let word = 0xCAFE_BABEu32;
        let fed = update(state, &word.to_le_bytes());
        assert_eq!(fed, zero_shift_operator(4).mul_vec(state ^ word));
    }
}
