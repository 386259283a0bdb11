//! IEEE 802.3 frame check sequence accumulator.
//!
//! Two bit-identical strategies are provided: [`Crc32`] combines a
//! 256-entry table for the reversed polynomial with an 8-bit right shift
//! per byte, and [`crc32_bitwise`] runs the per-bit shift/XOR recurrence.
//! Their equivalence over all inputs is a tested property.
//!
//! The raw accumulator and the complemented reporting form are exposed
//! separately; the frame encoder emits the complemented form, which is
//! what the standard check vectors describe.

use once_cell::sync::Lazy;

/// IEEE 802.3 polynomial 0x04C11DB7 in bit-reflected form.
pub const POLY_REFLECTED: u32 = 0xEDB8_8320;

/// All-ones accumulator seed.
pub const CRC_SEED: u32 = 0xFFFF_FFFF;

static TABLE: Lazy<[u32; 256]> = Lazy::new(|| {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc = i as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY_REFLECTED
            } else {
                crc >> 1
            };
        }
        *entry = crc;
    }
    table
});

/// Running 32-bit frame check sequence.
///
/// Owned exclusively by one in-progress computation; reset once per
/// frame's protected range, never re-seeded mid-range.
#[derive(Debug, Clone)]
pub struct Crc32 {
    acc: u32,
}

impl Crc32 {
    /// Create an accumulator seeded with all ones.
    pub fn new() -> Self {
        Self { acc: CRC_SEED }
    }

    /// Reset the accumulator to the all-ones seed.
    pub fn reset(&mut self) {
        self.acc = CRC_SEED;
    }

    /// Feed one byte through the table-driven recurrence.
    pub fn consume(&mut self, byte: u8) {
        let idx = ((self.acc ^ byte as u32) & 0xFF) as usize;
        self.acc = (self.acc >> 8) ^ TABLE[idx];
    }

    /// Feed a byte slice.
    pub fn consume_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.consume(byte);
        }
    }

    /// Raw accumulator state, no finalizing XOR applied.
    pub fn raw(&self) -> u32 {
        self.acc
    }

    /// Complemented accumulator — the reporting form emitted in the FCS
    /// field and matched by the standard check vectors.
    pub fn value(&self) -> u32 {
        !self.acc
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-bit shift/XOR recurrence over a whole sequence, returning the
/// complemented reporting form. Reference implementation for the
/// equivalence property.
pub fn crc32_bitwise(bytes: &[u8]) -> u32 {
    let mut acc = CRC_SEED;
    for &byte in bytes {
        acc ^= byte as u32;
        for _ in 0..8 {
            acc = if acc & 1 != 0 {
                (acc >> 1) ^ POLY_REFLECTED
            } else {
                acc >> 1
            };
        }
    }
    !acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_crc(bytes: &[u8]) -> u32 {
        let mut crc = Crc32::new();
        crc.consume_slice(bytes);
        crc.value()
    }

    #[test]
    fn test_check_vector_ascii_digits() {
        assert_eq!(table_crc(b"123456789"), 0xCBF43926);
        assert_eq!(crc32_bitwise(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_check_vector_short_inputs() {
        assert_eq!(table_crc(&[0x41]), 0xD3D99E8B);
        assert_eq!(table_crc(b"ABC"), 0xA3830348);
        assert_eq!(crc32_bitwise(&[0x41]), 0xD3D99E8B);
        assert_eq!(crc32_bitwise(b"ABC"), 0xA3830348);
    }

    #[test]
    fn test_strategies_agree() {
        let mut cases: Vec<Vec<u8>> = vec![
            vec![],
            vec![0x00],
            vec![0xFF; 64],
            (0u8..=255).collect(),
            b"the quick brown fox jumps over the lazy dog".to_vec(),
        ];
        // Deterministic pseudo-random sequences of assorted lengths.
        let mut seed = 0x1234_5678u32;
        for len in [1usize, 7, 46, 255, 1500] {
            let mut bytes = Vec::with_capacity(len);
            for _ in 0..len {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                bytes.push((seed >> 24) as u8);
            }
            cases.push(bytes);
        }

        for case in &cases {
            let table = table_crc(case);
            let bitwise = crc32_bitwise(case);
            assert_eq!(table, bitwise, "strategy mismatch for {} bytes", case.len());
            assert_eq!(table, crc32fast::hash(case), "oracle mismatch");
        }
    }

    #[test]
    fn test_incremental_equals_slice() {
        let bytes = b"incremental consumption must match slice consumption";
        let mut one_at_a_time = Crc32::new();
        for &b in bytes.iter() {
            one_at_a_time.consume(b);
        }
        let mut sliced = Crc32::new();
        sliced.consume_slice(bytes);
        assert_eq!(one_at_a_time.value(), sliced.value());
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut crc = Crc32::new();
        crc.consume_slice(b"dirty");
        crc.reset();
        assert_eq!(crc.raw(), CRC_SEED);
        crc.consume_slice(b"123456789");
        assert_eq!(crc.value(), 0xCBF43926);
    }

    #[test]
    fn test_raw_is_uncomplemented() {
        let mut crc = Crc32::new();
        crc.consume_slice(b"123456789");
        assert_eq!(crc.raw(), !0xCBF43926u32);
    }
}
