//! Packet error codes (PEC) of the ADBMS6948 serial interface.
//!
//! Command words are protected by a 15 bit CRC, register group payloads by a
//! 10 bit CRC. Both start from the seed `0x0010` and use a byte-wise lookup
//! table; the 10 bit variant needs an additional bit-serial reduction at the
//! end and can fold in the command counter the device sends back with every
//! register group.

/// Initial remainder of both CRCs.
pub const PEC_SEED: u16 = 0x0010;

/// CRC10 generator polynomial without the x^10 term.
const CRC10_POLYNOMIAL: u16 = 0x008F;

/// Bits of the status byte that carry the 6 bit command counter.
const COMMAND_COUNTER_MASK: u8 = 0xFC;

/// Calculates the PEC15 of a command word.
///
/// The result has its least significant bit cleared, the generator has no
/// constant term so the 15 bit remainder is shifted up by one.
pub fn pec15(data: &[u8]) -> u16 {
    let mut remainder = PEC_SEED;
    for byte in data {
        let index = ((remainder >> 7) ^ u16::from(*byte)) & 0xFF;
        remainder = (remainder << 8) ^ CRC15_TABLE[usize::from(index)];
    }
    remainder << 1
}

/// Calculates the PEC10 of a register group.
///
/// For transmitted groups `status` is `None`. When validating a received
/// group, pass the byte that follows the payload on the wire: its upper six
/// bits hold the command counter, which the device includes in the checksum.
pub fn pec10(data: &[u8], status: Option<u8>) -> u16 {
    let mut remainder = PEC_SEED;
    for byte in data {
        let index = ((remainder >> 2) ^ u16::from(*byte)) & 0xFF;
        remainder = (remainder << 8) ^ CRC10_TABLE[usize::from(index)];
    }
    if let Some(status) = status {
        remainder ^= u16::from(status & COMMAND_COUNTER_MASK) << 2;
    }
    // modulo-2 division of the last six bits, one bit at a time
    for _ in 0..6 {
        remainder = if remainder & 0x0200 != 0 {
            (remainder << 1) ^ CRC10_POLYNOMIAL
        } else {
            remainder << 1
        };
    }
    remainder & 0x03FF
}

/// CRC15 lookup table, polynomial x^15 + x^14 + x^10 + x^8 + x^7 + x^4 + x^3 + 1.
const CRC15_TABLE: [u16; 256] = [
    0x0000, 0xc599, 0xceab, 0x0b32, 0xd8cf, 0x1d56, 0x1664, 0xd3fd,
    0xf407, 0x319e, 0x3aac, 0xff35, 0x2cc8, 0xe951, 0xe263, 0x27fa,
    0xad97, 0x680e, 0x633c, 0xa6a5, 0x7558, 0xb0c1, 0xbbf3, 0x7e6a,
    0x5990, 0x9c09, 0x973b, 0x52a2, 0x815f, 0x44c6, 0x4ff4, 0x8a6d,
    0x5b2e, 0x9eb7, 0x9585, 0x501c, 0x83e1, 0x4678, 0x4d4a, 0x88d3,
    0xaf29, 0x6ab0, 0x6182, 0xa41b, 0x77e6, 0xb27f, 0xb94d, 0x7cd4,
    0xf6b9, 0x3320, 0x3812, 0xfd8b, 0x2e76, 0xebef, 0xe0dd, 0x2544,
    0x02be, 0xc727, 0xcc15, 0x098c, 0xda71, 0x1fe8, 0x14da, 0xd143,
    0xf3c5, 0x365c, 0x3d6e, 0xf8f7, 0x2b0a, 0xee93, 0xe5a1, 0x2038,
    0x07c2, 0xc25b, 0xc969, 0x0cf0, 0xdf0d, 0x1a94, 0x11a6, 0xd43f,
    0x5e52, 0x9bcb, 0x90f9, 0x5560, 0x869d, 0x4304, 0x4836, 0x8daf,
    0xaa55, 0x6fcc, 0x64fe, 0xa167, 0x729a, 0xb703, 0xbc31, 0x79a8,
    0xa8eb, 0x6d72, 0x6640, 0xa3d9, 0x7024, 0xb5bd, 0xbe8f, 0x7b16,
    0x5cec, 0x9975, 0x9247, 0x57de, 0x8423, 0x41ba, 0x4a88, 0x8f11,
    0x057c, 0xc0e5, 0xcbd7, 0x0e4e, 0xddb3, 0x182a, 0x1318, 0xd681,
    0xf17b, 0x34e2, 0x3fd0, 0xfa49, 0x29b4, 0xec2d, 0xe71f, 0x2286,
    0xa213, 0x678a, 0x6cb8, 0xa921, 0x7adc, 0xbf45, 0xb477, 0x71ee,
    0x5614, 0x938d, 0x98bf, 0x5d26, 0x8edb, 0x4b42, 0x4070, 0x85e9,
    0x0f84, 0xca1d, 0xc12f, 0x04b6, 0xd74b, 0x12d2, 0x19e0, 0xdc79,
    0xfb83, 0x3e1a, 0x3528, 0xf0b1, 0x234c, 0xe6d5, 0xede7, 0x287e,
    0xf93d, 0x3ca4, 0x3796, 0xf20f, 0x21f2, 0xe46b, 0xef59, 0x2ac0,
    0x0d3a, 0xc8a3, 0xc391, 0x0608, 0xd5f5, 0x106c, 0x1b5e, 0xdec7,
    0x54aa, 0x9133, 0x9a01, 0x5f98, 0x8c65, 0x49fc, 0x42ce, 0x8757,
    0xa0ad, 0x6534, 0x6e06, 0xab9f, 0x7862, 0xbdfb, 0xb6c9, 0x7350,
    0x51d6, 0x944f, 0x9f7d, 0x5ae4, 0x8919, 0x4c80, 0x47b2, 0x822b,
    0xa5d1, 0x6048, 0x6b7a, 0xaee3, 0x7d1e, 0xb887, 0xb3b5, 0x762c,
    0xfc41, 0x39d8, 0x32ea, 0xf773, 0x248e, 0xe117, 0xea25, 0x2fbc,
    0x0846, 0xcddf, 0xc6ed, 0x0374, 0xd089, 0x1510, 0x1e22, 0xdbbb,
    0x0af8, 0xcf61, 0xc453, 0x01ca, 0xd237, 0x17ae, 0x1c9c, 0xd905,
    0xfeff, 0x3b66, 0x3054, 0xf5cd, 0x2630, 0xe3a9, 0xe89b, 0x2d02,
    0xa76f, 0x62f6, 0x69c4, 0xac5d, 0x7fa0, 0xba39, 0xb10b, 0x7492,
    0x5368, 0x96f1, 0x9dc3, 0x585a, 0x8ba7, 0x4e3e, 0x450c, 0x8095,
];

/// CRC10 lookup table, polynomial x^10 + x^7 + x^3 + x^2 + x + 1.
const CRC10_TABLE: [u16; 256] = [
    0x000, 0x08f, 0x11e, 0x191, 0x23c, 0x2b3, 0x322, 0x3ad,
    0x0f7, 0x078, 0x1e9, 0x166, 0x2cb, 0x244, 0x3d5, 0x35a,
    0x1ee, 0x161, 0x0f0, 0x07f, 0x3d2, 0x35d, 0x2cc, 0x243,
    0x119, 0x196, 0x007, 0x088, 0x325, 0x3aa, 0x23b, 0x2b4,
    0x3dc, 0x353, 0x2c2, 0x24d, 0x1e0, 0x16f, 0x0fe, 0x071,
    0x32b, 0x3a4, 0x235, 0x2ba, 0x117, 0x198, 0x009, 0x086,
    0x232, 0x2bd, 0x32c, 0x3a3, 0x00e, 0x081, 0x110, 0x19f,
    0x2c5, 0x24a, 0x3db, 0x354, 0x0f9, 0x076, 0x1e7, 0x168,
    0x337, 0x3b8, 0x229, 0x2a6, 0x10b, 0x184, 0x015, 0x09a,
    0x3c0, 0x34f, 0x2de, 0x251, 0x1fc, 0x173, 0x0e2, 0x06d,
    0x2d9, 0x256, 0x3c7, 0x348, 0x0e5, 0x06a, 0x1fb, 0x174,
    0x22e, 0x2a1, 0x330, 0x3bf, 0x012, 0x09d, 0x10c, 0x183,
    0x0eb, 0x064, 0x1f5, 0x17a, 0x2d7, 0x258, 0x3c9, 0x346,
    0x01c, 0x093, 0x102, 0x18d, 0x220, 0x2af, 0x33e, 0x3b1,
    0x105, 0x18a, 0x01b, 0x094, 0x339, 0x3b6, 0x227, 0x2a8,
    0x1f2, 0x17d, 0x0ec, 0x063, 0x3ce, 0x341, 0x2d0, 0x25f,
    0x2e1, 0x26e, 0x3ff, 0x370, 0x0dd, 0x052, 0x1c3, 0x14c,
    0x216, 0x299, 0x308, 0x387, 0x02a, 0x0a5, 0x134, 0x1bb,
    0x30f, 0x380, 0x211, 0x29e, 0x133, 0x1bc, 0x02d, 0x0a2,
    0x3f8, 0x377, 0x2e6, 0x269, 0x1c4, 0x14b, 0x0da, 0x055,
    0x13d, 0x1b2, 0x023, 0x0ac, 0x301, 0x38e, 0x21f, 0x290,
    0x1ca, 0x145, 0x0d4, 0x05b, 0x3f6, 0x379, 0x2e8, 0x267,
    0x0d3, 0x05c, 0x1cd, 0x142, 0x2ef, 0x260, 0x3f1, 0x37e,
    0x024, 0x0ab, 0x13a, 0x1b5, 0x218, 0x297, 0x306, 0x389,
    0x1d6, 0x159, 0x0c8, 0x047, 0x3ea, 0x365, 0x2f4, 0x27b,
    0x121, 0x1ae, 0x03f, 0x0b0, 0x31d, 0x392, 0x203, 0x28c,
    0x038, 0x0b7, 0x126, 0x1a9, 0x204, 0x28b, 0x31a, 0x395,
    0x0cf, 0x040, 0x1d1, 0x15e, 0x2f3, 0x27c, 0x3ed, 0x362,
    0x20a, 0x285, 0x314, 0x39b, 0x036, 0x0b9, 0x128, 0x1a7,
    0x2fd, 0x272, 0x3e3, 0x36c, 0x0c1, 0x04e, 0x1df, 0x150,
    0x3e4, 0x36b, 0x2fa, 0x275, 0x1d8, 0x157, 0x0c6, 0x049,
    0x313, 0x39c, 0x20d, 0x282, 0x12f, 0x1a0, 0x031, 0x0be,
];

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn crc15_entry(index: u16) -> u16 {
        let mut remainder = index << 7;
        for _ in 0..8 {
            remainder = if remainder & 0x4000 != 0 {
                (remainder << 1) ^ 0x4599
            } else {
                remainder << 1
            };
        }
        remainder
    }

    fn crc10_entry(index: u16) -> u16 {
        let mut remainder = index << 2;
        for _ in 0..8 {
            remainder = if remainder & 0x0200 != 0 {
                (remainder << 1) ^ CRC10_POLYNOMIAL
            } else {
                remainder << 1
            };
        }
        remainder & 0x03FF
    }

    #[test]
    fn tables_match_their_polynomials() {
        for index in 0..256u16 {
            assert_eq!(CRC15_TABLE[usize::from(index)], crc15_entry(index), "CRC15 #{index}");
            assert_eq!(CRC10_TABLE[usize::from(index)], crc10_entry(index), "CRC10 #{index}");
        }
    }

    #[test]
    fn pec15_of_nothing_is_the_shifted_seed() {
        assert_eq!(pec15(&[]), 32);
    }

    // Values from the datasheet command examples.
    #[test_case(&[0x00, 0x01], 0x3D6E; "wrcfga")]
    #[test_case(&[0x00, 0x04], 0x07C2; "rdcva")]
    #[test_case(&[0x02, 0x60], 0x7C20; "adcv")]
    #[test_case(&[0x00, 0x02], 0x2B0A; "rdcfga")]
    fn pec15_of_command_words(data: &[u8], expected: u16) {
        assert_eq!(pec15(data), expected);
    }

    #[test]
    fn pec15_low_bit_is_always_clear() {
        for first in 0..=255u8 {
            for second in [0x00, 0x01, 0x5A, 0xA5, 0xFF] {
                assert_eq!(pec15(&[first, second]) & 1, 0);
            }
        }
    }

    #[test]
    fn pec15_depends_on_byte_order() {
        assert_eq!(pec15(&[0x01, 0x02]), 0xA346);
        assert_eq!(pec15(&[0x02, 0x01]), 0xA6C4);
    }

    #[test]
    fn pec10_of_nothing_runs_only_the_bit_stage() {
        assert_eq!(pec10(&[], None), 0x008F);
        // the counter bits cancel the seed, nothing is left to divide
        assert_eq!(pec10(&[], Some(0x04)), 0x0000);
    }

    #[test_case(&[0x80, 0x00, 0x00, 0x00, 0x00, 0x00], 0x0137; "cfga_refon")]
    #[test_case(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00], 0x03E3; "zeros")]
    #[test_case(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF], 0x0196; "ones")]
    #[test_case(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06], 0x0131; "ramp")]
    fn pec10_of_register_groups(data: &[u8], expected: u16) {
        assert_eq!(pec10(data, None), expected);
    }

    #[test]
    fn pec10_ignores_status_without_counter_bits() {
        let group = [0x80, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(pec10(&group, Some(0x00)), pec10(&group, None));
        assert_eq!(pec10(&group, Some(0x03)), pec10(&group, None));
    }

    #[test]
    fn pec10_folds_in_command_counter() {
        let group = [0x80, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(pec10(&group, Some(0xFC)), 0x005F);
        assert_eq!(pec10(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06], Some(0x28)), 0x00D8);
    }

    #[test]
    fn pec10_fits_into_ten_bits() {
        for byte in 0..=255u8 {
            let group = [byte, !byte, byte, 0x00, 0xFF, byte];
            assert_eq!(pec10(&group, None) & !0x03FF, 0);
            assert_eq!(pec10(&group, Some(byte)) & !0x03FF, 0);
        }
    }
}
