//! IBM System/360 single-precision floats.
//!
//! Layout of the 32-bit word (big-endian on disk by convention):
//! - bit 31:      sign
//! - bits 24..31: exponent, base 16, excess 64
//! - bits 0..24:  fraction, value = 0.fraction * 16^(exponent - 64)
//!
//! The fraction carries 24 bits, so every IBM value that lands in the IEEE
//! normal range converts exactly. The reverse direction can drop up to
//! three low bits while aligning the exponent to a multiple of four.

use crate::error::Result;
use crate::scalar::{read_u32, write_u32};
use crate::Endian;

const SIGN_MASK: u32 = 0x8000_0000;
const FRACTION_MASK: u32 = 0x00FF_FFFF;
const FRACTION_HIGH_BIT: u32 = 0x0080_0000;

/// Largest IBM magnitude: exponent 0x7F, fraction all ones.
const IBM_MAX_MAGNITUDE: u32 = 0x7FFF_FFFF;

/// Convert an IBM word to an IEEE `f32`.
///
/// Zero fraction (including the all-zero word) gives 0.0. Magnitudes above
/// `f32::MAX` clamp to `±f32::MAX`; magnitudes below the smallest normal
/// IEEE value flush to 0.0.
pub fn ibm_to_ieee(word: u32) -> f32 {
    if word == 0 {
        return 0.0;
    }

    let sign = word & SIGN_MASK;
    let mut fraction = word & FRACTION_MASK;
    if fraction == 0 {
        return 0.0;
    }

    // value = (fraction / 2^24) * 2^exp2
    let mut exp2 = (((word >> 24) & 0x7F) as i32 - 64) * 4;
    while fraction & FRACTION_HIGH_BIT == 0 {
        fraction <<= 1;
        exp2 -= 1;
    }

    // Hidden bit is now bit 23: value = 1.f * 2^(exp2 - 1)
    let biased = exp2 - 1 + 127;
    if biased >= 255 {
        return if sign != 0 { -f32::MAX } else { f32::MAX };
    }
    if biased <= 0 {
        return 0.0;
    }

    f32::from_bits(sign | ((biased as u32) << 23) | (fraction & 0x007F_FFFF))
}

/// Convert an IEEE `f32` to an IBM word.
///
/// NaN encodes as zero, infinities and out-of-range magnitudes clamp to the
/// largest IBM magnitude with the sign kept.
pub fn ieee_to_ibm(value: f32) -> u32 {
    if value.is_nan() || value == 0.0 {
        return 0;
    }

    let bits = value.to_bits();
    let sign = bits & SIGN_MASK;
    if value.is_infinite() {
        return sign | IBM_MAX_MAGNITUDE;
    }

    let biased = ((bits >> 23) & 0xFF) as i32;
    let raw_fraction = bits & 0x007F_FFFF;
    let (mut fraction, unbiased) = if biased == 0 {
        (raw_fraction, -126)
    } else {
        (raw_fraction | FRACTION_HIGH_BIT, biased - 127)
    };

    // value = (fraction / 2^24) * 2^exp2
    let mut exp2 = unbiased + 1;
    while exp2.rem_euclid(4) != 0 {
        fraction >>= 1;
        exp2 += 1;
    }

    let exponent = exp2 / 4 + 64;
    if exponent > 0x7F {
        return sign | IBM_MAX_MAGNITUDE;
    }
    if exponent < 0 || fraction == 0 {
        return 0;
    }

    sign | ((exponent as u32) << 24) | fraction
}

/// Decode an IBM float from the window at `offset`.
pub fn read_ibm_f32(bytes: &[u8], offset: usize, endian: Endian) -> Result<f32> {
    read_u32(bytes, offset, endian).map(ibm_to_ieee)
}

/// Encode an IBM float into the window at `offset`.
pub fn write_ibm_f32(bytes: &mut [u8], offset: usize, value: f32, endian: Endian) -> Result<()> {
    write_u32(bytes, offset, ieee_to_ibm(value), endian)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f32, b: f32) -> bool {
        if b == 0.0 {
            return a == 0.0;
        }
        ((a - b) / b).abs() <= 2.0e-6
    }

    #[test]
    fn test_zero_window() {
        assert_eq!(ibm_to_ieee(0).to_bits(), 0.0f32.to_bits());
        assert_eq!(read_ibm_f32(&[0, 0, 0, 0], 0, Endian::Big).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_fraction_with_exponent() {
        assert_eq!(ibm_to_ieee(0x4100_0000), 0.0);
        assert_eq!(ibm_to_ieee(0xC100_0000), 0.0);
    }

    #[test]
    fn test_known_words() {
        assert_eq!(ibm_to_ieee(0x4110_0000), 1.0);
        assert_eq!(ibm_to_ieee(0xC110_0000), -1.0);
        assert_eq!(ibm_to_ieee(0xC276_A000), -118.625);
        assert_eq!(ibm_to_ieee(0x4080_0000), 0.5);
        assert_eq!(ibm_to_ieee(0x4210_0000), 16.0);
    }

    #[test]
    fn test_encode_known_words() {
        assert_eq!(ieee_to_ibm(1.0), 0x4110_0000);
        assert_eq!(ieee_to_ibm(-1.0), 0xC110_0000);
        assert_eq!(ieee_to_ibm(-118.625), 0xC276_A000);
        assert_eq!(ieee_to_ibm(0.5), 0x4080_0000);
        assert_eq!(ieee_to_ibm(16.0), 0x4210_0000);
        assert_eq!(ieee_to_ibm(0.0), 0);
        assert_eq!(ieee_to_ibm(f32::NAN), 0);
    }

    #[test]
    fn test_normalisation_shift_counts() {
        // Fraction leading nibble 0x1: three shifts needed.
        assert_eq!(ibm_to_ieee(0x4110_0000), 1.0);
        // Leading nibble 0x2: two shifts.
        assert_eq!(ibm_to_ieee(0x4120_0000), 2.0);
        // Leading nibble 0x4: one shift.
        assert_eq!(ibm_to_ieee(0x4140_0000), 4.0);
        // Leading nibble 0x8: already normalised.
        assert_eq!(ibm_to_ieee(0x4180_0000), 8.0);
        // Leading nibble zero: more than one hex digit of shifting.
        assert_eq!(ibm_to_ieee(0x4201_0000), 1.0);
    }

    #[test]
    fn test_overflow_clamps_with_sign() {
        assert_eq!(ibm_to_ieee(0x7FFF_FFFF), f32::MAX);
        assert_eq!(ibm_to_ieee(0xFFFF_FFFF), -f32::MAX);
        // Exponent 97, fraction 0x10_0000: first value past f32::MAX.
        assert_eq!(ibm_to_ieee(0x6110_0000), f32::MAX);
    }

    #[test]
    fn test_largest_in_range_exponent() {
        // Exponent 96, fraction with high bit set: 2^127 * 1.0
        assert_eq!(ibm_to_ieee(0x6080_0000), 2.0f32.powi(127));
        assert_eq!(ieee_to_ibm(f32::MAX), 0x60FF_FFFF);
    }

    #[test]
    fn test_underflow_flushes_to_zero() {
        assert_eq!(ibm_to_ieee(0x0010_0000), 0.0);
        assert_eq!(ibm_to_ieee(0x8010_0000), 0.0);
    }

    #[test]
    fn test_smallest_normal_survives() {
        let word = ieee_to_ibm(f32::MIN_POSITIVE);
        assert_eq!(word, 0x2140_0000);
        assert_eq!(ibm_to_ieee(word), f32::MIN_POSITIVE);
    }

    #[test]
    fn test_infinity_clamps() {
        assert_eq!(ieee_to_ibm(f32::INFINITY), 0x7FFF_FFFF);
        assert_eq!(ieee_to_ibm(f32::NEG_INFINITY), 0xFFFF_FFFF);
    }

    #[test]
    fn test_round_trip_exponent_bands() {
        for x in [1.0f32, 1.0e-10, 1.0e10, -1.0, 0.0, 3.25e-20, -7.5e25, 0.1] {
            let back = ibm_to_ieee(ieee_to_ibm(x));
            assert!(close(back, x), "{x} came back as {back}");
        }
    }

    #[test]
    fn test_window_both_orders() {
        let mut buf = [0u8; 6];
        write_ibm_f32(&mut buf, 2, -118.625, Endian::Big).unwrap();
        assert_eq!(&buf[2..6], &[0xC2, 0x76, 0xA0, 0x00]);
        assert_eq!(read_ibm_f32(&buf, 2, Endian::Big).unwrap(), -118.625);

        write_ibm_f32(&mut buf, 0, -118.625, Endian::Little).unwrap();
        assert_eq!(&buf[0..4], &[0x00, 0xA0, 0x76, 0xC2]);
        assert_eq!(read_ibm_f32(&buf, 0, Endian::Little).unwrap(), -118.625);
    }

    proptest! {
        #[test]
        fn prop_round_trip_within_float_precision(x in -1.0e30f32..1.0e30f32) {
            let back = ibm_to_ieee(ieee_to_ibm(x));
            if x.abs() >= f32::MIN_POSITIVE {
                prop_assert!(close(back, x), "{} came back as {}", x, back);
            }
        }

        #[test]
        fn prop_decode_never_exceeds_f32(word in any::<u32>()) {
            let v = ibm_to_ieee(word);
            prop_assert!(v.is_finite());
        }
    }
}
