//! # welllog-codec
//!
//! Numeric codec for binary well-log records. Every function here is a pure
//! transform over a byte window: no I/O, no state.
//!
//! Supported encodings, each in little- and big-endian order:
//! - **Integers**: 16-bit and 32-bit, signed and unsigned
//! - **IEEE 754**: `f32` and `f64`
//! - **IBM mainframe float**: 32-bit, excess-64 hexadecimal exponent
//! - **ASCII**: fixed width, NUL padded
//!
//! Missing samples are stored on disk as any value at or below
//! [`MISSING_VALUE`] and surface in memory as NaN.
//!
//! ## Example
//! ```rust
//! use welllog_codec::{Endian, NumericType};
//!
//! let mut record = [0u8; 8];
//! NumericType::IbmF32.encode(-118.625, &mut record, 4, Endian::Big).unwrap();
//! let value = NumericType::IbmF32.decode(&record, 4, Endian::Big).unwrap();
//! assert_eq!(value, -118.625);
//! ```

pub mod error;
pub mod hex;
pub mod ibm;
pub mod scalar;

use serde::{Deserialize, Serialize};

pub use error::{CodecError, Result};
pub use hex::{hex_nibble, parse_hex, HexDialect};
pub use ibm::{ibm_to_ieee, ieee_to_ibm, read_ibm_f32, write_ibm_f32};
pub use scalar::{
    read_ascii, read_f32, read_f64, read_i16, read_i32, read_u16, read_u32, write_ascii,
    write_f32, write_f64, write_i16, write_i32, write_u16, write_u32,
};

/// On-disk encoding of a missing sample.
pub const MISSING_VALUE: f64 = -1.0e30;

/// Byte order of a numeric window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// True when `value` is NaN or at or below the missing-value sentinel.
pub fn is_missing(value: f64) -> bool {
    value.is_nan() || value <= MISSING_VALUE
}

/// Map a stored `f32` sample to memory, turning the sentinel into NaN.
pub fn decode_sample(raw: f32) -> f64 {
    let value = f64::from(raw);
    if is_missing(value) {
        f64::NAN
    } else {
        value
    }
}

/// Map an in-memory sample to its stored `f32`, turning NaN into the sentinel.
pub fn encode_sample(value: f64) -> f32 {
    if is_missing(value) {
        MISSING_VALUE as f32
    } else {
        value as f32
    }
}

/// A numeric encoding that can be read from or written to a byte window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericType {
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
    /// IBM System/360 single precision.
    IbmF32,
}

impl NumericType {
    /// Width of one value in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 | Self::IbmF32 => 4,
            Self::F64 => 8,
        }
    }

    /// Decode one value at `offset`, widened to `f64`.
    pub fn decode(self, bytes: &[u8], offset: usize, endian: Endian) -> Result<f64> {
        Ok(match self {
            Self::I16 => f64::from(read_i16(bytes, offset, endian)?),
            Self::U16 => f64::from(read_u16(bytes, offset, endian)?),
            Self::I32 => f64::from(read_i32(bytes, offset, endian)?),
            Self::U32 => f64::from(read_u32(bytes, offset, endian)?),
            Self::F32 => f64::from(read_f32(bytes, offset, endian)?),
            Self::F64 => read_f64(bytes, offset, endian)?,
            Self::IbmF32 => f64::from(read_ibm_f32(bytes, offset, endian)?),
        })
    }

    /// Encode `value` at `offset`. Integer targets round to nearest and
    /// saturate at the type bounds.
    pub fn encode(self, value: f64, bytes: &mut [u8], offset: usize, endian: Endian) -> Result<()> {
        match self {
            Self::I16 => write_i16(bytes, offset, value.round() as i16, endian),
            Self::U16 => write_u16(bytes, offset, value.round() as u16, endian),
            Self::I32 => write_i32(bytes, offset, value.round() as i32, endian),
            Self::U32 => write_u32(bytes, offset, value.round() as u32, endian),
            Self::F32 => write_f32(bytes, offset, value as f32, endian),
            Self::F64 => write_f64(bytes, offset, value, endian),
            Self::IbmF32 => write_ibm_f32(bytes, offset, value as f32, endian),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [NumericType; 7] = [
        NumericType::I16,
        NumericType::U16,
        NumericType::I32,
        NumericType::U32,
        NumericType::F32,
        NumericType::F64,
        NumericType::IbmF32,
    ];

    fn extremes(ty: NumericType) -> Vec<f64> {
        match ty {
            NumericType::I16 => vec![0.0, 1.0, -1.0, i16::MIN as f64, i16::MAX as f64],
            NumericType::U16 => vec![0.0, 1.0, u16::MAX as f64],
            NumericType::I32 => vec![0.0, 1.0, -1.0, i32::MIN as f64, i32::MAX as f64],
            NumericType::U32 => vec![0.0, 1.0, u32::MAX as f64],
            NumericType::F32 => vec![0.0, 1.0, -1.0, f32::MIN as f64, f32::MAX as f64, f32::MIN_POSITIVE as f64],
            NumericType::F64 => vec![0.0, 1.0, -1.0, f64::MIN, f64::MAX, 5.0e-324],
            // 0x10_0000 fraction needs three normalising shifts on decode.
            NumericType::IbmF32 => vec![0.0, 1.0, -1.0, -118.625, 16.0, 2.0f64.powi(-126)],
        }
    }

    #[test]
    fn test_every_type_round_trips_in_both_orders() {
        let mut buf = [0u8; 12];
        for ty in ALL {
            for endian in [Endian::Little, Endian::Big] {
                for v in extremes(ty) {
                    ty.encode(v, &mut buf, 3, endian).unwrap();
                    let back = ty.decode(&buf, 3, endian).unwrap();
                    assert_eq!(back, v, "{ty:?} {endian:?} {v}");
                }
            }
        }
    }

    #[test]
    fn test_widths() {
        let widths: Vec<usize> = ALL.iter().map(|t| t.width()).collect();
        assert_eq!(widths, vec![2, 2, 4, 4, 4, 8, 4]);
    }

    #[test]
    fn test_integer_encode_saturates() {
        let mut buf = [0u8; 2];
        NumericType::I16
            .encode(1.0e9, &mut buf, 0, Endian::Little)
            .unwrap();
        assert_eq!(read_i16(&buf, 0, Endian::Little).unwrap(), i16::MAX);
    }

    #[test]
    fn test_sentinel_mapping() {
        assert!(decode_sample(-1.0e30).is_nan());
        assert!(decode_sample(-1.5e35).is_nan());
        assert_eq!(decode_sample(-9.99e29), f64::from(-9.99e29f32));
        assert_eq!(encode_sample(f64::NAN), -1.0e30f32);
        assert_eq!(encode_sample(f64::NAN).to_bits(), (-1.0e30f32).to_bits());
        assert_eq!(encode_sample(12.5), 12.5f32);
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(f64::NAN));
        assert!(is_missing(MISSING_VALUE));
        assert!(is_missing(f64::from(MISSING_VALUE as f32)));
        assert!(!is_missing(-999.25));
    }
}
