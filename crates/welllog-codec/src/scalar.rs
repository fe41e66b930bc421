//! Fixed-width scalar windows: integers, IEEE floats and NUL-padded ASCII.
//!
//! Every function takes the whole buffer plus an offset so callers can
//! address a field inside a record without slicing first. A window that
//! runs past the end of the buffer is reported as
//! [`CodecError::OutOfBounds`]; nothing here panics on short input.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{CodecError, Result};
use crate::Endian;

/// Borrow `width` bytes at `offset`, or report the overrun.
pub(crate) fn window(bytes: &[u8], offset: usize, width: usize) -> Result<&[u8]> {
    let end = window_end(bytes.len(), offset, width)?;
    Ok(&bytes[offset..end])
}

/// Mutable counterpart of [`window`].
pub(crate) fn window_mut(bytes: &mut [u8], offset: usize, width: usize) -> Result<&mut [u8]> {
    let end = window_end(bytes.len(), offset, width)?;
    Ok(&mut bytes[offset..end])
}

fn window_end(len: usize, offset: usize, width: usize) -> Result<usize> {
    offset
        .checked_add(width)
        .filter(|&end| end <= len)
        .ok_or(CodecError::OutOfBounds { offset, width, len })
}

macro_rules! scalar_codec {
    ($read:ident, $write:ident, $ty:ty, $width:expr, $bo_read:ident, $bo_write:ident) => {
        #[doc = concat!("Decode a `", stringify!($ty), "` from the window at `offset`.")]
        pub fn $read(bytes: &[u8], offset: usize, endian: Endian) -> Result<$ty> {
            let w = window(bytes, offset, $width)?;
            Ok(match endian {
                Endian::Little => LittleEndian::$bo_read(w),
                Endian::Big => BigEndian::$bo_read(w),
            })
        }

        #[doc = concat!("Encode a `", stringify!($ty), "` into the window at `offset`.")]
        pub fn $write(bytes: &mut [u8], offset: usize, value: $ty, endian: Endian) -> Result<()> {
            let w = window_mut(bytes, offset, $width)?;
            match endian {
                Endian::Little => LittleEndian::$bo_write(w, value),
                Endian::Big => BigEndian::$bo_write(w, value),
            }
            Ok(())
        }
    };
}

scalar_codec!(read_i16, write_i16, i16, 2, read_i16, write_i16);
scalar_codec!(read_u16, write_u16, u16, 2, read_u16, write_u16);
scalar_codec!(read_i32, write_i32, i32, 4, read_i32, write_i32);
scalar_codec!(read_u32, write_u32, u32, 4, read_u32, write_u32);
scalar_codec!(read_f32, write_f32, f32, 4, read_f32, write_f32);
scalar_codec!(read_f64, write_f64, f64, 8, read_f64, write_f64);

/// Decode a NUL-padded ASCII field of fixed `width`.
///
/// The string ends at the first NUL byte. Bytes outside ASCII are replaced
/// rather than rejected; header fields written by older tools are not
/// always clean.
pub fn read_ascii(bytes: &[u8], offset: usize, width: usize) -> Result<String> {
    let w = window(bytes, offset, width)?;
    let end = w.iter().position(|&b| b == 0).unwrap_or(w.len());
    Ok(String::from_utf8_lossy(&w[..end]).into_owned())
}

/// Encode `text` as a NUL-padded field of fixed `width`, truncating if needed.
pub fn write_ascii(bytes: &mut [u8], offset: usize, width: usize, text: &str) -> Result<()> {
    let w = window_mut(bytes, offset, width)?;
    w.fill(0);
    let src = text.as_bytes();
    let n = src.len().min(width);
    w[..n].copy_from_slice(&src[..n]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i16_both_orders() {
        let mut buf = [0u8; 4];
        for endian in [Endian::Little, Endian::Big] {
            for v in [0i16, 1, -1, i16::MIN, i16::MAX] {
                write_i16(&mut buf, 1, v, endian).unwrap();
                assert_eq!(read_i16(&buf, 1, endian).unwrap(), v);
            }
        }
    }

    #[test]
    fn test_u16_and_u32_extremes() {
        let mut buf = [0u8; 8];
        for endian in [Endian::Little, Endian::Big] {
            for v in [0u16, 1, u16::MAX] {
                write_u16(&mut buf, 0, v, endian).unwrap();
                assert_eq!(read_u16(&buf, 0, endian).unwrap(), v);
            }
            for v in [0u32, 1, u32::MAX] {
                write_u32(&mut buf, 4, v, endian).unwrap();
                assert_eq!(read_u32(&buf, 4, endian).unwrap(), v);
            }
        }
    }

    #[test]
    fn test_i32_extremes() {
        let mut buf = [0u8; 4];
        for endian in [Endian::Little, Endian::Big] {
            for v in [0i32, 1, -1, i32::MIN, i32::MAX] {
                write_i32(&mut buf, 0, v, endian).unwrap();
                assert_eq!(read_i32(&buf, 0, endian).unwrap(), v);
            }
        }
    }

    #[test]
    fn test_byte_order_layout() {
        let mut buf = [0u8; 4];
        write_u32(&mut buf, 0, 0x0102_0304, Endian::Little).unwrap();
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
        write_u32(&mut buf, 0, 0x0102_0304, Endian::Big).unwrap();
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_float_extremes_bit_exact() {
        let mut buf = [0u8; 12];
        for endian in [Endian::Little, Endian::Big] {
            for v in [0.0f32, 1.0, -1.0, f32::MIN, f32::MAX, f32::MIN_POSITIVE, 1.0e-40] {
                write_f32(&mut buf, 0, v, endian).unwrap();
                assert_eq!(read_f32(&buf, 0, endian).unwrap().to_bits(), v.to_bits());
            }
            for v in [0.0f64, 1.0, -1.0, f64::MIN, f64::MAX, f64::MIN_POSITIVE] {
                write_f64(&mut buf, 4, v, endian).unwrap();
                assert_eq!(read_f64(&buf, 4, endian).unwrap().to_bits(), v.to_bits());
            }
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let buf = [0u8; 6];
        assert_eq!(
            read_f64(&buf, 0, Endian::Little),
            Err(CodecError::OutOfBounds {
                offset: 0,
                width: 8,
                len: 6
            })
        );
        assert!(read_u16(&buf, 5, Endian::Big).is_err());
        assert!(read_u16(&buf, usize::MAX, Endian::Big).is_err());
    }

    #[test]
    fn test_ascii_padding_and_truncation() {
        let mut buf = [0xFFu8; 10];
        write_ascii(&mut buf, 2, 6, "GR").unwrap();
        assert_eq!(&buf[2..8], b"GR\0\0\0\0");
        assert_eq!(read_ascii(&buf, 2, 6).unwrap(), "GR");

        write_ascii(&mut buf, 0, 4, "RESISTIVITY").unwrap();
        assert_eq!(read_ascii(&buf, 0, 4).unwrap(), "RESI");
    }

    #[test]
    fn test_ascii_full_width_without_nul() {
        let buf = *b"ABCD";
        assert_eq!(read_ascii(&buf, 0, 4).unwrap(), "ABCD");
    }
}
