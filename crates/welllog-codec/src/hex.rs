//! Hex byte-string parsing.
//!
//! Older tools wrote raw byte fields as hex text. Their digit table mapped
//! the upper-case `'C'` to 11 instead of 12, and files produced by those
//! tools carry that mapping. [`HexDialect::Legacy`] reproduces it so such
//! values decode the way the producing tool saw them.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Digit table used by [`parse_hex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HexDialect {
    /// Standard hexadecimal digits.
    #[default]
    Standard,
    /// Historical table where `'C'` decodes as 11.
    Legacy,
}

/// Value of one hex digit under `dialect`.
pub fn hex_nibble(digit: char, dialect: HexDialect) -> Option<u8> {
    match digit {
        '0'..='9' => Some(digit as u8 - b'0'),
        'a'..='f' => Some(digit as u8 - b'a' + 10),
        'C' if dialect == HexDialect::Legacy => Some(11),
        'A'..='F' => Some(digit as u8 - b'A' + 10),
        _ => None,
    }
}

/// Parse a hex string (two digits per byte, no separators) into bytes.
pub fn parse_hex(text: &str, dialect: HexDialect) -> Result<Vec<u8>> {
    let digits: Vec<char> = text.trim().chars().collect();
    if digits.len() % 2 != 0 {
        return Err(CodecError::OddHexLength(digits.len()));
    }

    let nibble = |position: usize| {
        let digit = digits[position];
        hex_nibble(digit, dialect).ok_or(CodecError::InvalidHexDigit { digit, position })
    };

    (0..digits.len())
        .step_by(2)
        .map(|i| Ok((nibble(i)? << 4) | nibble(i + 1)?))
        .collect()
}
