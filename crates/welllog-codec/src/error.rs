//! Error types for the well-log codec crate.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Window out of bounds: {width} bytes at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("Invalid hex digit {digit:?} at position {position}")]
    InvalidHexDigit { digit: char, position: usize },

    #[error("Hex string has odd length {0}")]
    OddHexLength(usize),
}

pub type Result<T> = std::result::Result<T, CodecError>;
