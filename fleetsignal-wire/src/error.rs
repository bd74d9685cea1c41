//! Codec errors
//!
//! Decoding fails fast: the first structural problem aborts the whole payload
//! and no partially decoded series are returned. Every variant carries the
//! observed and expected values so a bad payload can be diagnosed from the
//! message alone.

use alloc::string::String;

use thiserror_no_std::Error;

/// Result type for payload decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for payload encoding
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Reasons a payload cannot be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer smaller than the fixed envelope
    #[error("Payload too short: {len} bytes, need at least {min}")]
    TooShort {
        /// Buffer length
        len: usize,
        /// Envelope size
        min: usize,
    },

    /// Leading magic does not identify a series payload
    #[error("Bad magic: expected 0x{expected:08X}, found 0x{found:08X}")]
    BadMagic {
        /// Magic this decoder accepts
        expected: u32,
        /// Magic read from the buffer
        found: u32,
    },

    /// A field or data block runs past the end of the buffer
    #[error("Truncated payload at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        /// Offset of the field being read
        offset: usize,
        /// Bytes the field requires
        needed: usize,
        /// Bytes left in the buffer from `offset`
        available: usize,
    },

    /// Length-prefixed string is not UTF-8
    #[error("Invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the string bytes
        offset: usize,
    },

    /// Two series share an id
    #[error("Duplicate series id '{id}' at header {index}")]
    DuplicateSeriesId {
        /// Repeated id
        id: String,
        /// Header index of the second occurrence
        index: usize,
    },
}

/// Reasons a payload cannot be encoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Series ids must be non-empty
    #[error("Series id must not be empty")]
    EmptyId,

    /// String does not fit its `u16` length prefix
    #[error("{field} is {len} bytes, limit is {max}")]
    StringTooLong {
        /// Which string overflowed
        field: &'static str,
        /// Its length in bytes
        len: usize,
        /// Largest encodable length
        max: usize,
    },

    /// Id already added to this payload
    #[error("Duplicate series id '{id}'")]
    DuplicateSeriesId {
        /// Repeated id
        id: String,
    },

    /// Series count does not fit the `u16` header field
    #[error("Too many series: limit is {max}")]
    TooManySeries {
        /// Largest encodable count
        max: usize,
    },

    /// Point count does not fit its `u32` field
    #[error("Point count {count} overflows the {field} field")]
    PointCountOverflow {
        /// Which counter overflowed
        field: &'static str,
        /// Count that did not fit
        count: u64,
    },
}
