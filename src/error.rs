//! # Codec error handling
//!
//! Mirrors the M-Bus crate's usual `thiserror`-derived enum, but scoped to
//! the variable-data-record codec only: the byte transport and link-layer
//! framing live outside this crate and report their own errors.

use thiserror::Error;

/// A single parse-error kind, always fatal for the current record.
///
/// Per `spec.md` §7, the codec never retries on these; the byte offset lets
/// the caller log or correlate against the raw frame it already has.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The byte source returned fewer bytes than requested.
    #[error("unexpected end of record at offset {offset}: needed {needed} more byte(s)")]
    UnexpectedEnd { offset: usize, needed: usize },

    /// A DIF data-field code has no direction-qualified descriptor.
    #[error("unknown DIF code 0x{code:02X} at offset {offset}")]
    UnknownDifCode { offset: usize, code: u8 },

    /// A VIF/VIFE code has no entry in the table it was looked up in.
    #[error("unknown VIF/VIFE code 0x{code:02X} at offset {offset}")]
    UnknownVifCode { offset: usize, code: u8 },

    /// The code is defined, but not for the direction the record is being
    /// parsed in (e.g. a GlobalReadout DIF seen slave-to-master).
    #[error("code 0x{code:02X} at offset {offset} is not valid for this direction")]
    DirectionMismatch { offset: usize, code: u8 },

    /// A DIF/DIFE or VIF/VIFE chain exceeded its maximum length.
    #[error("chain too long at offset {offset}: limit is {limit}")]
    ChainTooLong { offset: usize, limit: usize },

    /// The chain's shape is illegal independent of length (SpecialDIF with
    /// trailing DIFEs, a non-terminal FinalDIFE, a terminal ExtensionVIF,
    /// a Combinable not following a True field, ...).
    #[error("malformed chain at offset {offset}: {reason}")]
    ChainStructure { offset: usize, reason: String },

    /// A date/time component is out of both its normal band and its
    /// recurring-pattern sentinel.
    #[error("date/time component out of range at offset {offset}: {reason}")]
    BadComponent { offset: usize, reason: String },

    /// A declared length didn't match what was available/expected (LVAR
    /// band mismatch, decoder called with the wrong byte count, ...).
    #[error("length mismatch at offset {offset}: expected {expected}, got {actual}")]
    LengthMismatch {
        offset: usize,
        expected: usize,
        actual: usize,
    },

    /// A Plain-Text VIF unit string contained a non-ASCII byte.
    #[error("non-ASCII byte 0x{byte:02X} in plain-text unit at offset {offset}")]
    NonAscii { offset: usize, byte: u8 },

    /// An OBIS register number (reinterpreted storage number) exceeded 125.
    #[error("register number {value} out of range at offset {offset} (max 125)")]
    RegisterOutOfRange { offset: usize, value: u32 },

    /// The data-rules algebra (`spec.md` §4.3) found no concrete type.
    #[error("no concrete data type matches Supports/Requires at offset {offset}")]
    NoMatchingType { offset: usize },
}

pub type CodecResult<T> = Result<T, CodecError>;
