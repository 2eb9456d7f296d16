//! # C9 — Plain-Text ASCII unit sub-protocol
//!
//! A `PlainTextVIF` doesn't take its unit from a table: after the
//! record's VIB is otherwise parsed, the codec reads one length byte
//! followed by that many ASCII bytes carrying the unit string in
//! transmission order — rightmost character first in the stream, so
//! the unit string itself is the reverse of what's read (`spec.md`
//! §4.7/§9 Open Question #2).
//!
//! §9 leaves the length byte's legal range ambiguous between `0..255`
//! and `1..255`; this codec takes the stricter `1..255` reading (an
//! empty plain-text unit is rejected as malformed rather than silently
//! accepted), flagged in `DESIGN.md` as a compatibility risk against
//! implementations that permit a zero-length unit.

use crate::byte_source::ByteSource;
use crate::error::{CodecError, CodecResult};

/// Reads the length-prefixed ASCII unit string following a PlainText
/// VIF, returning it already reversed into reading order.
pub async fn parse_unit<S>(source: &mut S) -> CodecResult<String>
where
    S: ByteSource + ?Sized,
{
    let len_offset = source.position();
    let len = source.read_exact(1).await?[0];
    if len == 0 {
        return Err(CodecError::LengthMismatch {
            offset: len_offset,
            expected: 1,
            actual: 0,
        });
    }

    let bytes_offset = source.position();
    let raw = source.read_exact(len as usize).await?;
    let mut out = String::with_capacity(raw.len());
    for (i, &b) in raw.iter().enumerate().rev() {
        if b > 0x7F {
            return Err(CodecError::NonAscii {
                offset: bytes_offset + i,
                byte: b,
            });
        }
        out.push(b as char);
    }
    Ok(out)
}

/// Encodes a unit string back into its on-the-wire length-prefixed,
/// reversed form (`spec.md` §4.9 encoding symmetry).
pub fn encode_unit(unit: &str) -> CodecResult<Vec<u8>> {
    let len = unit.len();
    if len == 0 || len > 255 {
        return Err(CodecError::LengthMismatch {
            offset: 0,
            expected: 1,
            actual: len,
        });
    }
    let mut out = Vec::with_capacity(1 + len);
    out.push(len as u8);
    for (i, c) in unit.chars().rev().enumerate() {
        if !c.is_ascii() {
            return Err(CodecError::NonAscii {
                offset: i,
                byte: c as u32 as u8,
            });
        }
        out.push(c as u8);
    }
    Ok(out)
}
