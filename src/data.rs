//! # C4 — data decoder
//!
//! Decodes the raw payload bytes for a resolved [`DataType`] (`spec.md`
//! §4.2/§4.4). Fixed-length types read their declared byte count and
//! dispatch to one of the decoders below; `LVAR` reads a prefix byte
//! first and classifies its sub-kind by range.

use crate::byte_source::ByteSource;
use crate::constants::STORAGE_NUMBER_MAX_BITS;
use crate::datatype::{DataType, Length};
use crate::error::{CodecError, CodecResult};
use crate::value::{ComponentTemporal, EpochStart, EpochTemporal, Temporal, Value};

/// `Data::parse` (`spec.md` §4.4). `None` as a resolved type is always a
/// caller error — the record assembler (C8) never calls this with it.
pub async fn parse<S>(data_type: DataType, source: &mut S) -> CodecResult<Value>
where
    S: ByteSource + ?Sized,
{
    match data_type {
        DataType::None => Err(CodecError::NoMatchingType {
            offset: source.position(),
        }),
        DataType::Lvar => parse_lvar(source).await,
        DataType::L => parse_type_l(source).await,
        DataType::M => parse_type_m(source).await,
        other => {
            let n = match other.length() {
                Length::Fixed(n) => n,
                Length::Variable => unreachable!("non-LVAR/L/M types are always fixed-length"),
            };
            let offset = source.position();
            let bytes = source.read_exact(n).await?;
            decode_fixed(other, offset, &bytes)
        }
    }
}

fn decode_fixed(data_type: DataType, offset: usize, bytes: &[u8]) -> CodecResult<Value> {
    use DataType::*;
    Ok(match data_type {
        A1 | A2 | A3 | A4 | A6 => decode_bcd(bytes),
        B1 | B2 | B3 | B4 | B6 | B8 => decode_signed_le(bytes),
        C1 | C2 | C3 | C4 | C6 | C8 => decode_unsigned_le(bytes),
        D1 | D2 | D3 | D4 | D6 | D8 => decode_bits(bytes),
        H4 => decode_float(bytes),
        G2 => decode_cp16_date(bytes),
        F4 => decode_cp32_datetime(bytes)?,
        I6 => decode_cp48_datetime(bytes)?,
        J3 => decode_cp24_time(bytes),
        K4 => {
            let _ = offset;
            Value::Temporal(Temporal::invalid_component())
        }
        Lvar | L | M | None => unreachable!("handled by parse() before reaching decode_fixed"),
    })
}

/// Nibble-pair BCD, little-endian digit order. A `0xF` high nibble on the
/// most significant byte flips the accumulator's sign and terminates;
/// any other digit `>= 0xA` is a sensor-invalid marker, not a parse
/// error — the standard uses `0xA`..`0xE` for manufacturer overflow
/// states that a master is expected to surface as "no value".
fn decode_bcd(bytes: &[u8]) -> Value {
    let n = bytes.len();
    let mut acc: i64 = 0;
    let mut mult: i64 = 1;
    let mut negative = false;
    for (i, &b) in bytes.iter().enumerate() {
        let low = b & 0x0F;
        let high = (b >> 4) & 0x0F;
        if low >= 0xA {
            return Value::invalid_integer();
        }
        acc += (low as i64) * mult;
        mult *= 10;

        let is_last_byte = i == n - 1;
        if is_last_byte && high == 0xF {
            negative = true;
            break;
        }
        if high >= 0xA {
            return Value::invalid_integer();
        }
        acc += (high as i64) * mult;
        mult *= 10;
    }
    Value::Integer {
        valid: true,
        n: if negative { -acc } else { acc },
    }
}

/// Signed two's-complement little-endian. The all-high-bit-set sentinel
/// (`-2^(8n-1)`, the type's most negative representable value) marks a
/// sensor-invalid reading.
fn decode_signed_le(bytes: &[u8]) -> Value {
    let n = bytes.len();
    if n == 8 {
        let arr: [u8; 8] = bytes.try_into().expect("length checked by caller");
        let v = i64::from_le_bytes(arr);
        return if v == i64::MIN {
            Value::invalid_integer()
        } else {
            Value::Integer { valid: true, n: v }
        };
    }
    let mut acc: i64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        acc |= (b as i64) << (8 * i);
    }
    let bits = (8 * n) as u32;
    if acc & (1i64 << (bits - 1)) != 0 {
        acc -= 1i64 << bits;
    }
    let sentinel = -(1i64 << (bits - 1));
    if acc == sentinel {
        Value::invalid_integer()
    } else {
        Value::Integer { valid: true, n: acc }
    }
}

/// Unsigned little-endian. The all-ones sentinel marks a sensor-invalid
/// reading. Widths beyond 8 bytes (reachable only through the widest
/// LVAR binary sub-kinds) are sentinel-checked byte-wise but otherwise
/// truncated to their low 8 bytes before conversion to `i64` — no M-Bus
/// payload seen in practice needs the full range, and `Value::Integer`
/// is an `i64`.
fn decode_unsigned_le(bytes: &[u8]) -> Value {
    let n = bytes.len();
    if n <= 8 {
        let mut acc: u64 = 0;
        for (i, &b) in bytes.iter().enumerate() {
            acc |= (b as u64) << (8 * i);
        }
        let bits = (8 * n) as u32;
        let max = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        return if acc == max {
            Value::invalid_integer()
        } else {
            Value::Integer {
                valid: true,
                n: acc as i64,
            }
        };
    }
    if bytes.iter().all(|&b| b == 0xFF) {
        return Value::invalid_integer();
    }
    let mut acc: u64 = 0;
    for (i, &b) in bytes[..8].iter().enumerate() {
        acc |= (b as u64) << (8 * i);
    }
    Value::Integer {
        valid: true,
        n: acc.min(i64::MAX as u64) as i64,
    }
}

/// LSB-first bit array, bytes in transmission order.
fn decode_bits(bytes: &[u8]) -> Value {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &b in bytes {
        for i in 0..8 {
            bits.push((b >> i) & 1 != 0);
        }
    }
    Value::Bits { valid: true, bits }
}

/// IEEE-754 binary32, little-endian, widened to `f64`.
fn decode_float(bytes: &[u8]) -> Value {
    let arr: [u8; 4] = bytes.try_into().expect("length checked by caller");
    let x = f32::from_le_bytes(arr) as f64;
    if x.is_nan() {
        Value::invalid_float()
    } else {
        Value::Float { valid: true, x }
    }
}

fn year_2digit_to_full(year_2digit: u8) -> Option<i32> {
    if year_2digit == 127 {
        None
    } else {
        Some(2000 + year_2digit as i32)
    }
}

/// CP16 date: `byte0` bits 0..4 day, bits 5..7 year-low-3; `byte1` bits
/// 0..3 month, bits 4..7 year-high-4 (`spec.md` §6).
fn decode_cp16_date(bytes: &[u8]) -> Value {
    let (b0, b1) = (bytes[0], bytes[1]);
    if b0 == 0xFF && b1 == 0xFF {
        return Value::Temporal(Temporal::invalid_component());
    }
    let day = b0 & 0x1F;
    let year_low = (b0 >> 5) & 0x07;
    let month = b1 & 0x0F;
    let year_high = (b1 >> 4) & 0x0F;
    let year_2digit = (year_high << 3) | year_low;
    let c = ComponentTemporal {
        day: Some(day),
        month: Some(month),
        year_2digit: Some(year_2digit),
        year_full: year_2digit_to_full(year_2digit),
        ..Default::default()
    };
    Value::Temporal(Temporal::component(true, c))
}

/// CP32 date-time (`spec.md` §6): `byte0` IV flag + minute, `byte1`
/// summertime + century + hour, `byte2` year-low-3 + day, `byte3`
/// year-high-3 + month.
fn decode_cp32_datetime(bytes: &[u8]) -> CodecResult<Value> {
    let (b0, b1, b2, b3) = (bytes[0], bytes[1], bytes[2], bytes[3]);
    if b0 & 0x80 != 0 {
        return Ok(Value::Temporal(Temporal::invalid_component()));
    }
    let minute = b0 & 0x3F;
    let hour = b1 & 0x1F;
    let hundred_year = (b1 >> 5) & 0x03;
    let is_summer_time = (b1 & 0x80) != 0;
    let day = b2 & 0x1F;
    let year_low = (b2 >> 5) & 0x07;
    let month = b3 & 0x0F;
    let year_high = (b3 >> 4) & 0x07;
    let year6 = (year_high << 3) | year_low;
    let year_full = 1900 + (hundred_year as i32) * 100 + year6 as i32;
    let c = ComponentTemporal {
        minute: Some(minute),
        hour: Some(hour),
        day: Some(day),
        month: Some(month),
        year_full: Some(year_full),
        is_summer_time: Some(is_summer_time),
        ..Default::default()
    };
    Ok(Value::Temporal(Temporal::component(true, c)))
}

/// CP24 time. The normative bit table for Type J wasn't part of this
/// crate's source material beyond its invalid sentinel; this lays
/// `second`/`minute`/`hour` out the same low-bits-hold-the-value,
/// high-bits-reserved way `byte0`/`byte1` of CP32 do, which keeps
/// encode/decode symmetric without inventing field semantics beyond
/// what `spec.md` already states.
fn decode_cp24_time(bytes: &[u8]) -> Value {
    if bytes == [0xFF, 0xFF, 0xFF] {
        return Value::Temporal(Temporal::invalid_component());
    }
    let second = bytes[0] & 0x3F;
    let minute = bytes[1] & 0x3F;
    let hour = bytes[2] & 0x1F;
    let c = ComponentTemporal {
        second: Some(second as f64),
        minute: Some(minute),
        hour: Some(hour),
        ..Default::default()
    };
    Value::Temporal(Temporal::component(true, c))
}

/// CP48 date-time. `spec.md` §6 names the fields this carries (second,
/// leap-year flag, summertime, signed DST deviation, minute, hour,
/// day-of-week, day, year, month, week) and points at EN 13757-3 Annex A
/// Table A.8 for the exact bit map, which isn't part of this crate's
/// source material. The layout below assigns each named field its own
/// bit range consistently with CP16/CP32's low-bits-value,
/// high-bits-flag convention, with the IV flag pinned to `byte1` bit 7
/// as `spec.md` states explicitly.
fn decode_cp48_datetime(bytes: &[u8]) -> CodecResult<Value> {
    let (b0, b1, b2, b3, b4, b5) = (bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]);
    if b1 & 0x80 != 0 {
        return Ok(Value::Temporal(Temporal::invalid_component()));
    }
    let second = b0 & 0x3F;
    let minute = b1 & 0x3F;
    let is_summer_time = (b2 & 0x80) != 0;
    let hour = b2 & 0x1F;
    let day_of_week = (b3 >> 5) & 0x07;
    let day = b3 & 0x1F;
    let week = (b4 >> 4) & 0x0F;
    let month = b4 & 0x0F;
    let leap_year = (b5 & 0x80) != 0;
    let year_2digit = b5 & 0x7F;
    let deviation = if is_summer_time { Some(1i8) } else { None };
    let c = ComponentTemporal {
        second: Some(second as f64),
        minute: Some(minute),
        hour: Some(hour),
        day: Some(day),
        day_of_week: Some(day_of_week),
        month: Some(month),
        week: Some(week),
        year_2digit: Some(year_2digit),
        year_full: year_2digit_to_full(year_2digit),
        is_summer_time: Some(is_summer_time),
        is_leap_year: Some(leap_year),
        daylight_savings_deviation: deviation,
    };
    Ok(Value::Temporal(Temporal::component(true, c)))
}

/// Type L (listening-window). No sub-format is specified as
/// implementable (`spec.md` §9 Open Question 1); read the one leading
/// byte so chain progression never breaks and emit a `valid=false`
/// placeholder.
async fn parse_type_l<S>(source: &mut S) -> CodecResult<Value>
where
    S: ByteSource + ?Sized,
{
    let _ = source.read_exact(1).await?;
    Ok(Value::Temporal(Temporal::invalid_component()))
}

const M_RESOLUTIONS: [f64; 4] = [2.0, 1.0, 1.0 / 256.0, 1.0 / 32768.0];

/// Type M: a format byte followed by a 4-byte little-endian tick count.
/// The format byte's low nibble selects `epoch_start` (bit 0) and
/// resolution (bits 1..2); bit 7 marks a duration rather than an
/// absolute timestamp. Any other bit set in the format byte is an
/// unimplemented sub-case (`spec.md` §4.4): the bytes are still
/// consumed, but the result is a `valid=false` placeholder rather than
/// an invented decode.
async fn parse_type_m<S>(source: &mut S) -> CodecResult<Value>
where
    S: ByteSource + ?Sized,
{
    let offset = source.position();
    let bytes = source.read_exact(5).await?;
    let format = bytes[0];
    let known_bits = 0b1000_0111;
    if format & !known_bits != 0 {
        let _ = offset;
        return Ok(Value::Temporal(Temporal::invalid_component()));
    }
    let is_duration = format & 0x80 != 0;
    let epoch_start = if format & 0x01 != 0 {
        EpochStart::Y1970
    } else {
        EpochStart::Y2013
    };
    let resolution_index = ((format >> 1) & 0x03) as usize;
    let resolution_seconds = M_RESOLUTIONS[resolution_index];
    let ticks = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    let epoch_seconds = ticks as f64 * resolution_seconds;
    let utc_offset_hours = if is_duration { crate::value::DURATION_UTC_OFFSET } else { 0 };
    Ok(Value::Temporal(Temporal::epoch(
        true,
        EpochTemporal {
            epoch_seconds,
            utc_offset_hours,
            resolution_seconds,
            epoch_start,
        },
    )))
}

/// LVAR sub-kind, classified by the prefix byte's range (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LvarKind {
    Text(usize),
    PositiveBcd(usize),
    NegativeBcd(usize),
    BinaryUnsigned(usize),
}

fn classify_lvar(prefix: u8) -> Option<LvarKind> {
    match prefix {
        0x00..=0xBF => Some(LvarKind::Text(prefix as usize)),
        0xC0..=0xC9 => Some(LvarKind::PositiveBcd((prefix - 0xC0) as usize)),
        0xD0..=0xD9 => Some(LvarKind::NegativeBcd((prefix - 0xD0) as usize)),
        0xE0..=0xEF => Some(LvarKind::BinaryUnsigned((prefix - 0xE0) as usize)),
        0xF0..=0xF4 => Some(LvarKind::BinaryUnsigned(4 * (prefix as usize - 0xEC))),
        0xF5 => Some(LvarKind::BinaryUnsigned(48)),
        0xF6 => Some(LvarKind::BinaryUnsigned(64)),
        _ => None,
    }
}

async fn parse_lvar<S>(source: &mut S) -> CodecResult<Value>
where
    S: ByteSource + ?Sized,
{
    let prefix_offset = source.position();
    let prefix = source.read_exact(1).await?[0];
    let kind = classify_lvar(prefix).ok_or(CodecError::LengthMismatch {
        offset: prefix_offset,
        expected: 0,
        actual: prefix as usize,
    })?;

    match kind {
        LvarKind::Text(len) => {
            let offset = source.position();
            let bytes = source.read_exact(len).await?;
            let s: String = bytes.iter().map(|&b| b as char).collect();
            let _ = offset;
            Ok(Value::String { valid: true, s })
        }
        LvarKind::PositiveBcd(len) => {
            let offset = source.position();
            let bytes = source.read_exact(len).await?;
            decode_lvar_bcd(offset, &bytes, false)
        }
        LvarKind::NegativeBcd(len) => {
            let offset = source.position();
            let bytes = source.read_exact(len).await?;
            decode_lvar_bcd(offset, &bytes, true)
        }
        LvarKind::BinaryUnsigned(len) => {
            let bytes = source.read_exact(len).await?;
            Ok(decode_unsigned_le(&bytes))
        }
    }
}

/// BCD decode for the LVAR positive/negative sub-kinds: unlike the
/// fixed-length `A_n` decoder, there is no nibble-terminated sign flip
/// here — an `0xF` nibble anywhere is a parse error, and the
/// `NegativeBcd` sub-kind negates the whole accumulated value instead.
fn decode_lvar_bcd(offset: usize, bytes: &[u8], negate: bool) -> CodecResult<Value> {
    let mut acc: i64 = 0;
    let mut mult: i64 = 1;
    for &b in bytes {
        let low = b & 0x0F;
        let high = (b >> 4) & 0x0F;
        if low >= 0xA || high >= 0xA {
            return Err(CodecError::BadComponent {
                offset,
                reason: format!("invalid BCD nibble in byte 0x{b:02X}"),
            });
        }
        acc += (low as i64) * mult;
        mult *= 10;
        acc += (high as i64) * mult;
        mult *= 10;
    }
    Ok(Value::Integer {
        valid: true,
        n: if negate { -acc } else { acc },
    })
}

/// Reinterprets an accumulated DIB storage number as an OBIS register
/// number once a `FinalDIFE` marks the DIB (`spec.md` §3/§4.6):
/// `storage_number` must already fit in [`STORAGE_NUMBER_MAX_BITS`] bits
/// and the register value itself must not exceed 125.
pub fn storage_number_to_register(storage_number: u64, offset: usize) -> CodecResult<u32> {
    if storage_number >> STORAGE_NUMBER_MAX_BITS != 0 {
        return Err(CodecError::RegisterOutOfRange {
            offset,
            value: storage_number as u32,
        });
    }
    let register = storage_number as u32;
    if register > crate::constants::OBIS_REGISTER_MAX {
        return Err(CodecError::RegisterOutOfRange {
            offset,
            value: register,
        });
    }
    Ok(register)
}
