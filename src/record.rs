//! # C8 — record assembler
//!
//! Ties the DIB (C6), VIB (C7) and data decoder (C4) together into one
//! logical variable-data record, applying the PlainText ASCII-unit
//! sub-protocol (C9) and the VIB's value transformers along the way
//! (`spec.md` §4.8).

use crate::ascii_unit;
use crate::byte_source::ByteSource;
use crate::data;
use crate::data_rules;
use crate::dib::{self, DataDib, Dib};
use crate::dif::ValueFunction;
use crate::direction::Direction;
use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use crate::vif;

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Data(DataRecord),
    /// `spec.md` §4.6: idle filler DIBs carry no data and are skipped.
    Idle,
    /// Manufacturer-specific data header. The payload's length isn't
    /// declared by the DIB itself, so parsing a record stops here;
    /// whatever framing delivered this `ByteSource` is responsible for
    /// locating the next record (or the end of the telegram).
    Manufacturer { more_records_follow: bool },
    GlobalReadout,
    ReadoutSelection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    pub description: Option<&'static str>,
    pub unit: Option<String>,
    pub function: ValueFunction,
    pub storage_number: u64,
    pub tariff: u32,
    pub sub_unit: u32,
    pub register_number: Option<u32>,
    pub value: Value,
    /// Set when the VIB's chain included an Error VIFE (`spec.md` §4.7):
    /// the value, if any, should be read as a fault/error code rather
    /// than a measurement.
    pub error_record: bool,
}

/// `Record::parse` (`spec.md` §4.8): DIB, then (for data records) VIB,
/// then the ASCII-unit sub-protocol if the VIB is PlainText, then the
/// resolved `Data`, with the VIB's transformer chain applied to a valid
/// numeric result.
pub async fn parse<S>(direction: Direction, source: &mut S) -> CodecResult<Record>
where
    S: ByteSource + ?Sized,
{
    match dib::parse(direction, source).await? {
        Dib::IdleFiller => Ok(Record::Idle),
        Dib::GlobalReadout => Ok(Record::GlobalReadout),
        Dib::ReadoutSelection(_) => Ok(Record::ReadoutSelection),
        Dib::Manufacturer { more_records_follow } => {
            Ok(Record::Manufacturer { more_records_follow })
        }
        Dib::Data(data_dib) => parse_data_record(direction, source, data_dib).await.map(Record::Data),
    }
}

async fn parse_data_record<S>(
    direction: Direction,
    source: &mut S,
    data_dib: DataDib,
) -> CodecResult<DataRecord>
where
    S: ByteSource + ?Sized,
{
    let vib = vif::parse(direction, source).await?;

    let unit = if vib.is_plain_text {
        Some(ascii_unit::parse_unit(source).await?)
    } else {
        vib.unit.map(str::to_string)
    };

    let data_type = data_rules::resolve(data_dib.data_support, &vib.requires).ok_or(
        CodecError::NoMatchingType {
            offset: source.position(),
        },
    )?;

    let raw_value = data::parse(data_type, source).await?;
    let value = apply_transformers(raw_value, &vib.transformers, vib.primary_code);

    Ok(DataRecord {
        description: vib.description,
        unit,
        function: data_dib.value_function,
        storage_number: data_dib.storage_number,
        tariff: data_dib.tariff,
        sub_unit: data_dib.sub_unit,
        register_number: data_dib.register_number,
        value,
        error_record: vib.error_record,
    })
}

/// Applies the VIB's transformer chain to a valid numeric payload
/// (`spec.md` §4.8 step 5); sensor-invalid markers and non-numeric
/// values (strings, bit arrays, temporal values) pass through
/// unchanged — a transformer only ever scales a reading's physical
/// quantity.
fn apply_transformers(
    raw: Value,
    transformers: &crate::value_transformer::TransformerChain,
    code: u8,
) -> Value {
    match raw {
        Value::Integer { valid: true, n } if transformers.preserves_integer(code) => {
            Value::Integer {
                valid: true,
                n: transformers.apply(n as f64, code).round() as i64,
            }
        }
        Value::Integer { valid: true, n } => Value::Float {
            valid: true,
            x: transformers.apply(n as f64, code),
        },
        Value::Float { valid: true, x } => Value::Float {
            valid: true,
            x: transformers.apply(x, code),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceByteSource;

    #[tokio::test]
    async fn scenario_1_energy_wh_integer_stays_integer_for_an_exact_scale() {
        // DIB=0x04 (data field 4, no ext), VIB=0x03 (Energy Wh, code 3),
        // data = 0x39 0x30 0x00 0x00 (LE 12345). Code 3's scale is
        // 10^(3-3) = 10^0, an exact integer multiplier.
        let mut src = SliceByteSource::new(&[0x04, 0x03, 0x39, 0x30, 0x00, 0x00]);
        let record = parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
        match record {
            Record::Data(d) => {
                assert_eq!(d.description, Some("Energy"));
                assert_eq!(d.unit, Some("Wh".to_string()));
                assert_eq!(d.value, Value::Integer { valid: true, n: 12345 });
            }
            other => panic!("expected a data record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scenario_2_error_flags_resolve_to_boolean_d_bits() {
        // DIB=0x02 (data field 2), VIB="FD 17" (Second Extension -> ErrorFlags),
        // data = 0x00 0x00 (16 zero bits).
        let mut src = SliceByteSource::new(&[0x02, 0xFD, 0x17, 0x00, 0x00]);
        let record = parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
        match record {
            Record::Data(d) => {
                assert_eq!(d.description, Some("ErrorFlags"));
                match d.value {
                    Value::Bits { valid: true, ref bits } => {
                        assert_eq!(bits.len(), 16);
                        assert!(bits.iter().all(|&b| !b));
                    }
                    other => panic!("expected Bits, got {other:?}"),
                }
            }
            other => panic!("expected a data record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn idle_filler_dib_short_circuits_before_any_vib() {
        let mut src = SliceByteSource::new(&[0x2F]);
        let record = parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
        assert_eq!(record, Record::Idle);
    }

    #[tokio::test]
    async fn manufacturer_dib_stops_parsing_before_any_vib() {
        let mut src = SliceByteSource::new(&[0x0F]);
        let record = parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
        assert_eq!(
            record,
            Record::Manufacturer {
                more_records_follow: false
            }
        );
    }

    #[tokio::test]
    async fn plain_text_unit_comes_from_the_ascii_sub_protocol() {
        // DIB=0x84,0x01 (storage chain), VIB="7C" (PlainText, ext clear),
        // unit "kWh" stored reversed (len=3,'h','W','k'), data = C_4 4096.
        let mut src = SliceByteSource::new(&[
            0x84, 0x01, 0x7C, 0x03, b'h', b'W', b'k', 0x00, 0x10, 0x00, 0x00,
        ]);
        let record = parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
        match record {
            Record::Data(d) => {
                assert_eq!(d.unit, Some("kWh".to_string()));
                assert_eq!(d.value, Value::Integer { valid: true, n: 4096 });
            }
            other => panic!("expected a data record, got {other:?}"),
        }
    }
}
