//! # C5 — DIF/DIFE chain parser
//!
//! State machine over the Data Information Field and its extension
//! bytes (`spec.md` §4.5). A chain is driven strictly by the extension
//! bit: DIF first, then zero or more DIFEs while the previous byte's
//! bit 7 is set, capped at 10 DataDIFEs plus one optional trailing
//! `FinalDIFE`.

use crate::byte_source::ByteSource;
use crate::constants::*;
use crate::datatype::{self, DataTypeSet};
use crate::direction::Direction;
use crate::error::{CodecError, CodecResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFunction {
    Instantaneous,
    Maximum,
    Minimum,
    Error,
}

impl ValueFunction {
    fn from_bits(function_bits: u8) -> Self {
        match function_bits {
            DIF_FUNCTION_INSTANTANEOUS => ValueFunction::Instantaneous,
            DIF_FUNCTION_MAXIMUM => ValueFunction::Maximum,
            DIF_FUNCTION_MINIMUM => ValueFunction::Minimum,
            DIF_FUNCTION_ERROR => ValueFunction::Error,
            _ => unreachable!("function_bits is masked to 2 bits"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialFunction {
    ManufacturerDataHeader { more_records_follow: bool },
    IdleFiller,
    GlobalReadout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dif {
    DataDif {
        data_support: DataTypeSet,
        value_function: ValueFunction,
        storage_bit0: bool,
        readout_selection: bool,
    },
    SpecialDif(SpecialFunction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dife {
    DataDife {
        storage_nibble: u8,
        tariff: u8,
        sub_unit: u8,
    },
    FinalDife,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifChain {
    pub dif: Dif,
    pub difes: Vec<Dife>,
}

impl Dif {
    /// Recovers the data-field nibble a [`Dif::DataDif`] was parsed from,
    /// by reversing [`datatype::supports_for_data_field`] against the
    /// `data_support` bitset it carries. `ReadoutSelection` reports its
    /// own fixed nibble directly, since its `data_support` is always
    /// empty (`dif.rs::parse_dif_byte`).
    fn data_field_nibble(data_support: DataTypeSet, readout_selection: bool) -> u8 {
        if readout_selection {
            return DIF_SPECIAL_READOUT_SELECTION;
        }
        for nibble in 0u8..=0x0E {
            if nibble == 0x08 {
                continue;
            }
            if datatype::supports_for_data_field(nibble) == data_support {
                return nibble;
            }
        }
        unreachable!("data_support was produced by supports_for_data_field for some nibble")
    }

    /// Encodes this field back to its one-byte wire form, per `spec.md`
    /// §4.9. `extends` is the chain's own knowledge of whether a DIFE
    /// follows — the DIF itself doesn't know.
    pub fn to_byte(&self, extends: bool) -> u8 {
        let ext = if extends { EXTENSION_BIT } else { 0 };
        match self {
            Dif::SpecialDif(SpecialFunction::ManufacturerDataHeader {
                more_records_follow: false,
            }) => DIF_SPECIAL_MANUFACTURER_DATA,
            Dif::SpecialDif(SpecialFunction::ManufacturerDataHeader {
                more_records_follow: true,
            }) => DIF_SPECIAL_MORE_RECORDS_FOLLOW,
            Dif::SpecialDif(SpecialFunction::IdleFiller) => DIF_SPECIAL_IDLE_FILLER,
            Dif::SpecialDif(SpecialFunction::GlobalReadout) => DIF_SPECIAL_GLOBAL_READOUT,
            Dif::DataDif {
                data_support,
                value_function,
                storage_bit0,
                readout_selection,
            } => {
                let nibble = Self::data_field_nibble(*data_support, *readout_selection);
                let function_bits = match value_function {
                    ValueFunction::Instantaneous => DIF_FUNCTION_INSTANTANEOUS,
                    ValueFunction::Maximum => DIF_FUNCTION_MAXIMUM,
                    ValueFunction::Minimum => DIF_FUNCTION_MINIMUM,
                    ValueFunction::Error => DIF_FUNCTION_ERROR,
                };
                let storage_bit = if *storage_bit0 { DIF_MASK_STORAGE_BIT0 } else { 0 };
                ext | storage_bit | function_bits | nibble
            }
        }
    }
}

impl Dife {
    /// Encodes this extension field back to its one-byte wire form.
    pub fn to_byte(&self, extends: bool) -> u8 {
        let ext = if extends { EXTENSION_BIT } else { 0 };
        match self {
            Dife::FinalDife => DIFE_FINAL,
            Dife::DataDife {
                storage_nibble,
                tariff,
                sub_unit,
            } => ext | (*sub_unit << 6) | (*tariff << 4) | storage_nibble,
        }
    }
}

impl DifChain {
    /// `DIB::to_bytes` (`spec.md` §8): reconstructs the exact wire bytes
    /// this chain would have been parsed from — every field but the last
    /// carries the extension bit.
    pub fn to_bytes(&self) -> Vec<u8> {
        let total = 1 + self.difes.len();
        let mut out = Vec::with_capacity(total);
        out.push(self.dif.to_byte(total > 1));
        for (i, dife) in self.difes.iter().enumerate() {
            let is_last = i + 1 == self.difes.len();
            out.push(dife.to_byte(!is_last));
        }
        out
    }
}

fn parse_dif_byte(byte: u8, direction: Direction, offset: usize) -> CodecResult<Dif> {
    match byte & !EXTENSION_BIT {
        DIF_SPECIAL_MANUFACTURER_DATA => {
            let _ = direction;
            Ok(Dif::SpecialDif(SpecialFunction::ManufacturerDataHeader {
                more_records_follow: false,
            }))
        }
        DIF_SPECIAL_MORE_RECORDS_FOLLOW => {
            if !direction.matches(Direction::SLAVE_TO_MASTER) {
                return Err(CodecError::DirectionMismatch { offset, code: byte });
            }
            Ok(Dif::SpecialDif(SpecialFunction::ManufacturerDataHeader {
                more_records_follow: true,
            }))
        }
        DIF_SPECIAL_IDLE_FILLER => Ok(Dif::SpecialDif(SpecialFunction::IdleFiller)),
        DIF_SPECIAL_GLOBAL_READOUT => {
            if !direction.matches(Direction::MASTER_TO_SLAVE) {
                return Err(CodecError::DirectionMismatch { offset, code: byte });
            }
            Ok(Dif::SpecialDif(SpecialFunction::GlobalReadout))
        }
        data_field_byte => {
            let data_field = data_field_byte & DIF_MASK_DATA_FIELD;
            let readout_selection = data_field_byte == DIF_SPECIAL_READOUT_SELECTION;
            if readout_selection && !direction.matches(Direction::MASTER_TO_SLAVE) {
                return Err(CodecError::DirectionMismatch { offset, code: byte });
            }
            let function_bits = data_field_byte & DIF_MASK_FUNCTION;
            let storage_bit0 = data_field_byte & DIF_MASK_STORAGE_BIT0 != 0;
            let data_support = if readout_selection {
                DataTypeSet::empty()
            } else {
                datatype::supports_for_data_field(data_field)
            };
            Ok(Dif::DataDif {
                data_support,
                value_function: ValueFunction::from_bits(function_bits),
                storage_bit0,
                readout_selection,
            })
        }
    }
}

fn parse_dife_byte(byte: u8) -> Dife {
    if byte & !EXTENSION_BIT == DIFE_FINAL {
        Dife::FinalDife
    } else {
        Dife::DataDife {
            storage_nibble: byte & DIFE_MASK_STORAGE_NIBBLE,
            tariff: (byte & DIFE_MASK_TARIFF) >> 4,
            sub_unit: (byte & DIFE_MASK_SUB_UNIT) >> 6,
        }
    }
}

/// Parses a full DIF/DIFE chain (`spec.md` §4.5).
pub async fn parse_chain<S>(direction: Direction, source: &mut S) -> CodecResult<DifChain>
where
    S: ByteSource + ?Sized,
{
    let dif_offset = source.position();
    let dif_byte = source.read_exact(1).await?[0];
    let dif = parse_dif_byte(dif_byte, direction, dif_offset)?;
    let mut extends = dif_byte & EXTENSION_BIT != 0;

    if matches!(dif, Dif::SpecialDif(_)) {
        if extends {
            return Err(CodecError::ChainStructure {
                offset: dif_offset,
                reason: "a SpecialDIF must terminate its chain".to_string(),
            });
        }
        return Ok(DifChain { dif, difes: Vec::new() });
    }

    let mut difes = Vec::new();
    while extends {
        if difes.len() >= DIF_CHAIN_MAX_DIFE {
            return Err(CodecError::ChainTooLong {
                offset: source.position(),
                limit: DIF_CHAIN_MAX_DIFE,
            });
        }
        let offset = source.position();
        let byte = source.read_exact(1).await?[0];
        let dife = parse_dife_byte(byte);
        extends = byte & EXTENSION_BIT != 0;
        if matches!(dife, Dife::FinalDife) && extends {
            return Err(CodecError::ChainStructure {
                offset,
                reason: "a FinalDIFE must be the last byte of the chain".to_string(),
            });
        }
        difes.push(dife);
    }

    Ok(DifChain { dif, difes })
}

/// Accumulated storage number, tariff and sub-unit from a [`DifChain`]'s
/// `DataDife`s, per the per-position formula in `spec.md` §4.5. Stops
/// accumulating (and flags `register_number`) at the first `FinalDife`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accumulated {
    pub storage_number: u64,
    pub tariff: u32,
    pub sub_unit: u32,
    pub register_number: bool,
}

pub fn accumulate(dif: &Dif, difes: &[Dife]) -> Accumulated {
    let mut acc = Accumulated::default();
    if let Dif::DataDif { storage_bit0, .. } = dif {
        if *storage_bit0 {
            acc.storage_number = 1;
        }
    }
    for (k0, dife) in difes.iter().enumerate() {
        let k = (k0 + 1) as u32;
        match dife {
            Dife::DataDife {
                storage_nibble,
                tariff,
                sub_unit,
            } => {
                acc.storage_number += (*storage_nibble as u64) << (4 * (k - 1) + 1);
                acc.tariff += (*tariff as u32) << (2 * (k - 1));
                acc.sub_unit += (*sub_unit as u32) << (k - 1);
            }
            Dife::FinalDife => {
                acc.register_number = true;
            }
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceByteSource;

    #[tokio::test]
    async fn simple_data_dif_with_no_extension() {
        let mut src = SliceByteSource::new(&[0x04]);
        let chain = parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
        assert!(chain.difes.is_empty());
        match chain.dif {
            Dif::DataDif {
                value_function,
                storage_bit0,
                ..
            } => {
                assert_eq!(value_function, ValueFunction::Instantaneous);
                assert!(!storage_bit0);
            }
            _ => panic!("expected DataDif"),
        }
    }

    #[tokio::test]
    async fn extension_chain_accumulates_storage_number() {
        // DIF 0x84 (ext, storage bit0=1, data field 4) then DIFE 0x01 (storage nibble 1)
        let mut src = SliceByteSource::new(&[0x84, 0x01]);
        let chain = parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
        let acc = accumulate(&chain.dif, &chain.difes);
        assert_eq!(acc.storage_number, 2);
    }

    #[tokio::test]
    async fn special_dif_with_extension_bit_is_chain_structure_error() {
        let mut src = SliceByteSource::new(&[0xAF, 0x00]);
        let err = parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap_err();
        assert!(matches!(err, CodecError::ChainStructure { .. }));
    }

    #[tokio::test]
    async fn chain_longer_than_ten_difes_is_too_long() {
        let mut bytes = vec![0x84u8];
        for _ in 0..11 {
            bytes.push(0x81); // ext bit set, storage nibble 1
        }
        bytes.push(0x01); // 12th DIFE, no ext bit
        let mut src = SliceByteSource::new(&bytes);
        let err = parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap_err();
        assert!(matches!(err, CodecError::ChainTooLong { .. }));
    }

    #[tokio::test]
    async fn final_dife_not_last_is_chain_structure_error() {
        let mut src = SliceByteSource::new(&[0x84, 0x80, 0x00]);
        let err = parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap_err();
        assert!(matches!(err, CodecError::ChainStructure { .. }));
    }

    #[tokio::test]
    async fn global_readout_rejects_slave_to_master() {
        let mut src = SliceByteSource::new(&[0x7F]);
        let err = parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap_err();
        assert!(matches!(err, CodecError::DirectionMismatch { .. }));
    }

    #[tokio::test]
    async fn readout_selection_rejects_slave_to_master() {
        let mut src = SliceByteSource::new(&[0x08]);
        let err = parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap_err();
        assert!(matches!(err, CodecError::DirectionMismatch { .. }));
    }

    #[tokio::test]
    async fn more_records_follow_rejects_master_to_slave() {
        let mut src = SliceByteSource::new(&[0x1F]);
        let err = parse_chain(Direction::MASTER_TO_SLAVE, &mut src).await.unwrap_err();
        assert!(matches!(err, CodecError::DirectionMismatch { .. }));
    }

    #[tokio::test]
    async fn chain_parse_then_to_bytes_round_trips() {
        let cases: &[&[u8]] = &[
            &[0x04],
            &[0x84, 0x01],
            &[0x84, 0x81, 0x00],
            &[0x84, 0x81, 0x82, 0x01],
        ];
        for bytes in cases {
            let mut src = SliceByteSource::new(bytes);
            let chain = parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
            assert_eq!(&chain.to_bytes(), bytes);
        }
    }

    #[tokio::test]
    async fn random_difes_accumulate_per_position_formula() {
        // DIF with storage_bit0=1 (0xC4: ext+storage_bit0+data field 4),
        // then a chain of distinct storage nibbles, each with its own ext bit.
        let nibbles: [u8; 5] = [3, 7, 1, 9, 2];
        let mut bytes = vec![0xC4u8];
        for (i, n) in nibbles.iter().enumerate() {
            let last = i + 1 == nibbles.len();
            let ext = if last { 0 } else { EXTENSION_BIT };
            bytes.push(ext | n);
        }
        let mut src = SliceByteSource::new(&bytes);
        let chain = parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
        let acc = accumulate(&chain.dif, &chain.difes);
        let mut expected: u64 = 1; // storage_bit0
        for (i, n) in nibbles.iter().enumerate() {
            expected += (*n as u64) << (4 * i + 1);
        }
        assert_eq!(acc.storage_number, expected);
        assert_eq!(&chain.to_bytes(), &bytes);
    }
}
