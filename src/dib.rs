//! # C6 — DIB assembler
//!
//! Composes a parsed DIF/DIFE chain (C5) into one of the logical DIB
//! subclasses `spec.md` §4.6 names, accumulating storage number, tariff
//! and sub-unit along the way.

use crate::byte_source::ByteSource;
use crate::data::storage_number_to_register;
use crate::datatype::DataTypeSet;
use crate::constants::{
    DIF_SPECIAL_GLOBAL_READOUT, DIF_SPECIAL_IDLE_FILLER, DIF_SPECIAL_MANUFACTURER_DATA,
    DIF_SPECIAL_MORE_RECORDS_FOLLOW,
};
use crate::dif::{self, Dif, DifChain, SpecialFunction, ValueFunction};
use crate::direction::Direction;
use crate::error::{CodecError, CodecResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dib {
    Data(DataDib),
    ReadoutSelection(DifChain),
    Manufacturer { more_records_follow: bool },
    IdleFiller,
    GlobalReadout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDib {
    pub data_support: DataTypeSet,
    pub value_function: ValueFunction,
    pub storage_number: u64,
    pub tariff: u32,
    pub sub_unit: u32,
    pub register_number: Option<u32>,
    /// The chain this block was assembled from, kept (flat, no
    /// prev/next pointers — `spec.md` §9) so [`Dib::to_bytes`] can
    /// reconstruct the exact wire bytes; the accumulated fields above
    /// are a derived, more convenient view of the same data.
    chain: DifChain,
}

/// `DIB::parse` (`spec.md` §4.6): runs the chain parser (C5) then
/// dispatches on the resulting DIF variant and flags.
pub async fn parse<S>(direction: Direction, source: &mut S) -> CodecResult<Dib>
where
    S: ByteSource + ?Sized,
{
    let chain_offset = source.position();
    let DifChain { dif, difes } = dif::parse_chain(direction, source).await?;

    match dif {
        Dif::DataDif {
            data_support,
            value_function,
            readout_selection,
            ..
        } => {
            if readout_selection {
                if !difes.is_empty() {
                    return Err(CodecError::ChainStructure {
                        offset: chain_offset,
                        reason: "a readout-selection DIF admits no DIFEs".to_string(),
                    });
                }
                return Ok(Dib::ReadoutSelection(DifChain { dif, difes }));
            }

            let acc = dif::accumulate(&dif, &difes);
            let register_number = if acc.register_number {
                Some(storage_number_to_register(acc.storage_number, chain_offset)?)
            } else {
                None
            };
            Ok(Dib::Data(DataDib {
                data_support,
                value_function,
                storage_number: acc.storage_number,
                tariff: acc.tariff,
                sub_unit: acc.sub_unit,
                register_number,
                chain: DifChain { dif, difes },
            }))
        }
        Dif::SpecialDif(special) => {
            if !difes.is_empty() {
                return Err(CodecError::ChainStructure {
                    offset: chain_offset,
                    reason: "a SpecialDIF admits no DIFEs".to_string(),
                });
            }
            Ok(match special {
                SpecialFunction::ManufacturerDataHeader { more_records_follow } => {
                    Dib::Manufacturer { more_records_follow }
                }
                SpecialFunction::IdleFiller => Dib::IdleFiller,
                SpecialFunction::GlobalReadout => Dib::GlobalReadout,
            })
        }
    }
}

impl Dib {
    /// `DIB::to_bytes` (`spec.md` §4.9/§8): the inverse of [`parse`].
    /// `DataDib`/`ReadoutSelectionDIB` reconstruct their chain's exact
    /// wire bytes; the three special, DIFE-less DIBs each serialise to
    /// their single fixed byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Dib::Data(d) => d.chain.to_bytes(),
            Dib::ReadoutSelection(chain) => chain.to_bytes(),
            Dib::Manufacturer {
                more_records_follow: false,
            } => vec![DIF_SPECIAL_MANUFACTURER_DATA],
            Dib::Manufacturer {
                more_records_follow: true,
            } => vec![DIF_SPECIAL_MORE_RECORDS_FOLLOW],
            Dib::IdleFiller => vec![DIF_SPECIAL_IDLE_FILLER],
            Dib::GlobalReadout => vec![DIF_SPECIAL_GLOBAL_READOUT],
        }
    }
}
