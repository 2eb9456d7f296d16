//! # C7 — VIF/VIFE chain parser
//!
//! Parses the value-information header: a VIF followed by up to 10
//! VIFEs, with the table used for each step depending on both the
//! current descriptor's kind and the chain's history (`spec.md` §4.7).

use crate::byte_source::ByteSource;
use crate::constants::{EXTENSION_BIT, VIF_CHAIN_MAX_VIFE};
use crate::data_rules::Requires;
use crate::direction::Direction;
use crate::error::{CodecError, CodecResult};
use crate::value_transformer::TransformerChain;
use crate::vif_tables::{self, Descriptor, FieldKind, Table};

/// The accumulated value-information block (`spec.md` §4.7 "VIB
/// effective semantics"): description, unit, the ordered chain of value
/// transformers, and the `Requires` alternatives that will feed the
/// data-rules algebra (C3).
#[derive(Debug, Clone)]
pub struct Vib {
    pub description: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub transformers: TransformerChain,
    pub requires: Requires,
    pub is_plain_text: bool,
    pub error_record: bool,
    pub field_count: usize,
    /// The leading VIF byte, kept because it carries the exponent nibble
    /// every `ValueTransformer` in the chain is parameterised by
    /// (`spec.md` §6) — Combinable VIFEs refine the transformer itself,
    /// not this byte.
    pub primary_code: u8,
    /// The exact bytes this VIB was parsed from. The Primary/First/Second
    /// Extension and Combinable tables aren't exhaustively populated
    /// (`vif_tables.rs`), so a reverse code→byte lookup isn't always
    /// invertible; keeping the wire bytes themselves makes
    /// [`Vib::to_bytes`] exact regardless of table coverage, the same way
    /// a link-layer frame decoder typically keeps the raw telegram around
    /// for re-transmission rather than re-deriving it from parsed fields.
    raw_bytes: Vec<u8>,
}

impl Vib {
    /// `VIB::to_bytes` (`spec.md` §4.9/§8): replays the bytes this VIB
    /// was parsed from.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.raw_bytes.clone()
    }
}

fn check_position_rules(
    kind: FieldKind,
    position: usize,
    last_was_extension: bool,
    last_was_manufacturer: bool,
    offset: usize,
) -> CodecResult<()> {
    if last_was_manufacturer && kind != FieldKind::Manufacturer {
        return Err(CodecError::ChainStructure {
            offset,
            reason: "only a further Manufacturer VIFE may follow a Manufacturer field".to_string(),
        });
    }
    match kind {
        FieldKind::True => {
            if position != 0 && !last_was_extension {
                return Err(CodecError::ChainStructure {
                    offset,
                    reason: "a True-semantics field may appear only at position 0 or right after an Extension field".to_string(),
                });
            }
        }
        FieldKind::Combinable | FieldKind::Action | FieldKind::Error => {
            // must follow a True field, directly or via Combinables/Extension-Combinables;
            // tracked by the caller's running "have we seen a True field yet" state.
        }
        _ => {}
    }
    Ok(())
}

/// `VIB::parse` (`spec.md` §4.7). `direction` filters which descriptors
/// are acceptable at each step.
pub async fn parse<S>(direction: Direction, source: &mut S) -> CodecResult<Vib>
where
    S: ByteSource + ?Sized,
{
    let mut table = Table::Primary;
    let mut requires: Option<Requires> = None;
    let mut description = None;
    let mut unit = None;
    let mut transformers = TransformerChain::new();
    let mut is_plain_text = false;
    let mut error_record = false;
    let mut seen_true = false;
    let mut last_was_extension = true; // position 0 counts as "after an extension"
    let mut last_was_manufacturer = false;
    let mut field_count = 0usize;
    let mut primary_code = 0u8;
    let mut raw_bytes = Vec::new();

    loop {
        if field_count > VIF_CHAIN_MAX_VIFE {
            return Err(CodecError::ChainTooLong {
                offset: source.position(),
                limit: VIF_CHAIN_MAX_VIFE,
            });
        }
        let offset = source.position();
        let byte = source.read_exact(1).await?[0];
        raw_bytes.push(byte);
        let code7 = byte & 0x7F;
        let extends = byte & EXTENSION_BIT != 0;

        let descriptor: Descriptor = vif_tables::lookup(table, code7)
            .ok_or(CodecError::UnknownVifCode { offset, code: byte })?;

        if field_count == 0 {
            primary_code = byte;
        }

        if !descriptor.direction.contains(direction) {
            return Err(CodecError::DirectionMismatch { offset, code: byte });
        }

        check_position_rules(
            descriptor.kind,
            field_count,
            last_was_extension,
            last_was_manufacturer,
            offset,
        )?;

        if descriptor.kind == FieldKind::Extension && !extends {
            return Err(CodecError::ChainStructure {
                offset,
                reason: "an Extension VIF/VIFE cannot be the last byte of the chain".to_string(),
            });
        }

        match descriptor.kind {
            FieldKind::True => {
                description = descriptor.description.or(description);
                unit = descriptor.unit.or(unit);
                seen_true = true;
            }
            FieldKind::PlainText => {
                is_plain_text = true;
                seen_true = true;
            }
            FieldKind::ReadoutAny => {
                seen_true = true;
            }
            FieldKind::Combinable => {
                if !seen_true {
                    return Err(CodecError::ChainStructure {
                        offset,
                        reason: "a Combinable VIFE must follow a True-semantics field".to_string(),
                    });
                }
                description = descriptor.description.or(description);
                unit = descriptor.unit.or(unit);
            }
            FieldKind::Error => {
                error_record = true;
            }
            FieldKind::Action | FieldKind::Manufacturer | FieldKind::Extension => {}
        }

        if let Some(t) = descriptor.transformer {
            transformers.push(t);
        }
        if let Some(bits) = descriptor.data_rules {
            match &mut requires {
                Some(r) => r.push(bits),
                None => requires = Some(Requires::new(bits)),
            }
        }

        last_was_manufacturer = descriptor.kind == FieldKind::Manufacturer;
        last_was_extension = descriptor.kind == FieldKind::Extension;
        field_count += 1;

        if !extends {
            break;
        }
        if descriptor.kind == FieldKind::Manufacturer {
            // opaque tail: only further Manufacturer bytes are legal, and they
            // carry no table semantics of their own.
            table = Table::Primary;
            continue;
        }
        table = descriptor.next_table.ok_or(CodecError::ChainStructure {
            offset,
            reason: "this field kind has no table to continue the chain into".to_string(),
        })?;
    }

    Ok(Vib {
        description,
        unit,
        transformers,
        requires: requires.unwrap_or_else(|| Requires::new(crate::data_rules::NONE)),
        is_plain_text,
        error_record,
        field_count,
        primary_code,
        raw_bytes,
    })
}
