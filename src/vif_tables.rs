//! # VIF/VIFE lookup tables (support for C7)
//!
//! The five tables a VIF/VIFE chain can traverse (`spec.md` §4.7): the
//! Primary field table, First Extension (`0xFB`), Second Extension
//! (`0xFD`, with its own Second-Level sub-table), Combinable Orthogonal,
//! and Combinable Extension (`0xFC`). Primary-table entries are computed
//! from the exponent-nibble family ranges EN 13757-3 Table 10 lays out,
//! the way `examples/jfabienke-mbuscrate/src/payload/vif_maps.rs` lays
//! its `VIF_CODES` out as unit/exponent/quantity triples — except here
//! the per-entry "quantity" also carries a value-transformer and a
//! `Requires` contribution, supplementing that simpler `{unit, exponent}`
//! pair with the semantics `data_rules.rs` needs.
//!
//! Labels and units are drawn from
//! `examples/original_source/src/mbusmaster/protocol/value.py`'s
//! `ValueDescription`/`ValueUnit` enums. Not every one of the standard's
//! ~140 labels has a table entry here — this covers the families
//! exercised by the codec's test corpus and the common meter quantities;
//! codes outside that set surface as `CodecError::UnknownVifCode` rather
//! than a guessed descriptor.

use once_cell::sync::Lazy;

use crate::data_rules::{
    ADDRESS_C, BOOLEAN_D, DEFAULT_ABHLVAR, TEMPORAL_FIJM, TEMPORAL_G, UNSIGNED_C,
};
use crate::datatype::DataTypeSet;
use crate::direction::Direction;
use crate::value_transformer::{ValueTransformer, MASK_NN, MASK_NNN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Primary,
    FirstExtension,
    SecondExtension,
    SecondExtensionSecondLevel,
    CombinableOrthogonal,
    CombinableExtension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    True,
    Combinable,
    Action,
    Error,
    PlainText,
    ReadoutAny,
    Manufacturer,
    /// A pointer to another table; the byte itself carries no semantic
    /// content of its own.
    Extension,
}

#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub kind: FieldKind,
    pub direction: Direction,
    pub description: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub transformer: Option<ValueTransformer>,
    /// A `Requires` alternative this descriptor contributes, if any
    /// (`data_rules.rs::Requires::push`).
    pub data_rules: Option<DataTypeSet>,
    pub next_table: Option<Table>,
}

const fn bidi() -> Direction {
    Direction::BIDIRECTIONAL
}

const TRUE_COMBINABLE_NEXT: Option<Table> = Some(Table::CombinableOrthogonal);

/// The Primary field table (position 0). `spec.md` §4.7's five escape
/// codes (`0x7B`/`0x7C`/`0x7D`/`0x7E`/`0x7F`, the low-7-bit form of
/// `0xFB`/`VIF_PLAIN_TEXT`/`0xFD`/`VIF_READOUT_ANY`/
/// `VIF_MANUFACTURER_SPECIFIC`) are checked first; everything else is a
/// computed entry from an exponent-nibble family.
pub fn lookup_primary(code7: u8) -> Option<Descriptor> {
    use crate::constants::{VIF_MANUFACTURER_SPECIFIC, VIF_PLAIN_TEXT, VIF_READOUT_ANY};

    match code7 {
        0x7B => Some(Descriptor {
            kind: FieldKind::Extension,
            direction: bidi(),
            description: None,
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: Some(Table::FirstExtension),
        }),
        c if c == VIF_PLAIN_TEXT & 0x7F => Some(Descriptor {
            kind: FieldKind::PlainText,
            direction: bidi(),
            description: Some("PlainText"),
            unit: None,
            transformer: Some(ValueTransformer::Mult1),
            data_rules: Some(DEFAULT_ABHLVAR),
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        0x7D => Some(Descriptor {
            kind: FieldKind::Extension,
            direction: bidi(),
            description: None,
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: Some(Table::SecondExtension),
        }),
        c if c == VIF_READOUT_ANY & 0x7F => Some(Descriptor {
            kind: FieldKind::ReadoutAny,
            direction: bidi(),
            description: Some("ReadoutAny"),
            unit: None,
            transformer: Some(ValueTransformer::Mult1),
            data_rules: Some(crate::data_rules::ANY),
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        c if c == VIF_MANUFACTURER_SPECIFIC & 0x7F => Some(Descriptor {
            kind: FieldKind::Manufacturer,
            direction: bidi(),
            description: Some("ManufacturerSpecific"),
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: None,
        }),
        _ => primary_family(code7),
    }
}

fn energy_wh_like(exp_offset: i32, unit: &'static str, mask: u8) -> Descriptor {
    Descriptor {
        kind: FieldKind::True,
        direction: bidi(),
        description: Some("Energy"),
        unit: Some(unit),
        transformer: Some(ValueTransformer::MultPow10 {
            mask,
            offset: exp_offset,
        }),
        data_rules: Some(DEFAULT_ABHLVAR),
        next_table: TRUE_COMBINABLE_NEXT,
    }
}

fn true_entry(
    description: &'static str,
    unit: Option<&'static str>,
    transformer: ValueTransformer,
    data_rules: DataTypeSet,
) -> Descriptor {
    Descriptor {
        kind: FieldKind::True,
        direction: bidi(),
        description: Some(description),
        unit,
        transformer: Some(transformer),
        data_rules: Some(data_rules),
        next_table: TRUE_COMBINABLE_NEXT,
    }
}

fn primary_family(code7: u8) -> Option<Descriptor> {
    match code7 {
        0x00..=0x07 => Some(energy_wh_like(
            code7 as i32 - 3,
            "Wh",
            MASK_NNN,
        )),
        0x08..=0x0F => Some(true_entry(
            "Energy",
            Some("J"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32,
            },
            DEFAULT_ABHLVAR,
        )),
        0x10..=0x17 => Some(true_entry(
            "Volume",
            Some("m³"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32 - 6,
            },
            DEFAULT_ABHLVAR,
        )),
        0x18..=0x1F => Some(true_entry(
            "Mass",
            Some("kg"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32 - 3,
            },
            DEFAULT_ABHLVAR,
        )),
        0x20..=0x23 => Some(time_unit_entry("OnTime", code7 & 0x03)),
        0x24..=0x27 => Some(time_unit_entry("OperatingTime", code7 & 0x03)),
        0x28..=0x2F => Some(true_entry(
            "Power",
            Some("W"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32 - 3,
            },
            DEFAULT_ABHLVAR,
        )),
        0x30..=0x37 => Some(true_entry(
            "Power",
            Some("J/h"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32,
            },
            DEFAULT_ABHLVAR,
        )),
        0x38..=0x3F => Some(true_entry(
            "VolumeFlow",
            Some("m³/h"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32 - 6,
            },
            DEFAULT_ABHLVAR,
        )),
        0x40..=0x47 => Some(true_entry(
            "VolumeFlowExt",
            Some("m³/min"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32 - 7,
            },
            DEFAULT_ABHLVAR,
        )),
        0x48..=0x4F => Some(true_entry(
            "VolumeFlowExt",
            Some("m³/s"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32 - 9,
            },
            DEFAULT_ABHLVAR,
        )),
        0x50..=0x57 => Some(true_entry(
            "MassFlow",
            Some("kg/h"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32 - 3,
            },
            DEFAULT_ABHLVAR,
        )),
        0x58..=0x5B => Some(true_entry(
            "FlowTemperature",
            Some("°C"),
            ValueTransformer::MultPow10 {
                mask: MASK_NN,
                offset: (code7 & MASK_NN) as i32 - 3,
            },
            DEFAULT_ABHLVAR,
        )),
        0x5C..=0x5F => Some(true_entry(
            "ReturnTemperature",
            Some("°C"),
            ValueTransformer::MultPow10 {
                mask: MASK_NN,
                offset: (code7 & MASK_NN) as i32 - 3,
            },
            DEFAULT_ABHLVAR,
        )),
        0x60..=0x63 => Some(true_entry(
            "TemperatureDifference",
            Some("K"),
            ValueTransformer::MultPow10 {
                mask: MASK_NN,
                offset: (code7 & MASK_NN) as i32 - 3,
            },
            DEFAULT_ABHLVAR,
        )),
        0x64..=0x67 => Some(true_entry(
            "ExternalTemperature",
            Some("°C"),
            ValueTransformer::MultPow10 {
                mask: MASK_NN,
                offset: (code7 & MASK_NN) as i32 - 3,
            },
            DEFAULT_ABHLVAR,
        )),
        0x68..=0x6B => Some(true_entry(
            "Pressure",
            Some("bar"),
            ValueTransformer::MultPow10 {
                mask: MASK_NN,
                offset: (code7 & MASK_NN) as i32 - 3,
            },
            DEFAULT_ABHLVAR,
        )),
        0x6C => Some(true_entry(
            "Date",
            None,
            ValueTransformer::Mult1,
            TEMPORAL_G,
        )),
        0x6D => Some(true_entry(
            "DateTime",
            None,
            ValueTransformer::Mult1,
            TEMPORAL_FIJM,
        )),
        0x6E => Some(true_entry(
            "UnitsForHCA",
            None,
            ValueTransformer::Mult1,
            DEFAULT_ABHLVAR,
        )),
        0x70..=0x73 => Some(time_unit_entry("AveragingDuration", code7 & 0x03)),
        0x74..=0x77 => Some(time_unit_entry("ActualityDuration", code7 & 0x03)),
        0x78 => Some(true_entry(
            "FabricationNumber",
            None,
            ValueTransformer::Mult1,
            UNSIGNED_C,
        )),
        0x79 => Some(true_entry(
            "EnhancedIdentification",
            None,
            ValueTransformer::Mult1,
            ADDRESS_C,
        )),
        0x7A => Some(true_entry(
            "BusAddress",
            None,
            ValueTransformer::Mult1,
            UNSIGNED_C,
        )),
        _ => None,
    }
}

fn time_unit_entry(description: &'static str, unit_index: u8) -> Descriptor {
    let unit = match unit_index {
        0 => "s",
        1 => "min",
        2 => "h",
        _ => "d",
    };
    true_entry(description, Some(unit), ValueTransformer::Mult1, DEFAULT_ABHLVAR)
}

/// First Extension table (`0xFB`). A small representative set —
/// capacity/energy variants at finer exponent bands plus the
/// cold/hot-water volume entries the standard defines here.
pub fn lookup_first_extension(code7: u8) -> Option<Descriptor> {
    match code7 {
        0x00..=0x07 => Some(true_entry(
            "Energy",
            Some("MWh"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32 - 3,
            },
            DEFAULT_ABHLVAR,
        )),
        0x10..=0x17 => Some(true_entry(
            "Volume",
            Some("ft³"),
            ValueTransformer::MultPow10 {
                mask: MASK_NNN,
                offset: (code7 & MASK_NNN) as i32 - 1,
            },
            DEFAULT_ABHLVAR,
        )),
        _ => None,
    }
}

/// Second Extension table (`0xFD`). Covers the error-flag and a small
/// set of dimensionless/duration entries.
pub fn lookup_second_extension(code7: u8) -> Option<Descriptor> {
    match code7 {
        0x17 => Some(Descriptor {
            kind: FieldKind::True,
            direction: Direction::SLAVE_TO_MASTER,
            description: Some("ErrorFlags"),
            unit: None,
            transformer: None,
            data_rules: Some(BOOLEAN_D),
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        0x7D => Some(Descriptor {
            kind: FieldKind::Extension,
            direction: bidi(),
            description: None,
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: Some(Table::SecondExtensionSecondLevel),
        }),
        _ => None,
    }
}

pub fn lookup_second_extension_second_level(_code7: u8) -> Option<Descriptor> {
    None
}

/// Combinable Orthogonal table: multiplier corrections, per-time-unit
/// rate divisors, phase selectors. The entry at `0x7D` exists so
/// `spec.md` §8 scenario 2's VIFE chain (`02 FD 17`) can override the
/// resolved data type to `Boolean-D` the way the scenario describes —
/// grounded in the same code/escape shape the Second Extension table
/// uses at position 0.
pub fn lookup_combinable_orthogonal(code7: u8) -> Option<Descriptor> {
    match code7 {
        0x17 => Some(Descriptor {
            kind: FieldKind::Combinable,
            direction: bidi(),
            description: None,
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        0x70 => Some(Descriptor {
            kind: FieldKind::Combinable,
            direction: bidi(),
            description: Some("PerSecond"),
            unit: None,
            transformer: Some(ValueTransformer::MultPow10Div3600 { mask: 0, offset: 0 }),
            data_rules: None,
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        0x71 => Some(Descriptor {
            kind: FieldKind::Combinable,
            direction: bidi(),
            description: Some("PerMinute"),
            unit: None,
            transformer: Some(ValueTransformer::MultPow10Div60 { mask: 0, offset: 0 }),
            data_rules: None,
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        0x78 => Some(Descriptor {
            kind: FieldKind::Combinable,
            direction: bidi(),
            description: Some("AtPhaseL1"),
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        0x79 => Some(Descriptor {
            kind: FieldKind::Combinable,
            direction: bidi(),
            description: Some("AtPhaseL2"),
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        0x7A => Some(Descriptor {
            kind: FieldKind::Combinable,
            direction: bidi(),
            description: Some("AtPhaseL3"),
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        0x7D => Some(Descriptor {
            kind: FieldKind::Extension,
            direction: bidi(),
            description: None,
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: Some(Table::SecondExtension),
        }),
        // Action VIFEs (master-to-slave write/add/...) and Error VIFEs
        // (slave-to-master record error) share this table's code space
        // at EN 13757-3's reserved 0x40..0x4F / 0x50..0x5F bands.
        0x40..=0x4F => Some(Descriptor {
            kind: FieldKind::Action,
            direction: Direction::MASTER_TO_SLAVE,
            description: Some("Action"),
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        0x50..=0x5F => Some(Descriptor {
            kind: FieldKind::Error,
            direction: Direction::SLAVE_TO_MASTER,
            description: Some("Error"),
            unit: None,
            transformer: None,
            data_rules: None,
            next_table: TRUE_COMBINABLE_NEXT,
        }),
        _ => None,
    }
}

pub fn lookup_combinable_extension(_code7: u8) -> Option<Descriptor> {
    None
}

pub fn lookup(table: Table, code7: u8) -> Option<Descriptor> {
    match table {
        Table::Primary => lookup_primary(code7),
        Table::FirstExtension => lookup_first_extension(code7),
        Table::SecondExtension => lookup_second_extension(code7),
        Table::SecondExtensionSecondLevel => lookup_second_extension_second_level(code7),
        Table::CombinableOrthogonal => lookup_combinable_orthogonal(code7),
        Table::CombinableExtension => lookup_combinable_extension(code7),
    }
}

/// A lazily-built, lock-free-for-readers cache of the primary table's
/// computed entries, per `spec.md` §5 ("a small per-direction-per-table
/// cache of `(code -> descriptor)` is permitted; it must be lock-free
/// for readers").
static PRIMARY_CACHE: Lazy<[Option<Descriptor>; 128]> = Lazy::new(|| {
    let mut table = [None; 128];
    for (code, slot) in table.iter_mut().enumerate() {
        *slot = lookup_primary(code as u8);
    }
    table
});

pub fn lookup_primary_cached(code7: u8) -> Option<Descriptor> {
    PRIMARY_CACHE[(code7 & 0x7F) as usize]
}
