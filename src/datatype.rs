//! # C2 — data-type registry
//!
//! The closed set of concrete M-Bus data types, encoded as a 32-bit
//! bitset so the data-rules algebra (`data_rules.rs`, C3) can intersect a
//! DIF's declared `Supports` against a VIF's `Requires` with a single
//! `&`. Per `spec.md` §3: "a closed set of 32 concrete types plus a
//! singleton `None`" — every concrete type gets exactly one of the 32
//! bits, `None` is the empty set.
//!
//! Group widths are pinned to the byte lengths EN 13757-3's DIF
//! data-field codes actually declare (1, 2, 3, 4, 6, 8): `A` stops at
//! `A_6` because no data-field code declares an 8-byte BCD field, while
//! `B`/`C`/`D` go to all six widths since a DIF's length is otherwise
//! ambiguous between signed, unsigned and bit-array interpretations.

use bitflags::bitflags;

bitflags! {
    /// One bit per concrete [`DataType`], used as both a DIF's `Supports`
    /// set and a VIF's `Requires` alternative (`data_rules.rs`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DataTypeSet: u32 {
        const A_1 = 1 << 0;
        const A_2 = 1 << 1;
        const A_3 = 1 << 2;
        const A_4 = 1 << 3;
        const A_6 = 1 << 4;

        const B_1 = 1 << 5;
        const B_2 = 1 << 6;
        const B_3 = 1 << 7;
        const B_4 = 1 << 8;
        const B_6 = 1 << 9;
        const B_8 = 1 << 10;

        const C_1 = 1 << 11;
        const C_2 = 1 << 12;
        const C_3 = 1 << 13;
        const C_4 = 1 << 14;
        const C_6 = 1 << 15;
        const C_8 = 1 << 16;

        const D_1 = 1 << 17;
        const D_2 = 1 << 18;
        const D_3 = 1 << 19;
        const D_4 = 1 << 20;
        const D_6 = 1 << 21;
        const D_8 = 1 << 22;

        const F_4 = 1 << 23;
        const G_2 = 1 << 24;
        const H_4 = 1 << 25;
        const I_6 = 1 << 26;
        const J_3 = 1 << 27;
        const K_4 = 1 << 28;

        const L = 1 << 29;
        const M = 1 << 30;
        const LVAR = 1 << 31;

        /// Every concrete type. Used only as the `ANY` wildcard `Requires`
        /// alternative (`data_rules.rs`); never a `Supports` value.
        const ANY = u32::MAX;
    }
}

/// A single concrete data type, resolved from a [`DataTypeSet`] that
/// happens to have exactly one bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    A1,
    A2,
    A3,
    A4,
    A6,
    B1,
    B2,
    B3,
    B4,
    B6,
    B8,
    C1,
    C2,
    C3,
    C4,
    C6,
    C8,
    D1,
    D2,
    D3,
    D4,
    D6,
    D8,
    F4,
    G2,
    H4,
    I6,
    J3,
    K4,
    L,
    M,
    Lvar,
    /// Singleton: the empty `Supports`/`Requires` intersection (idle
    /// filler, manufacturer-specific, special DIFs with no data payload).
    None,
}

/// Length of a concrete type's encoded payload. `Lvar` declares its own
/// length via a leading length byte (`ascii_unit.rs`/`data.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Fixed(usize),
    Variable,
}

impl DataType {
    /// Maps a single-bit [`DataTypeSet`] to its [`DataType`]. Returns
    /// `None` (the Rust `Option`, not [`DataType::None`]) if `set` isn't
    /// exactly one of the 32 concrete bits — the caller (`data_rules.rs`)
    /// treats that as "no match, try the next alternative".
    pub fn from_bits_exact(set: DataTypeSet) -> Option<DataType> {
        use DataType::*;
        // `bitflags` 2.x flag types can't be used as match-arm patterns
        // (no structural-match eligibility), so dispatch on equality/
        // `.contains()` guards instead, as the radio calibration table
        // does for `CalibParams`.
        Some(if set.is_empty() {
            DataType::None
        } else if set == DataTypeSet::A_1 {
            A1
        } else if set == DataTypeSet::A_2 {
            A2
        } else if set == DataTypeSet::A_3 {
            A3
        } else if set == DataTypeSet::A_4 {
            A4
        } else if set == DataTypeSet::A_6 {
            A6
        } else if set == DataTypeSet::B_1 {
            B1
        } else if set == DataTypeSet::B_2 {
            B2
        } else if set == DataTypeSet::B_3 {
            B3
        } else if set == DataTypeSet::B_4 {
            B4
        } else if set == DataTypeSet::B_6 {
            B6
        } else if set == DataTypeSet::B_8 {
            B8
        } else if set == DataTypeSet::C_1 {
            C1
        } else if set == DataTypeSet::C_2 {
            C2
        } else if set == DataTypeSet::C_3 {
            C3
        } else if set == DataTypeSet::C_4 {
            C4
        } else if set == DataTypeSet::C_6 {
            C6
        } else if set == DataTypeSet::C_8 {
            C8
        } else if set == DataTypeSet::D_1 {
            D1
        } else if set == DataTypeSet::D_2 {
            D2
        } else if set == DataTypeSet::D_3 {
            D3
        } else if set == DataTypeSet::D_4 {
            D4
        } else if set == DataTypeSet::D_6 {
            D6
        } else if set == DataTypeSet::D_8 {
            D8
        } else if set == DataTypeSet::F_4 {
            F4
        } else if set == DataTypeSet::G_2 {
            G2
        } else if set == DataTypeSet::H_4 {
            H4
        } else if set == DataTypeSet::I_6 {
            I6
        } else if set == DataTypeSet::J_3 {
            J3
        } else if set == DataTypeSet::K_4 {
            K4
        } else if set == DataTypeSet::L {
            L
        } else if set == DataTypeSet::M {
            M
        } else if set == DataTypeSet::LVAR {
            Lvar
        } else {
            return Option::None;
        })
    }

    pub fn bits(self) -> DataTypeSet {
        use DataType::*;
        match self {
            A1 => DataTypeSet::A_1,
            A2 => DataTypeSet::A_2,
            A3 => DataTypeSet::A_3,
            A4 => DataTypeSet::A_4,
            A6 => DataTypeSet::A_6,
            B1 => DataTypeSet::B_1,
            B2 => DataTypeSet::B_2,
            B3 => DataTypeSet::B_3,
            B4 => DataTypeSet::B_4,
            B6 => DataTypeSet::B_6,
            B8 => DataTypeSet::B_8,
            C1 => DataTypeSet::C_1,
            C2 => DataTypeSet::C_2,
            C3 => DataTypeSet::C_3,
            C4 => DataTypeSet::C_4,
            C6 => DataTypeSet::C_6,
            C8 => DataTypeSet::C_8,
            D1 => DataTypeSet::D_1,
            D2 => DataTypeSet::D_2,
            D3 => DataTypeSet::D_3,
            D4 => DataTypeSet::D_4,
            D6 => DataTypeSet::D_6,
            D8 => DataTypeSet::D_8,
            F4 => DataTypeSet::F_4,
            G2 => DataTypeSet::G_2,
            H4 => DataTypeSet::H_4,
            I6 => DataTypeSet::I_6,
            J3 => DataTypeSet::J_3,
            K4 => DataTypeSet::K_4,
            L => DataTypeSet::L,
            M => DataTypeSet::M,
            Lvar => DataTypeSet::LVAR,
            DataType::None => DataTypeSet::empty(),
        }
    }

    pub fn length(self) -> Length {
        use DataType::*;
        match self {
            A1 | B1 | C1 | D1 => Length::Fixed(1),
            A2 | B2 | C2 | D2 | G2 => Length::Fixed(2),
            A3 | B3 | C3 | D3 | J3 => Length::Fixed(3),
            A4 | B4 | C4 | D4 | F4 | H4 | K4 => Length::Fixed(4),
            A6 | B6 | C6 | D6 | I6 => Length::Fixed(6),
            B8 | C8 | D8 => Length::Fixed(8),
            // Neither type has a table-driven fixed width (`spec.md` §3: "variable-length,
            // type-specific"); `L` is a single leading byte and `M` a 5-byte epoch record
            // (format byte + 4-byte tick count), per the minimal wire shape `data.rs` decodes.
            L => Length::Fixed(1),
            M => Length::Fixed(5),
            Lvar => Length::Variable,
            DataType::None => Length::Fixed(0),
        }
    }
}

/// Supports set for each DIF data-field code that carries a data payload
/// (data-field codes 0x00-0x07, 0x09-0x0E per `spec.md` §4.4's table).
/// `data_field` is the raw `DIF & DIF_MASK_DATA_FIELD` nibble.
///
/// The table's own names (`BCD_1`, `BCDG_2`, `BCDJ_3`, `BCDFK_4`,
/// `BCDI_6`, `BCD_8`) use "BCD" as shorthand for the letter-groups
/// `B`/`C`/`D`, not Binary-Coded-Decimal — true BCD (type `A`) has its
/// own disjoint codes, `0x09..0x0E`. A data field can resolve to `A_n`
/// *or* to the binary/temporal groups at that width, never both, so the
/// two halves of this table never share a bit.
pub fn supports_for_data_field(data_field: u8) -> DataTypeSet {
    use DataTypeSet as S;
    match data_field {
        0x00 => S::empty(), // no data (special DIFs only use this path elsewhere)
        0x01 => S::B_1 | S::C_1 | S::D_1,
        0x02 => S::B_2 | S::C_2 | S::D_2 | S::G_2,
        0x03 => S::B_3 | S::C_3 | S::D_3 | S::J_3,
        0x04 => S::B_4 | S::C_4 | S::D_4 | S::F_4 | S::K_4,
        0x05 => S::H_4,
        0x06 => S::B_6 | S::C_6 | S::D_6 | S::I_6,
        0x07 => S::B_8 | S::C_8 | S::D_8,
        0x09 => S::A_1,
        0x0A => S::A_2,
        0x0B => S::A_3,
        0x0C => S::A_4,
        0x0D => S::L | S::M | S::LVAR,
        0x0E => S::A_6,
        _ => S::empty(),
    }
}
