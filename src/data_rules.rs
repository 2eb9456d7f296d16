//! # C3 — data-rules algebra
//!
//! Resolves a concrete [`DataType`] from a DIF's `Supports` bitset and a
//! VIF/VIB's `Requires` alternatives, per `spec.md` §4.3. `Requires` is
//! built up as VIFEs are parsed: each Combinable VIFE can push a new
//! alternative bitset, tried before the ones already there (LIFO), except
//! the `ANY` wildcard, which always sits in the last slot so concrete
//! alternatives get first refusal.

use crate::datatype::{DataType, DataTypeSet};

/// A named `Requires` constant, per `spec.md` §4.3. Each covers every
/// byte-width a data-field code can carry for that semantic category —
/// the DIF's `Supports` bitset (already narrowed to its own length) is
/// what actually pins down the width.
pub const DEFAULT_ABHLVAR: DataTypeSet = DataTypeSet::A_1
    .union(DataTypeSet::A_2)
    .union(DataTypeSet::A_3)
    .union(DataTypeSet::A_4)
    .union(DataTypeSet::A_6)
    .union(DataTypeSet::B_1)
    .union(DataTypeSet::B_2)
    .union(DataTypeSet::B_3)
    .union(DataTypeSet::B_4)
    .union(DataTypeSet::B_6)
    .union(DataTypeSet::B_8)
    .union(DataTypeSet::H_4)
    .union(DataTypeSet::LVAR);

const ALL_C: DataTypeSet = DataTypeSet::C_1
    .union(DataTypeSet::C_2)
    .union(DataTypeSet::C_3)
    .union(DataTypeSet::C_4)
    .union(DataTypeSet::C_6)
    .union(DataTypeSet::C_8);

pub const ADDRESS_C: DataTypeSet = ALL_C;
pub const UNSIGNED_C: DataTypeSet = ALL_C;

pub const BOOLEAN_D: DataTypeSet = DataTypeSet::D_1
    .union(DataTypeSet::D_2)
    .union(DataTypeSet::D_3)
    .union(DataTypeSet::D_4)
    .union(DataTypeSet::D_6)
    .union(DataTypeSet::D_8);

pub const TEMPORAL_G: DataTypeSet = DataTypeSet::G_2;
pub const TEMPORAL_FIJM: DataTypeSet = DataTypeSet::F_4
    .union(DataTypeSet::I_6)
    .union(DataTypeSet::J_3)
    .union(DataTypeSet::M);
pub const TEMPORAL_FGIJM: DataTypeSet = TEMPORAL_FIJM.union(DataTypeSet::G_2);
pub const TEMPORAL_K: DataTypeSet = DataTypeSet::K_4;
pub const TEMPORAL_L: DataTypeSet = DataTypeSet::L;

pub const NONE: DataTypeSet = DataTypeSet::empty();
pub const ANY: DataTypeSet = DataTypeSet::ANY;

/// An ordered list of `Requires` alternatives, built LIFO as a VIB is
/// parsed. `ANY`, once pushed, is pinned to the last slot and the loop
/// keeps going past a failed match instead of stopping at the first one.
#[derive(Debug, Clone, Default)]
pub struct Requires {
    alts: Vec<DataTypeSet>,
    any_pinned: bool,
}

impl Requires {
    pub fn new(base: DataTypeSet) -> Self {
        let mut r = Requires::default();
        r.push(base);
        r
    }

    /// Adds an alternative. `ANY` always ends up last; any other bitset is
    /// inserted ahead of everything but a pinned `ANY`.
    pub fn push(&mut self, bits: DataTypeSet) {
        if bits == ANY {
            if !self.any_pinned {
                self.alts.push(ANY);
                self.any_pinned = true;
            }
            return;
        }
        if self.any_pinned {
            let last = self.alts.len() - 1;
            self.alts.insert(last, bits);
        } else {
            self.alts.insert(0, bits);
        }
    }

    pub fn alternatives(&self) -> &[DataTypeSet] {
        &self.alts
    }

    pub fn any_pinned(&self) -> bool {
        self.any_pinned
    }
}

/// Resolves `supports & requires` to a single concrete [`DataType`].
///
/// Tries each `Requires` alternative in order. Without a pinned `ANY`,
/// the first failed alternative ends the search (`spec.md` §4.3: "a
/// `Requires` list without `ANY` is exhausted after its first failed
/// candidate"); with `ANY` pinned, every alternative is tried before
/// giving up.
pub fn resolve(supports: DataTypeSet, requires: &Requires) -> Option<DataType> {
    for &alt in requires.alternatives() {
        let candidate = supports & alt;
        // An empty intersection is never a match: `from_bits_exact` maps
        // it to `DataType::None`, but that's its own contract for "no
        // payload", not a successful resolution of this alternative.
        if !candidate.is_empty() {
            if let Some(t) = DataType::from_bits_exact(candidate) {
                return Some(t);
            }
        }
        if !requires.any_pinned() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_alternative_resolves_directly() {
        let supports = DataTypeSet::C_6;
        let requires = Requires::new(ADDRESS_C);
        assert_eq!(resolve(supports, &requires), Some(DataType::C6));
    }

    #[test]
    fn lifo_order_tries_newest_alternative_first() {
        let supports = DataTypeSet::A_4 | DataTypeSet::B_4 | DataTypeSet::H_4 | DataTypeSet::K_4;
        let mut requires = Requires::new(DEFAULT_ABHLVAR);
        requires.push(TEMPORAL_K);
        // TEMPORAL_K was pushed last, so it's tried first and wins even
        // though DEFAULT_ABHLVAR would also intersect non-trivially.
        assert_eq!(resolve(supports, &requires), Some(DataType::K4));
    }

    #[test]
    fn without_any_first_failure_ends_the_search() {
        let supports = DataTypeSet::G_2;
        let mut requires = Requires::new(TEMPORAL_FIJM); // doesn't include G_2
        requires.push(DEFAULT_ABHLVAR); // would also fail, and is tried...
        // ...but TEMPORAL_FIJM is tried first (pushed-over), fails, and
        // since ANY was never pinned the search stops there.
        assert_eq!(resolve(supports, &requires), None);
    }

    #[test]
    fn any_pinned_keeps_trying_after_a_failure() {
        let supports = DataTypeSet::H_4;
        let mut requires = Requires::new(TEMPORAL_FIJM); // fails against H_4
        requires.push(ANY);
        assert_eq!(resolve(supports, &requires), Some(DataType::H4));
    }

    #[test]
    fn any_only_resolves_when_supports_is_already_a_single_bit() {
        let supports = DataTypeSet::A_4 | DataTypeSet::B_4 | DataTypeSet::H_4 | DataTypeSet::K_4;
        let mut requires = Requires::new(ANY);
        assert_eq!(resolve(supports, &requires), None);
    }

    #[test]
    fn empty_supports_never_resolves() {
        // An empty `supports & alt` intersection isn't a match even
        // though `DataType::from_bits_exact` maps the empty set to
        // `DataType::None` — that mapping is for special DIFs with no
        // payload at all, not for a `Requires` alternative missing its
        // target.
        let requires = Requires::new(NONE);
        assert_eq!(resolve(DataTypeSet::empty(), &requires), None);
    }

    #[test]
    fn any_is_pinned_last_even_if_pushed_first() {
        let mut requires = Requires::new(ANY);
        requires.push(TEMPORAL_K);
        assert_eq!(requires.alternatives(), &[TEMPORAL_K, ANY]);
    }
}
