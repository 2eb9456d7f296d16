//! Communication direction, modeled as a bitset the way
//! `examples/original_source/src/mbusmaster/protocol/common.py` defines it
//! (`Flag` with `BIDIRECTIONAL = MASTER_TO_SLAVE | SLAVE_TO_MASTER`).

use bitflags::bitflags;

bitflags! {
    /// Which way a field or record is allowed to flow.
    ///
    /// `BIDIRECTIONAL` only ever appears as a descriptor *attribute* (a
    /// table row that matches either direction); it is never the direction
    /// tag of a parsed DIF/DIFE/VIF/VIFE/record. [`Direction::exact`]
    /// rejects it for that reason.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Direction: u8 {
        const MASTER_TO_SLAVE = 0b01;
        const SLAVE_TO_MASTER = 0b10;
        const BIDIRECTIONAL = Self::MASTER_TO_SLAVE.bits() | Self::SLAVE_TO_MASTER.bits();
    }
}

impl Direction {
    /// A single, concrete direction suitable for tagging a parsed object.
    /// Returns `None` for `BIDIRECTIONAL` or the empty set.
    pub fn exact(self) -> Option<Direction> {
        if self == Direction::MASTER_TO_SLAVE || self == Direction::SLAVE_TO_MASTER {
            Some(self)
        } else {
            None
        }
    }

    /// True if `self` (an exact direction) is accepted by `allowed` (a
    /// descriptor's directional attribute, possibly `BIDIRECTIONAL`).
    pub fn matches(self, allowed: Direction) -> bool {
        allowed.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bidirectional_is_not_exact() {
        assert_eq!(Direction::BIDIRECTIONAL.exact(), None);
    }

    #[test]
    fn exact_directions_round_trip() {
        assert_eq!(
            Direction::MASTER_TO_SLAVE.exact(),
            Some(Direction::MASTER_TO_SLAVE)
        );
        assert_eq!(
            Direction::SLAVE_TO_MASTER.exact(),
            Some(Direction::SLAVE_TO_MASTER)
        );
    }

    #[test]
    fn bidirectional_matches_either_side() {
        assert!(Direction::MASTER_TO_SLAVE.matches(Direction::BIDIRECTIONAL));
        assert!(Direction::SLAVE_TO_MASTER.matches(Direction::BIDIRECTIONAL));
        assert!(!Direction::MASTER_TO_SLAVE.matches(Direction::SLAVE_TO_MASTER));
    }
}
