//! Exponent-nibble value transformers (`spec.md` §6), recovered verbatim
//! (by formula, not by name) from
//! `examples/original_source/src/mbusmaster/protocol/value.py`'s
//! `ValueTransformer` enum — the closed set of parameterised scale/offset
//! forms every VIF/VIFE table entry's numeric transform is drawn from.
//!
//! A transformer is applied to the raw decoded `i64`/`f64` payload; `code`
//! is the VIF/VIFE byte the transformer was read alongside (its low bits
//! carry the exponent for the masked forms).

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueTransformer {
    /// `raw * 10^((code & mask) + offset)`.
    MultPow10 { mask: u8, offset: i32 },
    /// `raw + 10^((code & mask) + offset)` — only one standard user:
    /// `ADD_10_POW_NN_MINUS_3`.
    AddPow10 { mask: u8, offset: i32 },
    Mult2PowMinus12,
    Mult1000,
    Mult1,
    Mult0_1,
    /// One of the masked multiplicative forms, then divided by 60 or
    /// 3600 to convert an hourly/minutely flow rate into a per-second
    /// rate.
    MultPow10Div60 { mask: u8, offset: i32 },
    MultPow10Div3600 { mask: u8, offset: i32 },
}

pub const MASK_N: u8 = 0x01;
pub const MASK_NN: u8 = 0x03;
pub const MASK_NNN: u8 = 0x07;
pub const MASK_NNNN: u8 = 0x0F;

impl ValueTransformer {
    fn exponent(mask: u8, offset: i32, code: u8) -> i32 {
        (code & mask) as i32 + offset
    }

    /// Applies this transformer to a raw numeric payload, returning the
    /// scaled value. Called only when the decoded [`crate::value::Value`]
    /// is a valid `Integer` or `Float` (`spec.md` §4.8 step 5).
    pub fn apply(self, raw: f64, code: u8) -> f64 {
        match self {
            ValueTransformer::MultPow10 { mask, offset } => {
                raw * 10f64.powi(Self::exponent(mask, offset, code))
            }
            ValueTransformer::AddPow10 { mask, offset } => {
                raw + 10f64.powi(Self::exponent(mask, offset, code))
            }
            ValueTransformer::Mult2PowMinus12 => raw * 2f64.powi(-12),
            ValueTransformer::Mult1000 => raw * 1000.0,
            ValueTransformer::Mult1 => raw,
            ValueTransformer::Mult0_1 => raw * 0.1,
            ValueTransformer::MultPow10Div60 { mask, offset } => {
                raw * 10f64.powi(Self::exponent(mask, offset, code)) / 60.0
            }
            ValueTransformer::MultPow10Div3600 { mask, offset } => {
                raw * 10f64.powi(Self::exponent(mask, offset, code)) / 3600.0
            }
        }
    }

    /// True when applying this transformer to an integer payload always
    /// yields another exact integer — only the masked power-of-ten forms
    /// with a non-negative exponent, plus the two unconditional
    /// multipliers whose factor is itself an integer (`Mult1`, `Mult1000`).
    /// `Mult0_1`, `Mult2PowMinus12` and the `/60`, `/3600` forms are never
    /// exact, regardless of `code`.
    fn preserves_integer(self, code: u8) -> bool {
        match self {
            ValueTransformer::MultPow10 { mask, offset } => {
                Self::exponent(mask, offset, code) >= 0
            }
            ValueTransformer::AddPow10 { mask, offset } => {
                Self::exponent(mask, offset, code) >= 0
            }
            ValueTransformer::Mult1000 | ValueTransformer::Mult1 => true,
            ValueTransformer::Mult2PowMinus12
            | ValueTransformer::Mult0_1
            | ValueTransformer::MultPow10Div60 { .. }
            | ValueTransformer::MultPow10Div3600 { .. } => false,
        }
    }
}

/// A chain of transformers applied in reading order (VIF first, then
/// each Combinable VIFE that overrides/refines the scale).
#[derive(Debug, Clone, Default)]
pub struct TransformerChain(Vec<ValueTransformer>);

impl TransformerChain {
    pub fn new() -> Self {
        TransformerChain(Vec::new())
    }

    pub fn push(&mut self, t: ValueTransformer) {
        self.0.push(t);
    }

    /// Applies every transformer in order. The identity when empty.
    pub fn apply(&self, raw: f64, code: u8) -> f64 {
        self.0.iter().fold(raw, |acc, t| t.apply(acc, code))
    }

    /// True when every transformer in the chain preserves integer
    /// exactness; vacuously true for an empty chain, matching `apply`'s
    /// identity behaviour.
    pub fn preserves_integer(&self, code: u8) -> bool {
        self.0.iter().all(|t| t.preserves_integer(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_is_identity() {
        let chain = TransformerChain::new();
        assert_eq!(chain.apply(12345.0, 0x03), 12345.0);
    }

    #[test]
    fn mult_1_never_changes_a_finite_value() {
        assert_eq!(ValueTransformer::Mult1.apply(42.5, 0x00), 42.5);
    }

    #[test]
    fn scenario_1_energy_wh_code_0x03() {
        // MULT_10_POW_NNN_MINUS_3 with code 0x03: 12345 * 10^(3-3) = 12345
        let t = ValueTransformer::MultPow10 {
            mask: MASK_NNN,
            offset: -3,
        };
        assert_eq!(t.apply(12345.0, 0x03), 12345.0);
    }

    #[test]
    fn empty_chain_preserves_integer() {
        assert!(TransformerChain::new().preserves_integer(0x03));
    }

    #[test]
    fn non_negative_exponent_preserves_integer() {
        let t = ValueTransformer::MultPow10 {
            mask: MASK_NNN,
            offset: -3,
        };
        assert!(t.preserves_integer(0x03)); // exponent 0
    }

    #[test]
    fn negative_exponent_does_not_preserve_integer() {
        let t = ValueTransformer::MultPow10 {
            mask: MASK_NNN,
            offset: -3,
        };
        assert!(!t.preserves_integer(0x01)); // exponent -2
    }

    #[test]
    fn mult_0_1_never_preserves_integer() {
        assert!(!ValueTransformer::Mult0_1.preserves_integer(0x00));
    }
}
