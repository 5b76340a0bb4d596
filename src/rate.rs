//! # Exchange Rate
//!
//! A ratio between bond-token units and base-token units, used to convert
//! deposit and withdrawal amounts in both directions. Conversions use
//! floor-integer semantics: all amounts are `u64` in smallest-unit
//! denomination, intermediates are widened to `u128` (a `u64 × u64` product
//! always fits), and the result is narrowed back with an explicit overflow
//! check. No floating point touches a production conversion.
//!
//! ## Rate derivation
//!
//! Operators roll the facility forward by deriving each phase's rate from
//! the previous one with [`ExchangeRate::increase_by_percent`]. The
//! derivation re-expresses `base_units * (100 + percent) / 100` as a pair
//! of whole numbers: the fractional part is stripped by repeated scaling
//! by ten, and the bond side becomes a leading-one power of ten with the
//! same digit length as the scaled base value. The reconstruction is
//! intentionally approximate for values that already carry many digits;
//! downstream accounting (and the amounts callers see in events) depends
//! on this exact rounding, so it must not be "improved".

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur constructing or applying an exchange rate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RateError {
    /// Rate units must be strictly positive.
    #[error("exchange rate units must be non-zero (bond {bond_units}, base {base_units})")]
    ZeroUnits {
        /// The bond-unit count supplied.
        bond_units: u64,
        /// The base-unit count supplied.
        base_units: u64,
    },

    /// The conversion denominator is zero. Construction prevents this;
    /// the guard exists for rates materialized from untrusted state.
    #[error("division by zero in rate conversion")]
    DivisionByZero,

    /// The converted amount does not fit in a `u64`.
    #[error("converted amount exceeds the representable range")]
    AmountOverflow,
}

// ---------------------------------------------------------------------------
// ExchangeRate
// ---------------------------------------------------------------------------

/// A bond-units : base-units conversion ratio.
///
/// Immutable once constructed — phase transitions install a new instance
/// rather than mutating the one in use. [`copy`](Self::copy) and
/// [`increase_by_percent`](Self::increase_by_percent) both produce fresh,
/// independent instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    bond_units: u64,
    base_units: u64,
    use_integer_math: bool,
}

impl ExchangeRate {
    /// Creates a rate of `bond_units : base_units` with integer math.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::ZeroUnits`] if either side is zero.
    pub fn new(bond_units: u64, base_units: u64) -> Result<Self, RateError> {
        if bond_units == 0 || base_units == 0 {
            return Err(RateError::ZeroUnits {
                bond_units,
                base_units,
            });
        }
        Ok(Self {
            bond_units,
            base_units,
            use_integer_math: true,
        })
    }

    /// The 1:1 rate. Converting at parity is the identity in both
    /// directions.
    pub fn parity() -> Self {
        Self {
            bond_units: 1,
            base_units: 1,
            use_integer_math: true,
        }
    }

    /// Creates a rate whose conversions go through `f64` instead of exact
    /// integer division.
    ///
    /// This is a planning/projection mode for operator tooling that wants
    /// to estimate outcomes of fractional rates; results are truncated to
    /// whole units and lose precision for large magnitudes. Vault
    /// accounting always uses [`new`](Self::new).
    pub fn float_projection(bond_units: u64, base_units: u64) -> Result<Self, RateError> {
        let mut rate = Self::new(bond_units, base_units)?;
        rate.use_integer_math = false;
        Ok(rate)
    }

    /// Returns the bond-unit side of the ratio.
    pub fn bond_units(&self) -> u64 {
        self.bond_units
    }

    /// Returns the base-unit side of the ratio.
    pub fn base_units(&self) -> u64 {
        self.base_units
    }

    /// Returns `true` if conversions use exact integer math.
    pub fn uses_integer_math(&self) -> bool {
        self.use_integer_math
    }

    /// Converts a bond-token amount into base-token units:
    /// `floor(amount * base_units / bond_units)`.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::DivisionByZero`] if the bond side is zero and
    /// [`RateError::AmountOverflow`] if the result exceeds `u64`.
    pub fn bond_to_base(&self, amount: u64) -> Result<u64, RateError> {
        self.convert(amount, self.base_units, self.bond_units)
    }

    /// Converts a base-token amount into bond-token units:
    /// `floor(amount * bond_units / base_units)`.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::DivisionByZero`] if the base side is zero and
    /// [`RateError::AmountOverflow`] if the result exceeds `u64`.
    pub fn base_to_bond(&self, amount: u64) -> Result<u64, RateError> {
        self.convert(amount, self.bond_units, self.base_units)
    }

    fn convert(&self, amount: u64, numerator: u64, denominator: u64) -> Result<u64, RateError> {
        if denominator == 0 {
            return Err(RateError::DivisionByZero);
        }
        if self.use_integer_math {
            let product = amount as u128 * numerator as u128;
            u64::try_from(product / denominator as u128).map_err(|_| RateError::AmountOverflow)
        } else {
            let value = amount as f64 * numerator as f64 / denominator as f64;
            if !value.is_finite() || value >= u64::MAX as f64 {
                return Err(RateError::AmountOverflow);
            }
            Ok(value as u64)
        }
    }

    /// Derives the rate that applies after increasing the base side by
    /// `percent` percent, re-expressed as a whole-number ratio.
    ///
    /// The real value `base_units * (100 + percent) / 100` is scaled up by
    /// powers of ten until integral; that becomes the new base-unit count.
    /// The new bond-unit count is `1` followed by zeros, with the same
    /// digit length as the new base value. Examples starting from parity:
    ///
    /// - `+1%`  → `100 : 101`
    /// - `+10%` → `10 : 11`
    /// - `+25%` → `100 : 125`
    ///
    /// The digit-length reconstruction discards the previous bond side
    /// entirely, so chaining derivations accumulates rounding. Downstream
    /// accounting depends on this exact rounding; do not change it.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::AmountOverflow`] if the scaled base value does
    /// not fit in a `u64`.
    pub fn increase_by_percent(&self, percent: u32) -> Result<Self, RateError> {
        // base * (100 + percent) is the target value scaled by 100. Strip
        // the scale back out only as far as the division stays exact.
        let scaled = self.base_units as u128 * (100 + percent as u128);
        let new_base = if scaled % 100 == 0 {
            scaled / 100
        } else if scaled % 10 == 0 {
            scaled / 10
        } else {
            scaled
        };
        let new_base = u64::try_from(new_base).map_err(|_| RateError::AmountOverflow)?;
        let new_bond = 10u64
            .checked_pow(decimal_digits(new_base) - 1)
            .ok_or(RateError::AmountOverflow)?;
        let mut rate = Self::new(new_bond, new_base)?;
        rate.use_integer_math = self.use_integer_math;
        Ok(rate)
    }

    /// Returns a new independent instance with identical units.
    pub fn copy(&self) -> Self {
        *self
    }
}

/// Number of decimal digits in `value` (at least 1).
fn decimal_digits(value: u64) -> u32 {
    value.checked_ilog10().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(bond: u64, base: u64) -> ExchangeRate {
        ExchangeRate::new(bond, base).unwrap()
    }

    #[test]
    fn zero_units_rejected() {
        assert!(matches!(
            ExchangeRate::new(0, 1),
            Err(RateError::ZeroUnits { .. })
        ));
        assert!(matches!(
            ExchangeRate::new(1, 0),
            Err(RateError::ZeroUnits { .. })
        ));
        assert!(matches!(
            ExchangeRate::new(0, 0),
            Err(RateError::ZeroUnits { .. })
        ));
    }

    #[test]
    fn parity_is_identity() {
        let r = ExchangeRate::parity();
        for x in [0u64, 1, 331, 4_586_909_684_958] {
            assert_eq!(r.bond_to_base(x).unwrap(), x);
            assert_eq!(r.base_to_bond(x).unwrap(), x);
        }
    }

    #[test]
    fn two_to_one() {
        let r = rate(2, 1);
        assert_eq!(r.bond_to_base(331).unwrap(), 165);
        assert_eq!(r.bond_to_base(1).unwrap(), 0);
        assert_eq!(r.base_to_bond(165).unwrap(), 330);
        assert_eq!(r.base_to_bond(1).unwrap(), 2);
    }

    #[test]
    fn usd_to_eth_style_rate() {
        // 1 usd == 0.0007745 eth, in smallest units on both sides.
        let r = rate(10_000_000, 774_500_000_000_000);
        assert_eq!(r.bond_to_base(4345).unwrap(), 336_520_250_000);
        assert_eq!(r.base_to_bond(336_520_250_000).unwrap(), 4345);
    }

    #[test]
    fn floor_law_holds() {
        let r = rate(7, 3);
        for a in [0u64, 1, 2, 6, 7, 100, 12_345] {
            assert_eq!(
                r.bond_to_base(a).unwrap(),
                (a as u128 * 3 / 7) as u64,
                "bond_to_base({a})"
            );
            assert_eq!(
                r.base_to_bond(a).unwrap(),
                (a as u128 * 7 / 3) as u64,
                "base_to_bond({a})"
            );
        }
    }

    #[test]
    fn large_product_does_not_overflow_intermediate() {
        let r = rate(u64::MAX, 1);
        // amount * base fits; the quotient collapses back into range.
        assert_eq!(r.bond_to_base(u64::MAX).unwrap(), 1);
    }

    #[test]
    fn overflow_on_narrowing_reported() {
        let r = rate(1, u64::MAX);
        assert_eq!(r.bond_to_base(2), Err(RateError::AmountOverflow));
    }

    #[test]
    fn division_guard_on_corrupt_rate() {
        // Construction forbids zero units, but a rate deserialized from
        // untrusted state can still carry them. The conversion must guard.
        let corrupt: ExchangeRate =
            serde_json::from_str(r#"{"bond_units":0,"base_units":5,"use_integer_math":true}"#)
                .unwrap();
        assert_eq!(corrupt.bond_to_base(10), Err(RateError::DivisionByZero));
        assert_eq!(corrupt.base_to_bond(10).unwrap(), 0);
    }

    #[test]
    fn increase_parity_by_one_percent() {
        let r = ExchangeRate::parity().increase_by_percent(1).unwrap();
        assert_eq!(r.bond_units(), 100);
        assert_eq!(r.base_units(), 101);
    }

    #[test]
    fn increase_parity_by_ten_percent() {
        let r = ExchangeRate::parity().increase_by_percent(10).unwrap();
        assert_eq!(r.bond_units(), 10);
        assert_eq!(r.base_units(), 11);
        // deposit of 100 at this rate pays out 90 bond units.
        assert_eq!(r.base_to_bond(100).unwrap(), 90);
    }

    #[test]
    fn increase_derived_rate_again() {
        // {10:11} + 10% -> value 12.1 -> scaled to 121, bond side 100.
        let r = rate(10, 11).increase_by_percent(10).unwrap();
        assert_eq!(r.bond_units(), 100);
        assert_eq!(r.base_units(), 121);
    }

    #[test]
    fn increase_by_zero_percent_renormalizes() {
        // +0% keeps the base side but rebuilds the bond side from digit
        // length — the documented lossy reconstruction.
        let r = rate(3, 250).increase_by_percent(0).unwrap();
        assert_eq!(r.bond_units(), 100);
        assert_eq!(r.base_units(), 250);
    }

    #[test]
    fn copy_is_independent_and_equal() {
        let r = rate(10, 11);
        let c = r.copy();
        assert_eq!(r, c);
        assert_eq!(c.bond_units(), 10);
        assert_eq!(c.base_units(), 11);
    }

    #[test]
    fn float_projection_truncates() {
        let r = ExchangeRate::float_projection(2, 1).unwrap();
        assert!(!r.uses_integer_math());
        assert_eq!(r.bond_to_base(331).unwrap(), 165);
    }

    #[test]
    fn serde_round_trip() {
        let r = rate(10_000_000, 774_500_000_000_000);
        let json = serde_json::to_string(&r).unwrap();
        let back: ExchangeRate = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
