//! Conversion between wire decimals and stored minor units.
//!
//! Prices travel as [`Decimal`] and are persisted as `i64` counts of the
//! currency's minor unit (cents). Every conversion is exact; the only rounding
//! happens when a value carries more than two fraction digits.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction digits of the minor unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Round to the minor unit, half away from zero.
pub fn round_to_minor(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Minor units for `amount`, or `None` if it does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    round_to_minor(amount)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_i64()
}

pub fn from_minor_units(units: i64) -> Decimal {
    Decimal::new(units, MINOR_UNIT_SCALE)
}

/// `price × quantity`, or `None` on overflow.
pub fn line_total(price: Decimal, quantity: i32) -> Option<Decimal> {
    price.checked_mul(Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn sums_without_float_drift() {
        let total = line_total(dec("19.99"), 3).unwrap() + line_total(dec("5.00"), 2).unwrap();
        assert_eq!(round_to_minor(total), dec("69.97"));
        assert_eq!(to_minor_units(total), Some(6997));
    }

    #[test]
    fn minor_units_round_trip_keeps_two_digits() {
        assert_eq!(from_minor_units(4498).to_string(), "44.98");
        assert_eq!(from_minor_units(500).to_string(), "5.00");
        assert_eq!(to_minor_units(dec("0.10")), Some(10));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to_minor(dec("0.125")), dec("0.13"));
        assert_eq!(round_to_minor(dec("0.124")), dec("0.12"));
    }

    #[test]
    fn rejects_values_outside_i64() {
        assert_eq!(to_minor_units(Decimal::MAX), None);
        assert_eq!(line_total(Decimal::MAX, 2), None);
    }
}
