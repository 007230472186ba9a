//! Decimal rounding primitives shared by every billing formula.
//!
//! The billing spreadsheet rounds with `ROUND(x; 4)` and truncates with
//! `TRUNC(x; 2)`. Both are reproduced here on exact decimals so chained
//! computations never pick up binary floating-point drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to `dp` decimal places with ties resolved toward positive infinity.
///
/// `0.12345 -> 0.1235` but `-0.12345 -> -0.1234`.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let strategy = if value.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    value.round_dp_with_strategy(dp, strategy)
}

/// Spreadsheet `ROUND(x; 4)`.
pub fn round4(value: Decimal) -> Decimal {
    round_half_up(value, 4)
}

/// Spreadsheet `TRUNC(x; 2)`: drops everything past the cent, toward zero.
pub fn trunc2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trunc2_is_symmetric_toward_zero() {
        assert_eq!(trunc2(dec!(1.239)), dec!(1.23));
        assert_eq!(trunc2(dec!(-1.239)), dec!(-1.23));
        assert_eq!(trunc2(dec!(0.009)), dec!(0));
        assert_eq!(trunc2(dec!(12)), dec!(12));
    }

    #[test]
    fn test_round4_ties_go_up() {
        assert_eq!(round4(dec!(0.12345)), dec!(0.1235));
        assert_eq!(round4(dec!(0.12344)), dec!(0.1234));
        assert_eq!(round4(dec!(0.00005)), dec!(0.0001));
    }

    #[test]
    fn test_round4_negative_ties_go_toward_positive_infinity() {
        assert_eq!(round4(dec!(-0.12345)), dec!(-0.1234));
        assert_eq!(round4(dec!(-0.12346)), dec!(-0.1235));
        assert_eq!(round4(dec!(-0.00005)), dec!(0));
    }

    #[test]
    fn test_round_half_up_five_places() {
        assert_eq!(round_half_up(dec!(0.123455), 5), dec!(0.12346));
        assert_eq!(round_half_up(dec!(0.1234549), 5), dec!(0.12345));
    }

    fn any_decimal() -> impl Strategy<Value = Decimal> {
        (-1_000_000_000_000i64..1_000_000_000_000i64, 0u32..=10)
            .prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_trunc2_is_idempotent(value in any_decimal()) {
            let once = trunc2(value);
            prop_assert_eq!(trunc2(once), once);
        }

        #[test]
        fn prop_round4_is_idempotent(value in any_decimal()) {
            let once = round4(value);
            prop_assert_eq!(round4(once), once);
        }

        #[test]
        fn prop_trunc2_never_moves_away_from_zero(value in any_decimal()) {
            prop_assert!(trunc2(value).abs() <= value.abs());
        }
    }
}
