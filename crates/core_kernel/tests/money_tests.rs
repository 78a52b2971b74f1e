//! Unit tests for money rounding and percentage rates
//!
//! Covers the 2dp half-away-from-zero rule at the points where stored
//! figures are produced, and the 0..=100 percentage range.

use core_kernel::money::{round2, sum, MoneyError, Percentage};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod rounding {
    use super::*;

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        assert_eq!(round2(dec!(2.675)), dec!(2.68));
        assert_eq!(round2(dec!(0.125)), dec!(0.13));
        assert_eq!(round2(dec!(-0.125)), dec!(-0.13));
    }

    #[test]
    fn test_already_rounded_values_unchanged() {
        assert_eq!(round2(dec!(1070.00)), dec!(1070.00));
        assert_eq!(round2(dec!(70)), dec!(70));
    }

    #[test]
    fn test_round2_keeps_two_places() {
        assert_eq!(round2(dec!(-1.4)).to_string(), "-1.40");
        assert_eq!(round2(dec!(12.3456)).to_string(), "12.35");
    }
}

mod summing {
    use super::*;

    #[test]
    fn test_sum_of_empty_is_zero() {
        let empty: Vec<Decimal> = vec![];
        assert_eq!(sum(&empty), Decimal::ZERO);
    }

    #[test]
    fn test_sum_does_not_round() {
        let amounts = vec![dec!(0.333), dec!(0.333), dec!(0.334)];
        assert_eq!(sum(&amounts), dec!(1.000));
        let thirds = vec![dec!(0.001), dec!(0.001)];
        assert_eq!(sum(&thirds), dec!(0.002));
    }
}

mod percentage {
    use super::*;

    #[test]
    fn test_fractional_rates_are_allowed() {
        let rate = Percentage::new(dec!(17.5)).unwrap();
        assert_eq!(rate.of(dec!(200)), dec!(35));
        assert_eq!(rate.to_string(), "17.5%");
    }

    #[test]
    fn test_zero_rate() {
        let rate = Percentage::zero();
        assert!(rate.is_zero());
        assert_eq!(rate.of(dec!(999.99)), Decimal::ZERO);
        assert_eq!(Percentage::default(), rate);
    }

    #[test]
    fn test_out_of_range_error_message() {
        let error = Percentage::try_from(dec!(101)).unwrap_err();
        assert_eq!(error, MoneyError::PercentageOutOfRange(dec!(101)));
        assert!(error.to_string().contains("between 0 and 100"));
    }

    #[test]
    fn test_percentage_into_decimal() {
        let rate = Percentage::new(dec!(7)).unwrap();
        let value: Decimal = rate.into();
        assert_eq!(value, dec!(7));
    }
}
