//! Property-Based Test Generators
//!
//! Proptest strategies producing values that satisfy domain invariants.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{PaymentMethod, PaymentStatus, Percentage, ServiceLine};

/// Non-negative money with two decimal places, up to 1,000,000.00
pub fn money_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Money that may be negative
pub fn signed_money_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// A GST rate in 0..=100 with up to two decimal places
pub fn percentage_strategy() -> impl Strategy<Value = Percentage> {
    (0i64..=10_000i64).prop_map(|n| Percentage::new(Decimal::new(n, 2)).unwrap_or_default())
}

/// Whole-number rates as salons usually configure them
pub fn whole_percentage_strategy() -> impl Strategy<Value = Percentage> {
    (0i64..=100i64).prop_map(|n| Percentage::new(Decimal::from(n)).unwrap_or_default())
}

pub fn service_line_strategy() -> impl Strategy<Value = ServiceLine> {
    ("[A-Z][a-z]{2,12}( [A-Z][a-z]{2,8})?", money_strategy(), proptest::option::of(5u32..240u32)).prop_map(
        |(name, price, duration)| ServiceLine {
            name,
            price,
            duration,
            description: None,
        },
    )
}

/// One to eight services
pub fn services_strategy() -> impl Strategy<Value = Vec<ServiceLine>> {
    prop::collection::vec(service_line_strategy(), 1..8)
}

/// Ten digits, as stored after normalisation
pub fn normalized_phone_strategy() -> impl Strategy<Value = String> {
    "[6-9][0-9]{9}"
}

/// A normalised phone number and a formatted rendering of it
pub fn formatted_phone_strategy() -> impl Strategy<Value = (String, String)> {
    (normalized_phone_strategy(), 0usize..4).prop_map(|(digits, style)| {
        let formatted = match style {
            0 => digits.clone(),
            1 => format!("+{}", digits),
            2 => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
            _ => format!("{} {} {}", &digits[..3], &digits[3..6], &digits[6..]),
        };
        (digits, formatted)
    })
}

pub fn payment_status_strategy() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Pending),
        Just(PaymentStatus::Paid),
        Just(PaymentStatus::PartiallyPaid),
        Just(PaymentStatus::Cancelled),
        Just(PaymentStatus::Overdue),
    ]
}

pub fn payment_method_strategy() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::Online),
        Just(PaymentMethod::Other),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_client::normalize_phone;

    proptest! {
        #[test]
        fn test_money_has_two_dp(amount in money_strategy()) {
            prop_assert!(amount >= Decimal::ZERO);
            prop_assert!(amount.scale() <= 2);
        }

        #[test]
        fn test_formatted_phones_normalise(pair in formatted_phone_strategy()) {
            let (digits, formatted) = pair;
            prop_assert_eq!(normalize_phone(&formatted).unwrap(), digits);
        }

        #[test]
        fn test_service_lines_validate(services in services_strategy()) {
            prop_assert!(services.iter().all(|s| !s.name.trim().is_empty() && s.price >= Decimal::ZERO));
        }
    }
}
