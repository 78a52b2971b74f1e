//! Pre-built Test Fixtures
//!
//! Predictable salon data for unit and integration tests.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ClientCode, Percentage, RecipientId, ServiceLine, StaffId};
use domain_billing::Actor;

/// The salon's service menu
pub static SERVICE_MENU: Lazy<Vec<ServiceLine>> = Lazy::new(|| {
    vec![
        ServiceFixtures::haircut(),
        ServiceFixtures::hair_colour(),
        ServiceFixtures::facial(),
        ServiceFixtures::manicure(),
    ]
});

pub struct ServiceFixtures;

impl ServiceFixtures {
    fn line(name: &str, price: Decimal, minutes: u32) -> ServiceLine {
        ServiceLine {
            name: name.to_string(),
            price,
            duration: Some(minutes),
            description: None,
        }
    }

    pub fn haircut() -> ServiceLine {
        Self::line("Haircut", dec!(500), 30)
    }

    pub fn hair_colour() -> ServiceLine {
        Self::line("Hair Colour", dec!(1500), 90)
    }

    pub fn facial() -> ServiceLine {
        Self::line("Facial", dec!(800), 45)
    }

    pub fn manicure() -> ServiceLine {
        Self::line("Manicure", dec!(350.50), 40)
    }
}

/// Rates and amounts used across billing tests
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The default GST rate, 7%
    pub fn default_gst() -> Percentage {
        Percentage::new(dec!(7)).unwrap_or_default()
    }

    pub fn gst(rate: Decimal) -> Percentage {
        Percentage::new(rate).unwrap_or_else(|e| panic!("bad test rate {}: {}", rate, e))
    }

    /// 1000 at 18% less 100 discount gives 1062.00
    pub fn subtotal() -> Decimal {
        dec!(1000)
    }

    pub fn discount() -> Decimal {
        dec!(100)
    }
}

pub struct PhoneFixtures;

impl PhoneFixtures {
    /// Already normalised
    pub fn normalized() -> &'static str {
        "9876543210"
    }

    /// Normalises to [`PhoneFixtures::normalized`]
    pub fn formatted() -> &'static str {
        "(987) 654-3210"
    }

    pub fn other() -> &'static str {
        "9123456780"
    }
}

/// Fixed instants so date-window tests are deterministic
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Saturday 15 June 2024, 10:00 UTC
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    /// Start of the week containing [`TemporalFixtures::now`] (Sunday)
    pub fn week_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 9, 0, 0, 0).unwrap()
    }

    pub fn month_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    pub fn last_month() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
    }

    pub fn last_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 2, 9, 30, 0).unwrap()
    }
}

pub struct StaffFixtures;

impl StaffFixtures {
    pub fn admin_id() -> StaffId {
        StaffId::from_uuid(uuid::Uuid::from_u128(0xA1))
    }

    pub fn manager_id() -> StaffId {
        StaffId::from_uuid(uuid::Uuid::from_u128(0xB1))
    }

    pub fn admin() -> Actor {
        Actor::new(Self::admin_id(), "Owner")
    }

    pub fn admin_recipient() -> RecipientId {
        RecipientId::from_uuid(uuid::Uuid::from_u128(0xA1))
    }

    pub fn manager_recipient() -> RecipientId {
        RecipientId::from_uuid(uuid::Uuid::from_u128(0xB1))
    }
}

pub struct CodeFixtures;

impl CodeFixtures {
    pub fn first_client() -> ClientCode {
        ClientCode::from_sequence(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    #[test]
    fn test_menu_prices_are_two_decimal_places() {
        assert_eq!(SERVICE_MENU.len(), 4);
        assert!(SERVICE_MENU.iter().all(|s| s.price.scale() <= 2));
    }

    #[test]
    fn test_week_start_is_sunday_before_now() {
        assert_eq!(TemporalFixtures::week_start().weekday(), Weekday::Sun);
        assert!(TemporalFixtures::week_start() <= TemporalFixtures::now());
        assert_eq!(CodeFixtures::first_client().as_str(), "CLT001");
    }
}
