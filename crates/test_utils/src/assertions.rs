//! Custom Test Assertions
//!
//! Assertion helpers for billing arithmetic, client aggregates and side
//! effects, with messages that name the offending record.

use rust_decimal::Decimal;

use core_kernel::{round2, EffectStatus, Outcome, Page};
use domain_billing::Bill;
use domain_client::Client;

/// Asserts that an amount carries at most two decimal places
pub fn assert_two_dp(amount: Decimal) {
    assert_eq!(
        amount,
        amount.round_dp(2),
        "Expected at most two decimal places, got {}",
        amount
    );
}

/// Asserts the bill's derived amounts follow from subtotal, discount and rate
pub fn assert_bill_arithmetic(bill: &Bill) {
    let amount_before_gst = bill.subtotal - bill.discount;
    assert_eq!(
        bill.amount_before_gst, amount_before_gst,
        "Bill {}: amountBeforeGST {} != subtotal {} - discount {}",
        bill.bill_number, bill.amount_before_gst, bill.subtotal, bill.discount
    );

    let gst_amount = round2(amount_before_gst * bill.gst_percentage / Decimal::ONE_HUNDRED);
    assert_eq!(
        bill.gst_amount, gst_amount,
        "Bill {}: gstAmount {} at {}%",
        bill.bill_number, bill.gst_amount, bill.gst_percentage
    );

    assert_eq!(
        bill.final_amount,
        round2(amount_before_gst + gst_amount),
        "Bill {}: finalAmount {}",
        bill.bill_number,
        bill.final_amount
    );
    assert_two_dp(bill.gst_amount);
    assert_two_dp(bill.final_amount);
}

/// Asserts the client's cached aggregates agree with its visits
pub fn assert_client_aggregates(client: &Client) {
    assert_eq!(
        client.total_visits as usize,
        client.visits.len(),
        "Client {}: totalVisits {} but {} visits",
        client.client_id,
        client.total_visits,
        client.visits.len()
    );

    let spent: Decimal = client.visits.iter().map(|v| v.final_amount).sum();
    assert_eq!(
        client.total_spent, spent,
        "Client {}: totalSpent {} != sum of visit amounts {}",
        client.client_id, client.total_spent, spent
    );

    let latest = client.visits.iter().map(|v| v.date).max();
    assert_eq!(client.last_visit, latest, "Client {}: lastVisit", client.client_id);
}

/// Asserts that the named side effect was recorded with the given status
pub fn assert_side_effect<T>(outcome: &Outcome<T>, name: &str, status: EffectStatus) {
    let effect = outcome
        .effect(name)
        .unwrap_or_else(|| panic!("No side effect named {} in {:?}", name, outcome.side_effects));
    assert_eq!(
        effect.status, status,
        "Side effect {} was {:?} ({:?})",
        name, effect.status, effect.reason
    );
}

/// Asserts page metadata and the number of items on it
pub fn assert_page<T>(page: &Page<T>, total: u64, items: usize) {
    assert_eq!(page.total, total, "Expected {} matching rows, got {}", total, page.total);
    assert_eq!(page.items.len(), items, "Expected {} items on the page", items);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{TestBillBuilder, TestClientBuilder};
    use core_kernel::SideEffect;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_bills_pass() {
        let bill = TestBillBuilder::new()
            .with_subtotal(dec!(999.99))
            .with_discount(dec!(0.01))
            .with_rate(dec!(7.5))
            .build();
        assert_bill_arithmetic(&bill);
    }

    #[test]
    #[should_panic(expected = "finalAmount")]
    fn test_tampered_bill_fails() {
        let mut bill = TestBillBuilder::new().build();
        bill.final_amount += dec!(1);
        assert_bill_arithmetic(&bill);
    }

    #[test]
    fn test_client_aggregates() {
        let client = TestClientBuilder::new().with_visit(dec!(10)).with_visit(dec!(5.5)).build();
        assert_client_aggregates(&client);
    }

    #[test]
    fn test_side_effect_lookup() {
        let outcome = Outcome::new(()).with_effect(SideEffect::failed("notify_admins", "no recipients"));
        assert_side_effect(&outcome, "notify_admins", EffectStatus::Failed);
    }

    #[test]
    #[should_panic(expected = "No side effect named")]
    fn test_missing_side_effect_panics() {
        assert_side_effect(&Outcome::new(()), "record_visit", EffectStatus::Applied);
    }
}
