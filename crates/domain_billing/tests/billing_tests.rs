//! Tests for bill calculation, the bill lifecycle and bill queries

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ClientId, PaymentMethod, PaymentStatus, Percentage, ServiceLine, StaffId};
use domain_billing::{
    Actor, AppliedTo, Bill, BillAmounts, BillQuery, BillingError, CreateBillRequest, GstConfig, GstUpdate,
    PaymentUpdate,
};

fn rate(value: Decimal) -> Percentage {
    Percentage::new(value).unwrap()
}

fn bill(client_id: ClientId, name: &str, phone: &str) -> Bill {
    let request: CreateBillRequest = serde_json::from_value(serde_json::json!({
        "clientId": client_id,
        "clientName": name,
        "clientPhone": phone,
        "services": [{"name": "Facial", "price": 2500}],
        "subtotal": 2500,
        "discount": 500,
        "paymentMethod": "card",
        "specialist": "Hina"
    }))
    .unwrap();
    let draft = request.validate().unwrap();
    let amounts = BillAmounts::from_subtotal(draft.subtotal, draft.discount, rate(dec!(7)));
    Bill::new(draft, client_id, phone.to_string(), amounts)
}

// ============================================================================
// Calculation Tests
// ============================================================================

mod calculation_tests {
    use super::*;

    #[test]
    fn test_documented_scenarios() {
        let services = vec![ServiceLine::new("Haircut", dec!(1000)).unwrap()];
        let plain = BillAmounts::from_services(&services, Decimal::ZERO, rate(dec!(7)));
        assert_eq!(
            (plain.subtotal, plain.amount_before_gst, plain.gst_amount, plain.final_amount),
            (dec!(1000), dec!(1000), dec!(70.00), dec!(1070.00))
        );

        let negative = BillAmounts::from_subtotal(dec!(30), dec!(50), rate(dec!(7)));
        assert_eq!(
            (negative.amount_before_gst, negative.gst_amount, negative.final_amount),
            (dec!(-20), dec!(-1.40), dec!(-21.40))
        );
    }

    #[test]
    fn test_bill_snapshots_rate() {
        let bill = bill(ClientId::new(), "Jane", "5551234");
        assert_eq!(bill.subtotal, dec!(2500));
        assert_eq!(bill.amount_before_gst, dec!(2000));
        assert_eq!(bill.gst_percentage, dec!(7));
        assert_eq!(bill.gst_amount, dec!(140.00));
        assert_eq!(bill.final_amount, dec!(2140.00));
        assert_eq!(bill.total_amount, bill.subtotal);
    }
}

// ============================================================================
// GST Configuration Tests
// ============================================================================

mod gst_config_tests {
    use super::*;

    #[test]
    fn test_revision_carries_forward_omitted_fields() {
        let actor = Actor::new(StaffId::new(), "Owner");
        let seed = GstConfig::seed(&actor);
        let update = GstUpdate::parse(None, Some(false), Some("deals")).unwrap();
        let next = seed.revise(&update, &actor);

        assert_eq!(next.revision, seed.revision + 1);
        assert_eq!(next.gst_percentage, seed.gst_percentage);
        assert!(!next.is_active);
        assert_eq!(next.applied_to, AppliedTo::Deals);
        assert!(next.effective_rate().is_zero());
        assert_eq!(seed.effective_rate().value(), dec!(7));
    }

    #[test]
    fn test_config_json_shape() {
        let config = GstConfig::seed(&Actor::new(StaffId::new(), "Owner"));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["gstPercentage"], "7");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["appliedTo"], "all");
        assert_eq!(json["updatedByName"], "Owner");
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_every_status_is_accepted_on_update() {
        for status in PaymentStatus::ALL {
            let change = PaymentUpdate {
                payment_status: Some(status.as_str().to_string()),
                ..Default::default()
            }
            .validate()
            .unwrap();
            assert_eq!(change.payment_status, Some(status));
        }
    }

    #[test]
    fn test_update_changes_only_listed_fields() {
        let mut bill = bill(ClientId::new(), "Jane", "5551234");
        let before = bill.clone();
        let change = PaymentUpdate {
            payment_method: Some("online".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        bill.apply_payment(change, Utc::now());

        assert_eq!(bill.payment_method, PaymentMethod::Online);
        assert_eq!(bill.payment_status, before.payment_status);
        assert_eq!(bill.notes, before.notes);
        assert_eq!(bill.final_amount, before.final_amount);
        assert!(bill.paid_at.is_none());
    }

    #[test]
    fn test_cancel_from_any_status() {
        for status in PaymentStatus::ALL {
            let mut bill = bill(ClientId::new(), "Jane", "5551234");
            bill.payment_status = status;
            bill.cancel(Some("no show"), Utc::now());
            assert_eq!(bill.payment_status, PaymentStatus::Cancelled);
            assert_eq!(bill.notes, "Cancelled: no show");
        }
    }

    #[test]
    fn test_invalid_method_is_validation_error() {
        let update = PaymentUpdate {
            payment_method: Some("cheque".to_string()),
            ..Default::default()
        };
        assert!(matches!(update.validate(), Err(BillingError::Validation(_))));
    }

    #[test]
    fn test_printable_view() {
        let bill = bill(ClientId::new(), "Jane", "5551234");
        let json = serde_json::to_value(bill.printable()).unwrap();
        assert_eq!(json["total"], "2140.00");
        assert_eq!(json["amountBeforeGST"].as_str().unwrap().parse::<Decimal>().unwrap(), dec!(2000));
        assert_eq!(json["specialist"], "Hina");
        assert_eq!(json["clientPhone"], "5551234");
    }
}

// ============================================================================
// Query Tests
// ============================================================================

mod query_tests {
    use super::*;

    #[test]
    fn test_text_matches_name_or_phone() {
        let bill = bill(ClientId::new(), "Jane Doe", "923001234567");
        assert!(BillQuery::matching("doe").matches(&bill));
        assert!(BillQuery::matching("300123").matches(&bill));
        assert!(!BillQuery::matching("john").matches(&bill));
    }

    #[test]
    fn test_filters_combine() {
        let client_id = ClientId::new();
        let bill = bill(client_id, "Jane", "5551234");

        assert!(BillQuery::for_client(client_id).matches(&bill));
        assert!(!BillQuery::for_client(ClientId::new()).matches(&bill));
        assert!(!BillQuery::for_client(client_id)
            .with_status(Some(PaymentStatus::Paid))
            .matches(&bill));

        let window = BillQuery::default().created_between(
            Some(bill.created_at - Duration::minutes(1)),
            Some(bill.created_at + Duration::minutes(1)),
        );
        assert!(window.matches(&bill));
        let later = BillQuery::default().created_between(Some(bill.created_at + Duration::minutes(1)), None);
        assert!(!later.matches(&bill));
    }
}
