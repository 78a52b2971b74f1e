//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;
use core_kernel::PortError;
use rust_decimal_macros::dec;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_invalid_identifier() {
    let error = "XYZ1".parse::<core_kernel::BillNumber>().unwrap_err();

    match error {
        CoreError::InvalidIdentifier(msg) => assert!(msg.contains("XYZ1")),
        _ => panic!("Expected InvalidIdentifier error"),
    }
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Bill not found");
    assert_eq!(error.to_string(), "Not found: Bill not found");
}

#[test]
fn test_core_error_from_money_error() {
    let core_error: CoreError = MoneyError::PercentageOutOfRange(dec!(150)).into();

    match core_error {
        CoreError::Money(MoneyError::PercentageOutOfRange(value)) => assert_eq!(value, dec!(150)),
        _ => panic!("Expected Money error"),
    }
}

#[test]
fn test_port_error_validation_field() {
    let error = PortError::validation_field("must not be empty", "phoneNumber");

    match error {
        PortError::Validation { message, field } => {
            assert_eq!(message, "must not be empty");
            assert_eq!(field.as_deref(), Some("phoneNumber"));
        }
        _ => panic!("Expected Validation error"),
    }
}
