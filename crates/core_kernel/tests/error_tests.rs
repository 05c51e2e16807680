//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;

#[test]
fn test_core_error_validation() {
    match CoreError::validation("Invalid input") {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_not_found() {
    match CoreError::not_found("Document not found") {
        CoreError::NotFound(msg) => assert_eq!(msg, "Document not found"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_core_error_from_money_error() {
    let core_error: CoreError = MoneyError::InvalidCurrency("XX".to_string()).into();
    assert!(matches!(core_error, CoreError::Money(_)));
    assert!(core_error.to_string().contains("XX"));
}

#[test]
fn test_core_error_configuration() {
    let error = CoreError::configuration("Missing JWT secret");
    assert!(error.to_string().contains("Configuration error"));
}
