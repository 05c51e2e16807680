//! Core Kernel - Foundational types shared by the billing workspace
//!
//! This crate provides the building blocks used by every other crate:
//! - Strongly-typed identifiers for documents, payments, clients and staff
//! - Currency codes and monetary helpers on top of `rust_decimal`
//! - The port error type and health-check abstractions used by adapters
//! - The staff directory port consumed by authentication

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;
pub mod staff;

pub use money::{
    check_amount_range, is_positive_amount, max_amount, round_money, CurrencyCode, MoneyError,
};
pub use identifiers::{BillingId, PaymentId, ClientId, StaffId};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use staff::{StaffAccount, StaffDirectory};
