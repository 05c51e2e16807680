//! Pre-built Test Fixtures
//!
//! Predictable values shared by unit, scenario and HTTP tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CurrencyCode, StaffAccount, StaffId};
use domain_billing::ServiceLine;

/// Money and currency fixtures
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn kes() -> CurrencyCode {
        CurrencyCode::parse("KES").expect("KES is a valid currency code")
    }

    pub fn usd() -> CurrencyCode {
        CurrencyCode::parse("USD").expect("USD is a valid currency code")
    }

    /// Grand total used by the reference payment scenarios
    pub fn grand_total() -> Decimal {
        dec!(1000)
    }
}

/// Line item fixtures
pub struct ServiceFixtures;

impl ServiceFixtures {
    pub fn web_hosting() -> ServiceLine {
        ServiceLine::new("Web hosting", dec!(500))
            .with_vat()
            .with_frequency("Monthly")
    }

    pub fn domain_renewal() -> ServiceLine {
        ServiceLine::new("Domain renewal", dec!(120)).with_frequency("Yearly")
    }

    /// A single untaxed line worth exactly `price`
    pub fn flat(price: Decimal) -> ServiceLine {
        ServiceLine::new("Consulting", price).with_frequency("One-off")
    }
}

/// Date fixtures
pub struct DateFixtures;

impl DateFixtures {
    pub fn first_payment() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
    }

    pub fn second_payment() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
    }
}

/// Staff and credential fixtures
pub struct StaffFixtures;

impl StaffFixtures {
    pub const ADMIN_EMAIL: &'static str = "admin@example.com";
    pub const CLERK_EMAIL: &'static str = "clerk@example.com";
    pub const PASSWORD: &'static str = "correct horse battery staple";

    /// Builds an account around an already computed password hash
    pub fn account(email: &str, role: &str, password_hash: String) -> StaffAccount {
        StaffAccount {
            id: StaffId::new(),
            email: email.to_string(),
            display_name: email.split('@').next().unwrap_or(email).to_string(),
            password_hash,
            role: role.to_string(),
            is_active: true,
        }
    }
}
