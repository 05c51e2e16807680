//! Currency codes and monetary helpers
//!
//! Amounts are plain `rust_decimal::Decimal` values stored with two decimal
//! places. Currencies are labels only: there is no conversion between them,
//! so a `CurrencyCode` is validated for shape and nothing else.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal places monetary amounts are persisted with
pub const MONEY_SCALE: u32 = 2;

/// Largest storable amount in minor units, matching `NUMERIC(14, 2)`
pub const MAX_AMOUNT_MINOR: i64 = 99_999_999_999_999;

/// Errors that can occur when parsing monetary input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid currency code '{0}': expected three letters such as KES or USD")]
    InvalidCurrency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// A three-letter currency label (e.g. `KES`, `USD`)
///
/// Input is trimmed and upper-cased, so `" kes"` and `"KES"` are the same
/// code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidCurrency` unless the trimmed input is
    /// exactly three ASCII letters.
    pub fn parse(raw: &str) -> Result<Self, MoneyError> {
        let trimmed = raw.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MoneyError::InvalidCurrency(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.0
    }
}

/// Rounds an amount to the persisted scale, midpoint away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest amount a money column can hold (999 999 999 999.99)
pub fn max_amount() -> Decimal {
    Decimal::new(MAX_AMOUNT_MINOR, MONEY_SCALE)
}

/// Rejects amounts whose magnitude does not fit a money column
///
/// # Errors
///
/// Returns `MoneyError::InvalidAmount` when `|amount|` exceeds [`max_amount`].
pub fn check_amount_range(amount: Decimal) -> Result<Decimal, MoneyError> {
    let max = max_amount();
    if amount.abs() > max {
        return Err(MoneyError::InvalidAmount(format!(
            "{} exceeds the maximum of {}",
            amount, max
        )));
    }
    Ok(amount)
}

/// Returns true if the amount is strictly greater than zero
pub fn is_positive_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_is_normalized() {
        let code = CurrencyCode::parse(" kes ").unwrap();
        assert_eq!(code.as_str(), "KES");
    }

    #[test]
    fn test_currency_rejects_malformed_codes() {
        assert!(CurrencyCode::parse("").is_err());
        assert!(CurrencyCode::parse("US").is_err());
        assert!(CurrencyCode::parse("USDT").is_err());
        assert!(CurrencyCode::parse("U$D").is_err());
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.01));
        assert_eq!(round_money(dec!(-10.005)), dec!(-10.01));
        assert_eq!(round_money(dec!(3.14159)), dec!(3.14));
    }

    #[test]
    fn test_amount_range_matches_column_precision() {
        assert_eq!(check_amount_range(dec!(999999999999.99)), Ok(dec!(999999999999.99)));
        assert_eq!(check_amount_range(dec!(-999999999999.99)), Ok(dec!(-999999999999.99)));
        assert!(matches!(
            check_amount_range(dec!(1000000000000)),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(check_amount_range(dec!(-1000000000000)).is_err());
    }

    #[test]
    fn test_is_positive_amount() {
        assert!(is_positive_amount(dec!(0.01)));
        assert!(!is_positive_amount(Decimal::ZERO));
        assert!(!is_positive_amount(dec!(-5)));
    }
}
