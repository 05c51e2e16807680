//! Property-Based Test Generators
//!
//! Proptest strategies for ledger operations, plus `fake` helpers for
//! realistic customer and reference data.

use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_billing::ServiceLine;

/// Positive amounts in cents, up to ten million
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Grand totals including zero
pub fn grand_total_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Three-letter currency codes in mixed case
pub fn currency_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("KES".to_string()),
        Just("usd".to_string()),
        Just("Eur".to_string()),
        Just("TZS".to_string()),
    ]
}

pub fn service_line_strategy() -> impl Strategy<Value = ServiceLine> {
    ("[A-Z][a-z]{2,12}", 0i64..10_000_000i64, any::<bool>()).prop_map(|(description, minor, vat)| {
        let line = ServiceLine::new(description, Decimal::new(minor, 2));
        if vat {
            line.with_vat()
        } else {
            line
        }
    })
}

/// One step in a random ledger history
#[derive(Debug, Clone)]
pub enum LedgerOp {
    /// Post a payment of this amount
    Post(Decimal),
    /// Change the amount of the n-th live payment (modulo count)
    Edit(usize, Decimal),
    /// Delete the n-th live payment (modulo count)
    Reverse(usize),
    /// Change the document's grand total
    Retotal(Decimal),
}

pub fn ledger_op_strategy() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        4 => amount_strategy().prop_map(LedgerOp::Post),
        2 => (any::<usize>(), amount_strategy()).prop_map(|(i, a)| LedgerOp::Edit(i, a)),
        2 => any::<usize>().prop_map(LedgerOp::Reverse),
        1 => grand_total_strategy().prop_map(LedgerOp::Retotal),
    ]
}

pub fn ledger_history_strategy(max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
    prop::collection::vec(ledger_op_strategy(), 1..max_len)
}

/// A plausible company name
pub fn fake_customer_name() -> String {
    CompanyName().fake()
}

pub fn fake_customer_email() -> String {
    SafeEmail().fake()
}

/// A bank-style transaction reference such as `TRX48213907`
pub fn fake_reference() -> String {
    format!("TRX{}", (10_000_000u32..99_999_999u32).fake::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_reference_shape() {
        let reference = fake_reference();
        assert!(reference.starts_with("TRX"));
        assert_eq!(reference.len(), 11);
    }

    proptest! {
        #[test]
        fn generated_amounts_are_positive(amount in amount_strategy()) {
            prop_assert!(amount > Decimal::ZERO);
        }
    }
}
