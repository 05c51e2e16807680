//! Unit tests for currency codes and monetary helpers

use core_kernel::{CurrencyCode, MoneyError, round_money, is_positive_amount};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod currency {
    use super::*;

    #[test]
    fn test_known_codes_parse() {
        for raw in ["KES", "USD", "eur", " gbp"] {
            let code = CurrencyCode::parse(raw).unwrap();
            assert_eq!(code.as_str().len(), 3);
            assert!(code.as_str().chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_error_carries_raw_input() {
        let err = CurrencyCode::parse("shillings").unwrap_err();
        assert_eq!(err, MoneyError::InvalidCurrency("shillings".to_string()));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: CurrencyCode = serde_json::from_str("\"kes\"").unwrap();
        assert_eq!(ok.to_string(), "KES");

        let bad: Result<CurrencyCode, _> = serde_json::from_str("\"12\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let code = CurrencyCode::parse("usd").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"USD\"");
    }
}

mod amounts {
    use super::*;

    #[test]
    fn test_round_money_keeps_two_places() {
        assert_eq!(round_money(dec!(1000)), dec!(1000));
        assert_eq!(round_money(dec!(16.666)), dec!(16.67));
        assert_eq!(round_money(dec!(0.125)), dec!(0.13));
    }

    #[test]
    fn test_positive_amount_boundary() {
        assert!(!is_positive_amount(Decimal::ZERO));
        assert!(is_positive_amount(dec!(0.01)));
    }
}
