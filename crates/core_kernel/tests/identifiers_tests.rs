//! Unit tests for the identifier newtypes

use core_kernel::{BillingId, PaymentId, ClientId, StaffId};
use uuid::Uuid;

mod billing_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(BillingId::new(), BillingId::new());
    }

    #[test]
    fn test_new_generates_time_ordered_ids() {
        let first = BillingId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = BillingId::new();
        let a: Uuid = first.into();
        let b: Uuid = second.into();
        assert!(a < b);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(BillingId::prefix(), "BIL");
    }

    #[test]
    fn test_json_roundtrip() {
        let id = BillingId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: BillingId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_invalid_string_fails_to_parse() {
        assert!("BIL-not-a-uuid".parse::<BillingId>().is_err());
    }
}

mod prefixes {
    use super::*;

    #[test]
    fn test_each_type_has_distinct_prefix() {
        let prefixes = [
            BillingId::prefix(),
            PaymentId::prefix(),
            ClientId::prefix(),
            StaffId::prefix(),
        ];
        for (i, a) in prefixes.iter().enumerate() {
            for b in prefixes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_payment_display_uses_prefix() {
        let uuid = Uuid::new_v4();
        let id = PaymentId::from_uuid(uuid);
        assert_eq!(id.to_string(), format!("PAY-{}", uuid));
    }
}
