//! Tests for the billing domain rules

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BillingId, ClientId, CurrencyCode};

use domain_billing::{
    BillingDocument, CreateDocument, DocumentChanges, DocumentNumber, DocumentTotals,
    DocumentType, PaymentState, PaymentStatus, ServiceLine,
};

fn sample_document(grand_total: Decimal) -> BillingDocument {
    let now = Utc::now();
    BillingDocument {
        id: BillingId::new(),
        doc_type: DocumentType::Quotation,
        doc_suffix: 654_321,
        currency: CurrencyCode::parse("KES").unwrap(),
        client_id: ClientId::new(),
        notes: None,
        services: vec![ServiceLine::new("Website build", grand_total)],
        subtotal: grand_total,
        vat_total: Decimal::ZERO,
        grand_total,
        status: PaymentStatus::Pending,
        total_paid: Decimal::ZERO,
        outstanding_balance: grand_total,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Document Type and Number Tests
// ============================================================================

mod document_number_tests {
    use super::*;

    #[test]
    fn test_document_type_parse_is_case_insensitive() {
        assert_eq!("Invoice".parse::<DocumentType>().unwrap(), DocumentType::Invoice);
        assert_eq!(" QUOTATION ".parse::<DocumentType>().unwrap(), DocumentType::Quotation);
    }

    #[test]
    fn test_document_type_rejects_unknown() {
        let err = "receipt".parse::<DocumentType>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_document_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&DocumentType::Invoice).unwrap(), "\"invoice\"");
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(DocumentType::Invoice.prefix(), "INV");
        assert_eq!(DocumentType::Quotation.prefix(), "QUO");
    }

    #[test]
    fn test_issue_wraps_at_one_million() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let number = DocumentNumber::issue(DocumentType::Quotation, at);
        assert_eq!(number.suffix(), 0);
        assert_eq!(number.to_string(), "QUO-000000");
    }

    #[test]
    fn test_display_parses_back() {
        let number: DocumentNumber = "INV-004711".parse().unwrap();
        assert_eq!(number.doc_type(), DocumentType::Invoice);
        assert_eq!(number.suffix(), 4711);
        assert_eq!(number.to_string(), "INV-004711");
    }

    #[test]
    fn test_new_rejects_seven_digits() {
        assert!(DocumentNumber::new(DocumentType::Invoice, 1_000_000).is_err());
    }
}

// ============================================================================
// Totals Tests
// ============================================================================

mod totals_tests {
    use super::*;

    #[test]
    fn test_totals_from_services() {
        let services = vec![
            ServiceLine::new("Hosting", dec!(1000)).with_vat().with_frequency("Monthly"),
            ServiceLine::new("Domain", dec!(250)),
        ];
        let totals = DocumentTotals::from_services(&services);

        assert_eq!(totals.subtotal, dec!(1250));
        assert_eq!(totals.vat_total, dec!(160));
        assert_eq!(totals.grand_total, dec!(1410));
    }

    #[test]
    fn test_vat_is_rounded_to_cents() {
        let services = vec![ServiceLine::new("Consulting", dec!(10.05)).with_vat()];
        let totals = DocumentTotals::from_services(&services);

        // 10.05 * 0.16 = 1.608
        assert_eq!(totals.vat_total, dec!(1.61));
        assert_eq!(totals.grand_total, dec!(11.66));
    }

    #[test]
    fn test_empty_services_total_zero() {
        let totals = DocumentTotals::from_services(&[]);
        assert_eq!(totals.grand_total, Decimal::ZERO);
    }
}

// ============================================================================
// Create / Update Validation Tests
// ============================================================================

mod validation_tests {
    use super::*;

    fn request() -> CreateDocument {
        CreateDocument {
            doc_type: "invoice".to_string(),
            currency: "kes".to_string(),
            client_id: Some(ClientId::new()),
            services: vec![ServiceLine::new("Audit", dec!(500)).with_vat()],
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_totals_fall_back_to_services() {
        let validated = request().validate().unwrap();
        assert_eq!(validated.totals.subtotal, dec!(500));
        assert_eq!(validated.totals.vat_total, dec!(80));
        assert_eq!(validated.totals.grand_total, dec!(580));
        assert_eq!(validated.currency.as_str(), "KES");
    }

    #[test]
    fn test_supplied_totals_win() {
        let mut req = request();
        req.grand_total = Some(dec!(1000));
        let validated = req.validate().unwrap();
        assert_eq!(validated.totals.grand_total, dec!(1000));
        assert_eq!(validated.totals.subtotal, dec!(500));
    }

    #[test]
    fn test_negative_grand_total_rejected() {
        let mut req = request();
        req.grand_total = Some(dec!(-1));
        assert!(req.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_bad_currency_rejected() {
        let mut req = request();
        req.currency = "shillings".to_string();
        assert!(req.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_bad_type_rejected() {
        let mut req = request();
        req.doc_type = "receipt".to_string();
        assert!(req.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_blank_service_description_rejected() {
        let mut req = request();
        req.services.push(ServiceLine::new("  ", dec!(1)));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_changes_coalesce_unset_fields() {
        let mut document = sample_document(dec!(1000));
        let before = document.clone();

        let changes = DocumentChanges {
            notes: Some("Net 30".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        document.apply(changes);

        assert_eq!(document.notes.as_deref(), Some("Net 30"));
        assert_eq!(document.grand_total, before.grand_total);
        assert_eq!(document.currency, before.currency);
        assert_eq!(document.client_id, before.client_id);
        assert_eq!(document.services, before.services);
    }

    #[test]
    fn test_type_change_keeps_suffix() {
        let mut document = sample_document(dec!(1000));
        assert_eq!(document.doc_no().to_string(), "QUO-654321");

        let changes = DocumentChanges {
            doc_type: Some("invoice".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        document.apply(changes);

        assert_eq!(document.doc_no().to_string(), "INV-654321");
    }

    #[test]
    fn test_changes_leave_payment_fields_alone() {
        let mut document = sample_document(dec!(1000));
        document.total_paid = dec!(400);
        document.outstanding_balance = dec!(600);
        document.status = PaymentStatus::Partial;

        let changes = DocumentChanges {
            grand_total: Some(dec!(2000)),
            ..Default::default()
        }
        .validate()
        .unwrap();
        document.apply(changes);

        assert_eq!(document.grand_total, dec!(2000));
        assert_eq!(document.payment_state(), PaymentState::derive(dec!(1000), dec!(400)));
    }
}

// ============================================================================
// Status Rule Tests
// ============================================================================

mod status_tests {
    use super::*;

    #[test]
    fn test_scenario_amounts() {
        let partial = PaymentState::derive(dec!(1000), dec!(400));
        assert_eq!(partial.status, PaymentStatus::Partial);
        assert_eq!(partial.outstanding_balance, dec!(600));

        let paid = PaymentState::derive(dec!(1000), dec!(1000));
        assert_eq!(paid.status, PaymentStatus::Paid);
        assert_eq!(paid.outstanding_balance, Decimal::ZERO);

        let over = PaymentState::derive(dec!(1000), dec!(1600));
        assert_eq!(over.status, PaymentStatus::Paid);
        assert_eq!(over.outstanding_balance, dec!(-600));

        let raised = PaymentState::derive(dec!(2000), dec!(1000));
        assert_eq!(raised.status, PaymentStatus::Partial);
    }

    #[test]
    fn test_snapshot_copies_state() {
        let state = PaymentState::derive(dec!(1000), dec!(250));
        let snapshot = state.snapshot(dec!(1000));
        assert_eq!(snapshot.grand_total, dec!(1000));
        assert_eq!(snapshot.total_received, dec!(250));
        assert_eq!(snapshot.outstanding_balance, dec!(750));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PaymentStatus::Partial).unwrap(), "\"partial\"");
    }
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn cents(minor: i64) -> Decimal {
        Decimal::new(minor, 2)
    }

    proptest! {
        #[test]
        fn balance_is_grand_total_minus_paid(
            grand in 0i64..100_000_000i64,
            paid in 0i64..100_000_000i64
        ) {
            let state = PaymentState::derive(cents(grand), cents(paid));
            prop_assert_eq!(state.outstanding_balance, cents(grand) - state.total_paid);
        }

        #[test]
        fn status_matches_rule(
            grand in 0i64..100_000_000i64,
            paid in 0i64..100_000_000i64
        ) {
            let state = PaymentState::derive(cents(grand), cents(paid));
            let expected = if paid >= grand && grand > 0 {
                PaymentStatus::Paid
            } else if paid > 0 {
                PaymentStatus::Partial
            } else {
                PaymentStatus::Pending
            };
            prop_assert_eq!(state.status, expected);
            prop_assert_eq!(state.status == PaymentStatus::Pending, paid == 0);
        }

        #[test]
        fn derive_is_idempotent(
            grand in 0i64..100_000_000i64,
            paid in 0i64..100_000_000i64
        ) {
            let first = PaymentState::derive(cents(grand), cents(paid));
            let second = PaymentState::derive(cents(grand), first.total_paid);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn totals_are_consistent(prices in prop::collection::vec((0i64..10_000_000i64, any::<bool>()), 0..20)) {
            let services: Vec<ServiceLine> = prices
                .iter()
                .map(|(minor, vat)| {
                    let line = ServiceLine::new("Item", cents(*minor));
                    if *vat { line.with_vat() } else { line }
                })
                .collect();
            let totals = DocumentTotals::from_services(&services);
            prop_assert_eq!(totals.grand_total, totals.subtotal + totals.vat_total);
            prop_assert!(totals.vat_total <= totals.subtotal);
        }
    }
}
