//! Custom Test Assertions
//!
//! Ledger-level checks with messages that name the offending document.

use rust_decimal::Decimal;
use std::collections::BTreeSet;

use domain_billing::{BillingDocument, PaymentState, PaymentStatus, PaymentTransaction};

use crate::ledger::InMemoryLedger;

/// Asserts a document's stored payment fields
pub fn assert_payment_state(
    document: &BillingDocument,
    total_paid: Decimal,
    outstanding_balance: Decimal,
    status: PaymentStatus,
) {
    assert_eq!(
        document.total_paid, total_paid,
        "total_paid mismatch on {}",
        document.doc_no()
    );
    assert_eq!(
        document.outstanding_balance, outstanding_balance,
        "outstanding_balance mismatch on {}",
        document.doc_no()
    );
    assert_eq!(document.status, status, "status mismatch on {}", document.doc_no());
}

/// Asserts every ledger invariant over a set of documents and payments
///
/// - `total_paid` equals the sum of the document's payment amounts
/// - `outstanding_balance = grand_total - total_paid`
/// - `status` follows the settlement rule
/// - every payment carries its parent's current snapshot
/// - no payment references a missing document
pub fn assert_invariants(documents: &[BillingDocument], payments: &[PaymentTransaction]) {
    let known: BTreeSet<_> = documents.iter().map(|d| d.id).collect();
    for payment in payments {
        assert!(
            known.contains(&payment.billing_id),
            "payment {} references missing document {}",
            payment.id,
            payment.billing_id
        );
    }

    for document in documents {
        let own: Vec<_> = payments.iter().filter(|p| p.billing_id == document.id).collect();
        let sum: Decimal = own.iter().map(|p| p.amount_paid).sum();

        assert_eq!(
            document.total_paid, sum,
            "{}: total_paid {} != sum of payments {}",
            document.doc_no(),
            document.total_paid,
            sum
        );
        assert_eq!(
            document.outstanding_balance,
            document.grand_total - document.total_paid,
            "{}: balance is not grand_total - total_paid",
            document.doc_no()
        );

        let expected = PaymentState::derive(document.grand_total, sum);
        assert_eq!(document.status, expected.status, "{}: wrong status", document.doc_no());

        let snapshot = expected.snapshot(document.grand_total);
        for payment in own {
            assert_eq!(
                payment.snapshot, snapshot,
                "{}: stale snapshot on payment {}",
                document.doc_no(),
                payment.id
            );
        }
    }
}

/// Asserts every invariant over the committed contents of an in-memory ledger
pub async fn assert_ledger_consistent(ledger: &InMemoryLedger) {
    let (documents, payments) = ledger.dump().await;
    assert_invariants(&documents, &payments);
}
