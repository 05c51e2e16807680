//! Service-level ledger scenarios against the in-memory adapter

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BillingId, PaymentId};
use domain_billing::{
    BillingDocumentService, DocumentChanges, DocumentType, PaymentChanges, PaymentService,
    PaymentStatus, Reconciliation,
};
use test_utils::{
    amount_change, assert_ledger_consistent, assert_payment_state, fake_customer_email,
    fake_customer_name, grand_total_change, mixed_services, CreateDocumentBuilder,
    CreatePaymentBuilder, DateFixtures, InMemoryLedger,
};

struct Harness {
    ledger: InMemoryLedger,
    documents: BillingDocumentService<InMemoryLedger>,
    payments: PaymentService<InMemoryLedger>,
}

impl Harness {
    fn new() -> Self {
        let ledger = InMemoryLedger::new();
        Self {
            documents: BillingDocumentService::new(ledger.clone()),
            payments: PaymentService::new(ledger.clone()),
            ledger,
        }
    }

    async fn invoice(&self, grand_total: Decimal) -> BillingId {
        let client = self.ledger.add_customer("Acme Traders", None).await;
        let request = CreateDocumentBuilder::invoice(client)
            .with_grand_total(grand_total)
            .build();
        self.documents.create_document(request).await.unwrap().id
    }

    async fn pay(&self, billing_id: BillingId, amount: Decimal) -> PaymentId {
        let request = CreatePaymentBuilder::new(billing_id, amount).build();
        self.payments.create_payment(request).await.unwrap()
    }
}

// ============================================================================
// Reference Scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn test_new_document_is_pending_with_full_balance() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;

        let state = h.documents.reconcile_document(id).await.unwrap();
        assert_eq!(state.total_paid, Decimal::ZERO);
        assert_eq!(state.outstanding_balance, dec!(1000));
        assert_eq!(state.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_full_payment_lifecycle() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;

        // 1. partial payment
        let first = h.pay(id, dec!(400)).await;
        let doc = h.ledger.document(id).await.unwrap();
        assert_payment_state(&doc, dec!(400), dec!(600), PaymentStatus::Partial);

        // 2. settles the invoice
        let second = h.pay(id, dec!(600)).await;
        let doc = h.ledger.document(id).await.unwrap();
        assert_payment_state(&doc, dec!(1000), Decimal::ZERO, PaymentStatus::Paid);

        // 3. overpayment through an edit
        let state = h.payments.update_payment(first, amount_change(dec!(1000))).await.unwrap();
        assert_eq!(state.total_paid, dec!(1600));
        assert_eq!(state.outstanding_balance, dec!(-600));
        assert_eq!(state.status, PaymentStatus::Paid);

        // 4. reversal re-sums the remaining payments
        let outcome = h.payments.delete_payment(second).await.unwrap();
        assert!(!outcome.is_skipped());
        let doc = h.ledger.document(id).await.unwrap();
        assert_payment_state(&doc, dec!(1000), Decimal::ZERO, PaymentStatus::Paid);

        // 5. raising the total drops the document back to partial
        let updated = h.documents.update_document(id, grand_total_change(dec!(2000))).await.unwrap();
        assert_eq!(updated.state.status, PaymentStatus::Partial);
        assert_eq!(updated.state.outstanding_balance, dec!(1000));

        assert_ledger_consistent(&h.ledger).await;
    }

    #[tokio::test]
    async fn test_delete_document_cascades_payments() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        h.pay(id, dec!(400)).await;
        h.pay(id, dec!(600)).await;

        let deleted = h.documents.delete_document(id).await.unwrap();
        assert_eq!(deleted.payments_removed, 2);
        assert!(h.ledger.payments_of(id).await.is_empty());
        assert!(h.ledger.document(id).await.is_none());

        let err = h.documents.payments_for_document(id).await.unwrap_err();
        assert!(err.is_not_found());
        assert_ledger_consistent(&h.ledger).await;
    }
}

// ============================================================================
// Document Service
// ============================================================================

mod document_service {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_prefixed_number() {
        let h = Harness::new();
        let client = h.ledger.add_customer("Beta Ltd", Some("ops@beta.test".into())).await;

        let created = h
            .documents
            .create_document(CreateDocumentBuilder::quotation(client).build())
            .await
            .unwrap();
        assert!(created.doc_no.to_string().starts_with("QUO-"));
        assert_eq!(created.doc_no.to_string().len(), 10);

        let doc = h.ledger.document(created.id).await.unwrap();
        assert_eq!(doc.doc_no(), created.doc_no);
        assert_payment_state(&doc, Decimal::ZERO, dec!(1000), PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_computes_missing_totals() {
        let h = Harness::new();
        let client = h.ledger.add_customer("Gamma", None).await;
        let request = CreateDocumentBuilder::invoice(client)
            .with_services(mixed_services())
            .build();

        let id = h.documents.create_document(request).await.unwrap().id;
        let doc = h.ledger.document(id).await.unwrap();
        assert_eq!(doc.subtotal, dec!(700.50));
        assert_eq!(doc.vat_total, dec!(80));
        assert_eq!(doc.grand_total, dec!(780.50));
        assert_eq!(doc.outstanding_balance, dec!(780.50));
    }

    #[tokio::test]
    async fn test_create_requires_client() {
        let h = Harness::new();
        let request = CreateDocumentBuilder::invoice(core_kernel::ClientId::new())
            .without_client()
            .build();
        let err = h.documents.create_document(request).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_create_with_unknown_client_is_validation_error() {
        let h = Harness::new();
        let request = CreateDocumentBuilder::invoice(core_kernel::ClientId::new()).build();
        let err = h.documents.create_document(request).await.unwrap_err();
        assert!(err.is_validation());
        assert!(h.ledger.dump().await.0.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_negative_total() {
        let h = Harness::new();
        let client = h.ledger.add_customer("Delta", None).await;
        let request = CreateDocumentBuilder::invoice(client)
            .with_grand_total(dec!(-5))
            .build();
        assert!(h.documents.create_document(request).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_create_normalizes_currency_and_keeps_notes() {
        let h = Harness::new();
        let email = fake_customer_email();
        let client = h.ledger.add_customer(fake_customer_name(), Some(email.clone())).await;
        let request = CreateDocumentBuilder::invoice(client)
            .with_currency(" usd ")
            .with_notes("Net 30")
            .build();

        let id = h.documents.create_document(request).await.unwrap().id;
        let doc = h.ledger.document(id).await.unwrap();
        assert_eq!(doc.currency.as_str(), "USD");
        assert_eq!(doc.notes.as_deref(), Some("Net 30"));

        let listed = h.documents.list_documents().await.unwrap();
        assert_eq!(listed[0].client_email.as_deref(), Some(email.as_str()));
    }

    #[tokio::test]
    async fn test_oversized_amounts_never_reach_storage() {
        let h = Harness::new();
        let client = h.ledger.add_customer("Eta", None).await;
        let request = CreateDocumentBuilder::invoice(client)
            .with_grand_total(dec!(1000000000000))
            .build();
        assert!(h.documents.create_document(request).await.unwrap_err().is_validation());
        assert!(h.ledger.dump().await.0.is_empty());

        let id = h.invoice(dec!(1000)).await;
        let err = h
            .documents
            .update_document(id, grand_total_change(dec!(1000000000000000)))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(h.ledger.document(id).await.unwrap().grand_total, dec!(1000));
    }

    #[tokio::test]
    async fn test_type_change_swaps_prefix_and_keeps_suffix() {
        let h = Harness::new();
        let client = h.ledger.add_customer("Epsilon", None).await;
        let created = h
            .documents
            .create_document(CreateDocumentBuilder::quotation(client).build())
            .await
            .unwrap();

        let changes = DocumentChanges {
            doc_type: Some("invoice".into()),
            ..Default::default()
        };
        let updated = h.documents.update_document(created.id, changes).await.unwrap();

        assert_eq!(updated.doc_no.doc_type(), DocumentType::Invoice);
        assert_eq!(updated.doc_no.suffix(), created.doc_no.suffix());
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        let before = h.ledger.document(id).await.unwrap();

        let changes = DocumentChanges {
            notes: Some("Deliver by Friday".into()),
            ..Default::default()
        };
        h.documents.update_document(id, changes).await.unwrap();

        let after = h.ledger.document(id).await.unwrap();
        assert_eq!(after.notes.as_deref(), Some("Deliver by Friday"));
        assert_eq!(after.grand_total, before.grand_total);
        assert_eq!(after.currency, before.currency);
        assert_eq!(after.services, before.services);
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let h = Harness::new();
        let err = h
            .documents
            .update_document(BillingId::new(), grand_total_change(dec!(10)))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_repeated_delete_reports_not_found() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;

        h.documents.delete_document(id).await.unwrap();
        let err = h.documents.delete_document(id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_reconcile_heals_manual_edits() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        h.pay(id, dec!(250)).await;

        h.ledger
            .tamper_document(id, |doc| {
                doc.total_paid = dec!(999);
                doc.status = PaymentStatus::Paid;
            })
            .await;

        let state = h.documents.reconcile_document(id).await.unwrap();
        assert_eq!(state.total_paid, dec!(250));
        assert_eq!(state.status, PaymentStatus::Partial);
        assert_ledger_consistent(&h.ledger).await;
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        h.pay(id, dec!(300)).await;

        let first = h.documents.reconcile_document(id).await.unwrap();
        let stored_first = h.ledger.document(id).await.unwrap();
        let second = h.documents.reconcile_document(id).await.unwrap();
        let stored_second = h.ledger.document(id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(stored_first.payment_state(), stored_second.payment_state());
    }

    #[tokio::test]
    async fn test_reconcile_missing_document_is_not_found() {
        let h = Harness::new();
        let err = h.documents.reconcile_document(BillingId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_documents_joins_customer() {
        let h = Harness::new();
        let client = h.ledger.add_customer("Zeta Corp", Some("billing@zeta.test".into())).await;
        h.documents
            .create_document(CreateDocumentBuilder::invoice(client).build())
            .await
            .unwrap();

        let listed = h.documents.list_documents().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].client_name.as_deref(), Some("Zeta Corp"));
        assert_eq!(listed[0].client_email.as_deref(), Some("billing@zeta.test"));
    }
}

// ============================================================================
// Payment Service
// ============================================================================

mod payment_service {
    use super::*;

    #[tokio::test]
    async fn test_payment_on_missing_document_is_validation_error() {
        let h = Harness::new();
        let request = CreatePaymentBuilder::new(BillingId::new(), dec!(10)).build();
        let err = h.payments.create_payment(request).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;

        for amount in [dec!(0), dec!(-10)] {
            let request = CreatePaymentBuilder::new(id, amount).build();
            assert!(h.payments.create_payment(request).await.unwrap_err().is_validation());
        }
        assert!(h.ledger.payments_of(id).await.is_empty());
    }

    #[tokio::test]
    async fn test_amount_beyond_column_precision_is_rejected() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;

        let request = CreatePaymentBuilder::new(id, dec!(1000000000000000)).build();
        assert!(h.payments.create_payment(request).await.unwrap_err().is_validation());

        let payment = h.pay(id, dec!(400)).await;
        let err = h
            .payments
            .update_payment(payment, amount_change(dec!(1000000000000)))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let doc = h.ledger.document(id).await.unwrap();
        assert_payment_state(&doc, dec!(400), dec!(600), PaymentStatus::Partial);
    }

    #[tokio::test]
    async fn test_payment_without_date_is_dated_today() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        let request = CreatePaymentBuilder::new(id, dec!(250))
            .via(" M-Pesa ")
            .without_date()
            .build();
        h.payments.create_payment(request).await.unwrap();

        let stored = h.ledger.payments_of(id).await;
        assert_eq!(stored[0].payment_date, chrono::Utc::now().date_naive());
        assert_eq!(stored[0].payment_method, "M-Pesa");
    }

    #[tokio::test]
    async fn test_payment_snapshots_follow_parent() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        h.pay(id, dec!(400)).await;
        h.pay(id, dec!(100)).await;

        for payment in h.ledger.payments_of(id).await {
            assert_eq!(payment.snapshot.grand_total, dec!(1000));
            assert_eq!(payment.snapshot.total_received, dec!(500));
            assert_eq!(payment.snapshot.outstanding_balance, dec!(500));
        }
    }

    #[tokio::test]
    async fn test_update_cannot_move_payment() {
        let h = Harness::new();
        let first_doc = h.invoice(dec!(1000)).await;
        let other_doc = h.invoice(dec!(1000)).await;
        let payment = h.pay(first_doc, dec!(400)).await;

        let changes = PaymentChanges {
            payment_date: Some(DateFixtures::second_payment()),
            payment_method: Some("Cheque".into()),
            ..Default::default()
        };
        h.payments.update_payment(payment, changes).await.unwrap();

        let stored = h.ledger.payments_of(first_doc).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].payment_method, "Cheque");
        assert_eq!(stored[0].payment_date, DateFixtures::second_payment());
        assert!(h.ledger.payments_of(other_doc).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_payment_is_not_found() {
        let h = Harness::new();
        let err = h
            .payments
            .update_payment(PaymentId::new(), amount_change(dec!(5)))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_repeated_payment_delete_is_not_found() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        let payment = h.pay(id, dec!(400)).await;

        let outcome = h.payments.delete_payment(payment).await.unwrap();
        assert!(matches!(outcome, Reconciliation::Applied { snapshots_refreshed: 0, .. }));

        let err = h.payments.delete_payment(payment).await.unwrap_err();
        assert!(err.is_not_found());

        let doc = h.ledger.document(id).await.unwrap();
        assert_payment_state(&doc, Decimal::ZERO, dec!(1000), PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_zero_total_document_never_reaches_paid() {
        let h = Harness::new();
        let id = h.invoice(Decimal::ZERO).await;
        h.pay(id, dec!(50)).await;

        let doc = h.ledger.document(id).await.unwrap();
        assert_payment_state(&doc, dec!(50), dec!(-50), PaymentStatus::Partial);
    }

    #[tokio::test]
    async fn test_list_payments_newest_date_first() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        let early = CreatePaymentBuilder::new(id, dec!(100)).on(DateFixtures::first_payment()).build();
        let late = CreatePaymentBuilder::new(id, dec!(200)).on(DateFixtures::second_payment()).build();
        h.payments.create_payment(early).await.unwrap();
        h.payments.create_payment(late).await.unwrap();

        let listed = h.payments.list_payments().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].payment.amount_paid, dec!(200));
        assert_eq!(listed[1].payment.amount_paid, dec!(100));
        assert!(listed[0].doc_no.to_string().starts_with("INV-"));
        assert_eq!(listed[0].client_name.as_deref(), Some("Acme Traders"));
    }
}

// ============================================================================
// Atomicity
// ============================================================================

mod rollback {
    use super::*;

    #[tokio::test]
    async fn test_failed_reconciliation_rolls_back_payment_insert() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        h.pay(id, dec!(400)).await;

        h.ledger.fail_next_snapshot_write();
        let request = CreatePaymentBuilder::new(id, dec!(600)).build();
        let err = h.payments.create_payment(request).await.unwrap_err();
        assert!(!err.is_validation() && !err.is_not_found());

        assert_eq!(h.ledger.payments_of(id).await.len(), 1);
        let doc = h.ledger.document(id).await.unwrap();
        assert_payment_state(&doc, dec!(400), dec!(600), PaymentStatus::Partial);
        assert_ledger_consistent(&h.ledger).await;
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_document_untouched() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        let payment = h.pay(id, dec!(400)).await;

        h.ledger.fail_next_commit();
        assert!(h.payments.delete_payment(payment).await.is_err());

        assert_eq!(h.ledger.payments_of(id).await.len(), 1);
        assert_ledger_consistent(&h.ledger).await;
    }

    #[tokio::test]
    async fn test_failed_document_update_keeps_old_total() {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        h.pay(id, dec!(1000)).await;

        h.ledger.fail_next_snapshot_write();
        assert!(h.documents.update_document(id, grand_total_change(dec!(2000))).await.is_err());

        let doc = h.ledger.document(id).await.unwrap();
        assert_eq!(doc.grand_total, dec!(1000));
        assert_eq!(doc.status, PaymentStatus::Paid);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;
    use core_kernel::{round_money, ClientId};
    use test_utils::{currency_strategy, ledger_history_strategy, service_line_strategy, LedgerOp};

    async fn replay(ops: Vec<LedgerOp>) {
        let h = Harness::new();
        let id = h.invoice(dec!(1000)).await;
        let mut live: Vec<PaymentId> = Vec::new();

        for op in ops {
            match op {
                LedgerOp::Post(amount) => live.push(h.pay(id, amount).await),
                LedgerOp::Edit(i, amount) if !live.is_empty() => {
                    let target = live[i % live.len()];
                    h.payments.update_payment(target, amount_change(amount)).await.unwrap();
                }
                LedgerOp::Reverse(i) if !live.is_empty() => {
                    let target = live.remove(i % live.len());
                    h.payments.delete_payment(target).await.unwrap();
                }
                LedgerOp::Retotal(total) => {
                    h.documents.update_document(id, grand_total_change(total)).await.unwrap();
                }
                _ => {}
            }
            assert_ledger_consistent(&h.ledger).await;
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn computed_totals_follow_line_items(
            services in prop::collection::vec(service_line_strategy(), 1..6),
            currency in currency_strategy(),
        ) {
            let request = CreateDocumentBuilder::invoice(ClientId::new())
                .with_services(services.clone())
                .with_currency(currency.clone())
                .build();
            let validated = request.validate().unwrap();

            let subtotal: Decimal = services.iter().map(|s| s.price).sum();
            let vat: Decimal = services.iter().map(|s| s.vat_amount()).sum();
            prop_assert_eq!(validated.totals.subtotal, round_money(subtotal));
            prop_assert_eq!(validated.totals.vat_total, round_money(vat));
            prop_assert_eq!(
                validated.totals.grand_total,
                validated.totals.subtotal + validated.totals.vat_total
            );
            prop_assert_eq!(validated.currency.as_str(), currency.to_ascii_uppercase());
        }

        #[test]
        fn invariants_hold_after_every_write(ops in ledger_history_strategy(24)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime.block_on(replay(ops));
        }
    }
}
