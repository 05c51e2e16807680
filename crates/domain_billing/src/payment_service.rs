//! Payment Transaction Service
//!
//! Records, edits and reverses payments. The parent document id is always
//! taken from the stored payment row, never from the caller, and the parent
//! is reconciled in the same transaction as the payment write.

use tracing::{info, instrument};

use core_kernel::{BillingId, PaymentId};

use crate::error::BillingError;
use crate::payment::{CreatePayment, PaymentChanges};
use crate::ports::{LedgerStore, LedgerTx, NewPayment, PaymentListing};
use crate::reconciliation::{reconcile, PaymentState, Reconciliation};
use crate::transaction::complete;

const ENTITY: &str = "PaymentTransaction";

/// Service over payment transactions
#[derive(Debug, Clone)]
pub struct PaymentService<S> {
    store: S,
}

impl<S: LedgerStore> PaymentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records a payment against an existing document
    ///
    /// # Errors
    ///
    /// `Validation` when the billing id is missing or unknown, the amount is
    /// not positive, or the payment method is blank.
    #[instrument(skip(self, request), fields(billing_id))]
    pub async fn create_payment(&self, request: CreatePayment) -> Result<PaymentId, BillingError> {
        let payment = request.validate()?;
        let billing_id = payment.billing_id;
        tracing::Span::current().record("billing_id", tracing::field::display(billing_id));

        let mut tx = self.store.begin().await?;
        let result = async {
            if tx.lock_document(billing_id).await?.is_none() {
                return Err(BillingError::validation(format!(
                    "billing document {} does not exist",
                    billing_id
                )));
            }

            let row = NewPayment {
                id: PaymentId::new(),
                payment,
            };
            let inserted = tx.insert_payment(row).await?;
            let reconciliation = reconcile(&mut tx, billing_id).await?;
            Ok::<_, BillingError>((inserted, reconciliation))
        }
        .await;
        let (inserted, reconciliation) = complete(tx, result).await?;

        info!(
            payment_id = %inserted.id,
            amount = %inserted.amount_paid,
            status = ?reconciliation.state().map(|s| s.status),
            "payment recorded"
        );
        Ok(inserted.id)
    }

    /// Edits a payment and reconciles its document from scratch
    ///
    /// Returns the parent's new payment state.
    #[instrument(skip(self, changes), fields(payment_id = %id))]
    pub async fn update_payment(
        &self,
        id: PaymentId,
        changes: PaymentChanges,
    ) -> Result<PaymentState, BillingError> {
        let changes = changes.validate()?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let billing_id = self.stored_parent(&mut tx, id).await?;
            // Parent lock first, then re-read the payment under it.
            tx.lock_document(billing_id).await?;

            let mut payment = tx
                .find_payment(id)
                .await?
                .ok_or_else(|| BillingError::not_found(ENTITY, id))?;
            payment.apply(changes);
            tx.update_payment(&payment).await?;

            let state = match reconcile(&mut tx, billing_id).await? {
                Reconciliation::Applied { state, .. } => state,
                Reconciliation::Skipped { .. } => {
                    return Err(BillingError::not_found("BillingDocument", billing_id))
                }
            };
            Ok::<_, BillingError>((billing_id, state))
        }
        .await;
        let (billing_id, state) = complete(tx, result).await?;

        info!(%billing_id, status = %state.status, total_paid = %state.total_paid, "payment updated");
        Ok(state)
    }

    /// Reverses a payment by deleting it, then reconciles its document
    ///
    /// If the document vanished concurrently the reconciliation is a no-op
    /// and the deletion still commits.
    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn delete_payment(&self, id: PaymentId) -> Result<Reconciliation, BillingError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let billing_id = self.stored_parent(&mut tx, id).await?;
            tx.lock_document(billing_id).await?;

            if tx.delete_payment(id).await? == 0 {
                return Err(BillingError::not_found(ENTITY, id));
            }
            Ok::<_, BillingError>(reconcile(&mut tx, billing_id).await?)
        }
        .await;
        let reconciliation = complete(tx, result).await?;

        info!(skipped = reconciliation.is_skipped(), "payment reversed");
        Ok(reconciliation)
    }

    /// All payments with their document and customer display fields
    pub async fn list_payments(&self) -> Result<Vec<PaymentListing>, BillingError> {
        Ok(self.store.list_payments().await?)
    }

    async fn stored_parent(&self, tx: &mut S::Tx, id: PaymentId) -> Result<BillingId, BillingError> {
        tx.find_payment(id)
            .await?
            .map(|payment| payment.billing_id)
            .ok_or_else(|| BillingError::not_found(ENTITY, id))
    }
}
