//! Billing Document Service
//!
//! Creates, edits and deletes invoices and quotations. Every edit ends with
//! a reconciliation in the same transaction, since `grand_total` may have
//! moved under existing payments.

use chrono::Utc;
use tracing::{info, instrument};

use core_kernel::BillingId;

use crate::document::{BillingDocument, CreateDocument, DocumentChanges, DocumentNumber};
use crate::error::BillingError;
use crate::payment::PaymentTransaction;
use crate::ports::{DocumentListing, LedgerStore, LedgerTx, NewDocument};
use crate::reconciliation::{reconcile, PaymentState, Reconciliation};
use crate::transaction::complete;

const ENTITY: &str = "BillingDocument";

/// Result of creating a document
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedDocument {
    pub id: BillingId,
    pub doc_no: DocumentNumber,
}

/// Result of updating a document
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedDocument {
    pub doc_no: DocumentNumber,
    pub state: PaymentState,
}

/// Result of deleting a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedDocument {
    pub payments_removed: u64,
}

/// Service over billing documents
#[derive(Debug, Clone)]
pub struct BillingDocumentService<S> {
    store: S,
}

impl<S: LedgerStore> BillingDocumentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a document with no payments
    ///
    /// The number is issued from the current timestamp and the payment
    /// fields start at `total_paid = 0`, `outstanding_balance = grand_total`,
    /// `status = pending`.
    #[instrument(skip(self, request), fields(doc_type = %request.doc_type))]
    pub async fn create_document(&self, request: CreateDocument) -> Result<CreatedDocument, BillingError> {
        let document = request.validate()?;
        let now = Utc::now();
        let row = NewDocument {
            id: BillingId::new(),
            doc_no: DocumentNumber::issue(document.doc_type, now),
            initial_state: PaymentState::unpaid(document.totals.grand_total),
            document,
        };

        let mut tx = self.store.begin().await?;
        let result = tx.insert_document(row).await.map_err(BillingError::from);
        let created = complete(tx, result).await?;

        let doc_no = created.doc_no();
        info!(billing_id = %created.id, %doc_no, grand_total = %created.grand_total, "billing document created");

        Ok(CreatedDocument {
            id: created.id,
            doc_no,
        })
    }

    /// Applies a partial update and reconciles the document
    #[instrument(skip(self, changes), fields(billing_id = %id))]
    pub async fn update_document(
        &self,
        id: BillingId,
        changes: DocumentChanges,
    ) -> Result<UpdatedDocument, BillingError> {
        let changes = changes.validate()?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let mut document = tx
                .lock_document(id)
                .await?
                .ok_or_else(|| BillingError::not_found(ENTITY, id))?;

            document.apply(changes);
            tx.update_document(&document).await?;

            let state = match reconcile(&mut tx, id).await? {
                Reconciliation::Applied { state, .. } => state,
                Reconciliation::Skipped { .. } => return Err(BillingError::not_found(ENTITY, id)),
            };
            Ok::<_, BillingError>(UpdatedDocument {
                doc_no: document.doc_no(),
                state,
            })
        }
        .await;
        let updated = complete(tx, result).await?;

        info!(
            doc_no = %updated.doc_no,
            status = %updated.state.status,
            outstanding = %updated.state.outstanding_balance,
            "billing document updated"
        );
        Ok(updated)
    }

    /// Deletes a document and every payment recorded against it
    ///
    /// Repeating the call for the same id reports `NotFound`.
    #[instrument(skip(self), fields(billing_id = %id))]
    pub async fn delete_document(&self, id: BillingId) -> Result<DeletedDocument, BillingError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            tx.lock_document(id)
                .await?
                .ok_or_else(|| BillingError::not_found(ENTITY, id))?;

            let payments_removed = tx.delete_payments_for_document(id).await?;
            if tx.delete_document(id).await? == 0 {
                return Err(BillingError::not_found(ENTITY, id));
            }
            Ok::<_, BillingError>(DeletedDocument { payments_removed })
        }
        .await;
        let deleted = complete(tx, result).await?;

        info!(payments_removed = deleted.payments_removed, "billing document deleted");
        Ok(deleted)
    }

    /// Recomputes a document's payment fields on demand
    #[instrument(skip(self), fields(billing_id = %id))]
    pub async fn reconcile_document(&self, id: BillingId) -> Result<PaymentState, BillingError> {
        let mut tx = self.store.begin().await?;
        let result = match reconcile(&mut tx, id).await {
            Ok(Reconciliation::Applied { state, .. }) => Ok(state),
            Ok(Reconciliation::Skipped { .. }) => Err(BillingError::not_found(ENTITY, id)),
            Err(error) => Err(error.into()),
        };
        let state = complete(tx, result).await?;

        info!(status = %state.status, total_paid = %state.total_paid, "billing document reconciled");
        Ok(state)
    }

    pub async fn get_document(&self, id: BillingId) -> Result<BillingDocument, BillingError> {
        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| BillingError::not_found(ENTITY, id))
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentListing>, BillingError> {
        Ok(self.store.list_documents().await?)
    }

    /// Payments of an existing document
    pub async fn payments_for_document(
        &self,
        id: BillingId,
    ) -> Result<Vec<PaymentTransaction>, BillingError> {
        if self.store.get_document(id).await?.is_none() {
            return Err(BillingError::not_found(ENTITY, id));
        }
        Ok(self.store.payments_for_document(id).await?)
    }
}
