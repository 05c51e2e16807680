//! Storage ports for the billing ledger
//!
//! The services depend only on these traits. Adapters live in `infra_db`
//! (PostgreSQL) and `test_utils` (in memory).
//!
//! Writes go through a [`LedgerTx`]: one transaction per service call,
//! committed only after the triggering write and its reconciliation have
//! both succeeded.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    BillingId, ClientId, CurrencyCode, DomainPort, HealthCheckable, PaymentId, PortError,
};

use crate::document::{BillingDocument, DocumentNumber, DocumentType, ValidatedDocument};
use crate::payment::{PaymentSnapshot, PaymentTransaction, ValidatedPayment};
use crate::reconciliation::PaymentState;

/// Row to insert for a new document
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub id: BillingId,
    pub doc_no: DocumentNumber,
    pub document: ValidatedDocument,
    pub initial_state: PaymentState,
}

/// Row to insert for a new payment
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub id: PaymentId,
    pub payment: ValidatedPayment,
}

/// A document together with its client's contact details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentListing {
    pub document: BillingDocument,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
}

/// A payment together with the parent document's display fields
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentListing {
    pub payment: PaymentTransaction,
    pub doc_no: DocumentNumber,
    pub doc_type: DocumentType,
    pub currency: CurrencyCode,
    pub client_id: ClientId,
    pub client_name: Option<String>,
}

/// Read side of the ledger and entry point for transactions
#[async_trait]
pub trait LedgerStore: DomainPort + HealthCheckable + Clone {
    type Tx: LedgerTx;

    /// Opens a transaction
    async fn begin(&self) -> Result<Self::Tx, PortError>;

    async fn get_document(&self, id: BillingId) -> Result<Option<BillingDocument>, PortError>;

    /// All documents, newest first
    async fn list_documents(&self) -> Result<Vec<DocumentListing>, PortError>;

    /// All payments, by payment date then creation time, newest first
    async fn list_payments(&self) -> Result<Vec<PaymentListing>, PortError>;

    /// Payments of one document, newest first
    async fn payments_for_document(
        &self,
        billing_id: BillingId,
    ) -> Result<Vec<PaymentTransaction>, PortError>;
}

/// Operations available inside one ledger transaction
///
/// Dropping a transaction without calling [`commit`](LedgerTx::commit)
/// discards its writes.
#[async_trait]
pub trait LedgerTx: Send {
    /// Reads a document and holds its row lock until the transaction ends
    async fn lock_document(&mut self, id: BillingId) -> Result<Option<BillingDocument>, PortError>;

    async fn insert_document(&mut self, row: NewDocument) -> Result<BillingDocument, PortError>;

    /// Persists the author-owned fields of a document
    async fn update_document(&mut self, document: &BillingDocument) -> Result<(), PortError>;

    /// Returns the number of rows removed
    async fn delete_document(&mut self, id: BillingId) -> Result<u64, PortError>;

    async fn delete_payments_for_document(&mut self, billing_id: BillingId) -> Result<u64, PortError>;

    async fn insert_payment(&mut self, row: NewPayment) -> Result<PaymentTransaction, PortError>;

    async fn find_payment(&mut self, id: PaymentId) -> Result<Option<PaymentTransaction>, PortError>;

    /// Persists the editable fields of a payment; `billing_id` is never written
    async fn update_payment(&mut self, payment: &PaymentTransaction) -> Result<(), PortError>;

    async fn delete_payment(&mut self, id: PaymentId) -> Result<u64, PortError>;

    /// Sum of `amount_paid` over the document's payments, zero if none
    async fn sum_payments(&mut self, billing_id: BillingId) -> Result<Decimal, PortError>;

    async fn write_payment_state(
        &mut self,
        billing_id: BillingId,
        state: &PaymentState,
    ) -> Result<(), PortError>;

    /// Returns the number of payment rows updated
    async fn write_payment_snapshots(
        &mut self,
        billing_id: BillingId,
        snapshot: &PaymentSnapshot,
    ) -> Result<u64, PortError>;

    async fn commit(self) -> Result<(), PortError>;

    async fn rollback(self) -> Result<(), PortError>;
}
