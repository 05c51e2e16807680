//! Billing Domain - Documents, Payments and Reconciliation
//!
//! This crate holds the billing rules of the ERP: invoices and quotations,
//! the payments recorded against them, and the reconciliation engine that
//! keeps the two consistent.
//!
//! # Ledger Invariants
//!
//! After every committed write, for every billing document:
//! - `total_paid` equals the sum of `amount_paid` over its payments
//! - `outstanding_balance = grand_total - total_paid` (negative on overpayment)
//! - `status` is `paid` iff `total_paid >= grand_total` and `grand_total > 0`,
//!   `pending` iff nothing was received, `partial` otherwise
//!
//! Both services route every write through [`reconcile`] inside a single
//! [`LedgerTx`], so the invariants cannot be observed half-applied.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingDocumentService, PaymentService, CreateDocument, CreatePayment};
//!
//! let documents = BillingDocumentService::new(store.clone());
//! let payments = PaymentService::new(store);
//!
//! let created = documents.create_document(request).await?;
//! payments.create_payment(CreatePayment {
//!     billing_id: Some(created.id),
//!     amount_paid: Some(dec!(400)),
//!     payment_method: Some("M-Pesa".into()),
//!     ..Default::default()
//! }).await?;
//! ```

pub mod document;
pub mod document_service;
pub mod error;
pub mod payment;
pub mod payment_service;
pub mod ports;
pub mod reconciliation;
pub mod transaction;

pub use document::{
    BillingDocument, CreateDocument, DocumentChanges, DocumentNumber, DocumentTotals,
    DocumentType, ServiceLine, ValidatedChanges, ValidatedDocument, VAT_RATE,
};
pub use document_service::{BillingDocumentService, CreatedDocument, DeletedDocument, UpdatedDocument};
pub use error::BillingError;
pub use payment::{
    CreatePayment, PaymentChanges, PaymentSnapshot, PaymentTransaction, ValidatedPayment,
    ValidatedPaymentChanges,
};
pub use payment_service::PaymentService;
pub use ports::{DocumentListing, LedgerStore, LedgerTx, NewDocument, NewPayment, PaymentListing};
pub use reconciliation::{reconcile, PaymentState, PaymentStatus, Reconciliation};
