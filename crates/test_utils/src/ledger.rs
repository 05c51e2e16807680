//! In-memory ledger adapters
//!
//! Implement the same ports as `infra_db` without a database so service,
//! scenario and HTTP tests run anywhere. The state sits behind a
//! `tokio::sync::Mutex`; a transaction holds the owned guard for its whole
//! life (serializing writers like a row lock would) and mutates a working
//! copy that replaces the state only on commit.
//!
//! Constraints mirror the PostgreSQL schema: unknown customers or documents
//! on insert, deleting a document that still has payments, and amounts that
//! are non-positive or too large for `NUMERIC(14, 2)` are rejected as
//! validation errors.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use core_kernel::{
    max_amount, AdapterHealth, BillingId, ClientId, DomainPort, HealthCheckResult, HealthCheckable, PaymentId,
    PortError, StaffAccount, StaffDirectory,
};
use domain_billing::{
    BillingDocument, DocumentListing, LedgerStore, LedgerTx, NewDocument, NewPayment,
    PaymentListing, PaymentSnapshot, PaymentState, PaymentTransaction,
};

const FK_MESSAGE: &str = "referenced record does not exist";

fn check_stored_amount(amount: Decimal) -> Result<(), PortError> {
    if amount <= Decimal::ZERO || amount > max_amount() {
        return Err(PortError::validation_field(
            "amount_paid must be positive and fit NUMERIC(14, 2)",
            "amount_paid",
        ));
    }
    Ok(())
}

/// A customer row, as far as billing cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: ClientId,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    customers: BTreeMap<ClientId, Customer>,
    documents: BTreeMap<BillingId, BillingDocument>,
    payments: BTreeMap<PaymentId, PaymentTransaction>,
}

impl LedgerState {
    fn payments_of(&self, billing_id: BillingId) -> impl Iterator<Item = &PaymentTransaction> {
        self.payments
            .values()
            .filter(move |p| p.billing_id == billing_id)
    }
}

#[derive(Debug, Default)]
struct Faults {
    snapshot_write: AtomicBool,
    commit: AtomicBool,
}

/// In-memory implementation of `LedgerStore`
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    faults: Arc<Faults>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a customer and returns its id
    pub async fn add_customer(&self, name: impl Into<String>, email: Option<String>) -> ClientId {
        let customer = Customer {
            id: ClientId::new(),
            name: name.into(),
            email,
        };
        let id = customer.id;
        self.state.lock().await.customers.insert(id, customer);
        id
    }

    /// Makes the next snapshot write fail with a connection error
    pub fn fail_next_snapshot_write(&self) {
        self.faults.snapshot_write.store(true, Ordering::SeqCst);
    }

    /// Makes the next commit fail with a connection error
    pub fn fail_next_commit(&self) {
        self.faults.commit.store(true, Ordering::SeqCst);
    }

    /// Stored document, bypassing the ports
    pub async fn document(&self, id: BillingId) -> Option<BillingDocument> {
        self.state.lock().await.documents.get(&id).cloned()
    }

    /// Stored payments of a document, in insertion order
    pub async fn payments_of(&self, billing_id: BillingId) -> Vec<PaymentTransaction> {
        let state = self.state.lock().await;
        let mut payments: Vec<_> = state.payments_of(billing_id).cloned().collect();
        payments.sort_by_key(|p| p.created_at);
        payments
    }

    /// Every stored document and payment
    pub async fn dump(&self) -> (Vec<BillingDocument>, Vec<PaymentTransaction>) {
        let state = self.state.lock().await;
        (
            state.documents.values().cloned().collect(),
            state.payments.values().cloned().collect(),
        )
    }

    /// Edits a stored document directly, as a manual data fix would
    pub async fn tamper_document<F>(&self, id: BillingId, edit: F) -> bool
    where
        F: FnOnce(&mut BillingDocument),
    {
        match self.state.lock().await.documents.get_mut(&id) {
            Some(document) => {
                edit(document);
                true
            }
            None => false,
        }
    }
}

impl DomainPort for InMemoryLedger {}

#[async_trait]
impl HealthCheckable for InMemoryLedger {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-ledger".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    type Tx = InMemoryLedgerTx;

    async fn begin(&self) -> Result<Self::Tx, PortError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryLedgerTx {
            guard,
            working,
            faults: Arc::clone(&self.faults),
        })
    }

    async fn get_document(&self, id: BillingId) -> Result<Option<BillingDocument>, PortError> {
        Ok(self.document(id).await)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentListing>, PortError> {
        let state = self.state.lock().await;
        let mut listings: Vec<_> = state
            .documents
            .values()
            .map(|document| {
                let customer = state.customers.get(&document.client_id);
                DocumentListing {
                    document: document.clone(),
                    client_name: customer.map(|c| c.name.clone()),
                    client_email: customer.and_then(|c| c.email.clone()),
                }
            })
            .collect();
        listings.sort_by(|a, b| b.document.created_at.cmp(&a.document.created_at));
        Ok(listings)
    }

    async fn list_payments(&self) -> Result<Vec<PaymentListing>, PortError> {
        let state = self.state.lock().await;
        let mut listings = Vec::with_capacity(state.payments.len());
        for payment in state.payments.values() {
            let document = state
                .documents
                .get(&payment.billing_id)
                .ok_or_else(|| PortError::internal("payment references a missing document"))?;
            listings.push(PaymentListing {
                payment: payment.clone(),
                doc_no: document.doc_no(),
                doc_type: document.doc_type,
                currency: document.currency.clone(),
                client_id: document.client_id,
                client_name: state.customers.get(&document.client_id).map(|c| c.name.clone()),
            });
        }
        listings.sort_by(|a, b| {
            (b.payment.payment_date, b.payment.created_at)
                .cmp(&(a.payment.payment_date, a.payment.created_at))
        });
        Ok(listings)
    }

    async fn payments_for_document(
        &self,
        billing_id: BillingId,
    ) -> Result<Vec<PaymentTransaction>, PortError> {
        let state = self.state.lock().await;
        let mut payments: Vec<_> = state.payments_of(billing_id).cloned().collect();
        payments.sort_by(|a, b| {
            (b.payment_date, b.created_at).cmp(&(a.payment_date, a.created_at))
        });
        Ok(payments)
    }
}

/// A transaction over [`InMemoryLedger`]
///
/// Dropping it without `commit` discards the working copy.
pub struct InMemoryLedgerTx {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
    faults: Arc<Faults>,
}

impl std::fmt::Debug for InMemoryLedgerTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedgerTx").finish_non_exhaustive()
    }
}

fn injected(fault: &AtomicBool, operation: &str) -> Result<(), PortError> {
    if fault.swap(false, Ordering::SeqCst) {
        return Err(PortError::connection(format!("injected failure during {}", operation)));
    }
    Ok(())
}

#[async_trait]
impl LedgerTx for InMemoryLedgerTx {
    async fn lock_document(&mut self, id: BillingId) -> Result<Option<BillingDocument>, PortError> {
        Ok(self.working.documents.get(&id).cloned())
    }

    async fn insert_document(&mut self, row: NewDocument) -> Result<BillingDocument, PortError> {
        let document = row.document;
        if !self.working.customers.contains_key(&document.client_id) {
            return Err(PortError::validation(FK_MESSAGE));
        }
        let now = Utc::now();
        let stored = BillingDocument {
            id: row.id,
            doc_type: document.doc_type,
            doc_suffix: row.doc_no.suffix(),
            currency: document.currency,
            client_id: document.client_id,
            notes: document.notes,
            services: document.services,
            subtotal: document.totals.subtotal,
            vat_total: document.totals.vat_total,
            grand_total: document.totals.grand_total,
            status: row.initial_state.status,
            total_paid: row.initial_state.total_paid,
            outstanding_balance: row.initial_state.outstanding_balance,
            created_at: now,
            updated_at: now,
        };
        self.working.documents.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_document(&mut self, document: &BillingDocument) -> Result<(), PortError> {
        if !self.working.customers.contains_key(&document.client_id) {
            return Err(PortError::validation(FK_MESSAGE));
        }
        let stored = self
            .working
            .documents
            .get_mut(&document.id)
            .ok_or_else(|| PortError::not_found("BillingDocument", document.id))?;

        stored.doc_type = document.doc_type;
        stored.currency = document.currency.clone();
        stored.client_id = document.client_id;
        stored.notes = document.notes.clone();
        stored.services = document.services.clone();
        stored.subtotal = document.subtotal;
        stored.vat_total = document.vat_total;
        stored.grand_total = document.grand_total;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_document(&mut self, id: BillingId) -> Result<u64, PortError> {
        if self.working.payments_of(id).next().is_some() {
            return Err(PortError::validation(FK_MESSAGE));
        }
        Ok(u64::from(self.working.documents.remove(&id).is_some()))
    }

    async fn delete_payments_for_document(&mut self, billing_id: BillingId) -> Result<u64, PortError> {
        let before = self.working.payments.len();
        self.working.payments.retain(|_, p| p.billing_id != billing_id);
        Ok((before - self.working.payments.len()) as u64)
    }

    async fn insert_payment(&mut self, row: NewPayment) -> Result<PaymentTransaction, PortError> {
        let payment = row.payment;
        if !self.working.documents.contains_key(&payment.billing_id) {
            return Err(PortError::validation(FK_MESSAGE));
        }
        check_stored_amount(payment.amount_paid)?;
        let now = Utc::now();
        let stored = PaymentTransaction {
            id: row.id,
            billing_id: payment.billing_id,
            payment_date: payment.payment_date,
            amount_paid: payment.amount_paid,
            payment_method: payment.payment_method,
            transaction_reference: payment.transaction_reference,
            notes: payment.notes,
            snapshot: PaymentSnapshot::default(),
            created_at: now,
            updated_at: now,
        };
        self.working.payments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_payment(&mut self, id: PaymentId) -> Result<Option<PaymentTransaction>, PortError> {
        Ok(self.working.payments.get(&id).cloned())
    }

    async fn update_payment(&mut self, payment: &PaymentTransaction) -> Result<(), PortError> {
        check_stored_amount(payment.amount_paid)?;
        let stored = self
            .working
            .payments
            .get_mut(&payment.id)
            .ok_or_else(|| PortError::not_found("PaymentTransaction", payment.id))?;

        stored.payment_date = payment.payment_date;
        stored.amount_paid = payment.amount_paid;
        stored.payment_method = payment.payment_method.clone();
        stored.transaction_reference = payment.transaction_reference.clone();
        stored.notes = payment.notes.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_payment(&mut self, id: PaymentId) -> Result<u64, PortError> {
        Ok(u64::from(self.working.payments.remove(&id).is_some()))
    }

    async fn sum_payments(&mut self, billing_id: BillingId) -> Result<Decimal, PortError> {
        Ok(self.working.payments_of(billing_id).map(|p| p.amount_paid).sum())
    }

    async fn write_payment_state(
        &mut self,
        billing_id: BillingId,
        state: &PaymentState,
    ) -> Result<(), PortError> {
        if let Some(document) = self.working.documents.get_mut(&billing_id) {
            document.total_paid = state.total_paid;
            document.outstanding_balance = state.outstanding_balance;
            document.status = state.status;
            document.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn write_payment_snapshots(
        &mut self,
        billing_id: BillingId,
        snapshot: &PaymentSnapshot,
    ) -> Result<u64, PortError> {
        injected(&self.faults.snapshot_write, "write_payment_snapshots")?;

        let mut refreshed = 0;
        for payment in self.working.payments.values_mut() {
            if payment.billing_id == billing_id {
                payment.snapshot = *snapshot;
                refreshed += 1;
            }
        }
        Ok(refreshed)
    }

    async fn commit(self) -> Result<(), PortError> {
        injected(&self.faults.commit, "commit")?;
        let Self {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), PortError> {
        Ok(())
    }
}

/// In-memory staff directory for login tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryStaffDirectory {
    accounts: Arc<RwLock<Vec<StaffAccount>>>,
}

impl InMemoryStaffDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, account: StaffAccount) {
        self.accounts.write().await.push(account);
    }
}

impl DomainPort for InMemoryStaffDirectory {}

#[async_trait]
impl StaffDirectory for InMemoryStaffDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffAccount>, PortError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}
