//! PostgreSQL ledger adapter
//!
//! Implements the billing ledger ports on top of the repositories. A
//! [`PostgresLedgerTx`] owns one SQLx transaction; dropping it without a
//! commit rolls everything back and returns the connection to the pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedger;
//! use domain_billing::PaymentService;
//!
//! let ledger = PostgresLedger::new(pool);
//! let payments = PaymentService::new(ledger);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, BillingId, DomainPort, HealthCheckResult, HealthCheckable, PaymentId, PortError,
};
use domain_billing::{
    BillingDocument, DocumentListing, LedgerStore, LedgerTx, NewDocument, NewPayment,
    PaymentListing, PaymentSnapshot, PaymentState, PaymentTransaction,
};

use crate::error::DatabaseError;
use crate::repositories::{BillingRepository, PaymentRepository};

const ADAPTER_ID: &str = "postgres-ledger";

/// PostgreSQL-backed billing ledger
#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: PgPool,
    billing: BillingRepository,
    payments: PaymentRepository,
}

impl PostgresLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            billing: BillingRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresLedger {}

#[async_trait]
impl HealthCheckable for PostgresLedger {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };
        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedger {
    type Tx = PostgresLedgerTx;

    async fn begin(&self) -> Result<Self::Tx, PortError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Ok(PostgresLedgerTx { tx })
    }

    async fn get_document(&self, id: BillingId) -> Result<Option<BillingDocument>, PortError> {
        let row = self.billing.find_by_id(*id.as_uuid()).await?;
        Ok(row.map(BillingDocument::try_from).transpose()?)
    }

    #[instrument(skip(self))]
    async fn list_documents(&self) -> Result<Vec<DocumentListing>, PortError> {
        let rows = self.billing.list_with_clients().await?;
        debug!(count = rows.len(), "listed billing documents");
        Ok(rows
            .into_iter()
            .map(DocumentListing::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    #[instrument(skip(self))]
    async fn list_payments(&self) -> Result<Vec<PaymentListing>, PortError> {
        let rows = self.payments.list_with_documents().await?;
        debug!(count = rows.len(), "listed payments");
        Ok(rows
            .into_iter()
            .map(PaymentListing::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn payments_for_document(
        &self,
        billing_id: BillingId,
    ) -> Result<Vec<PaymentTransaction>, PortError> {
        let rows = self.payments.find_by_billing(*billing_id.as_uuid()).await?;
        Ok(rows.into_iter().map(PaymentTransaction::from).collect())
    }
}

/// One open ledger transaction
pub struct PostgresLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PostgresLedgerTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresLedgerTx").finish_non_exhaustive()
    }
}

#[async_trait]
impl LedgerTx for PostgresLedgerTx {
    async fn lock_document(&mut self, id: BillingId) -> Result<Option<BillingDocument>, PortError> {
        let row = BillingRepository::lock_for_update(&mut self.tx, *id.as_uuid()).await?;
        Ok(row.map(BillingDocument::try_from).transpose()?)
    }

    async fn insert_document(&mut self, row: NewDocument) -> Result<BillingDocument, PortError> {
        let inserted = BillingRepository::insert(&mut self.tx, &row).await?;
        Ok(inserted.try_into()?)
    }

    async fn update_document(&mut self, document: &BillingDocument) -> Result<(), PortError> {
        if BillingRepository::update_authored(&mut self.tx, document).await? == 0 {
            return Err(PortError::not_found("BillingDocument", document.id));
        }
        Ok(())
    }

    async fn delete_document(&mut self, id: BillingId) -> Result<u64, PortError> {
        Ok(BillingRepository::delete(&mut self.tx, *id.as_uuid()).await?)
    }

    async fn delete_payments_for_document(&mut self, billing_id: BillingId) -> Result<u64, PortError> {
        Ok(PaymentRepository::delete_by_billing(&mut self.tx, *billing_id.as_uuid()).await?)
    }

    async fn insert_payment(&mut self, row: NewPayment) -> Result<PaymentTransaction, PortError> {
        let inserted = PaymentRepository::insert(&mut self.tx, &row).await?;
        Ok(inserted.into())
    }

    async fn find_payment(&mut self, id: PaymentId) -> Result<Option<PaymentTransaction>, PortError> {
        let row = PaymentRepository::find_by_id(&mut self.tx, *id.as_uuid()).await?;
        Ok(row.map(PaymentTransaction::from))
    }

    async fn update_payment(&mut self, payment: &PaymentTransaction) -> Result<(), PortError> {
        if PaymentRepository::update_editable(&mut self.tx, payment).await? == 0 {
            return Err(PortError::not_found("PaymentTransaction", payment.id));
        }
        Ok(())
    }

    async fn delete_payment(&mut self, id: PaymentId) -> Result<u64, PortError> {
        Ok(PaymentRepository::delete(&mut self.tx, *id.as_uuid()).await?)
    }

    async fn sum_payments(&mut self, billing_id: BillingId) -> Result<Decimal, PortError> {
        Ok(PaymentRepository::sum_for_billing(&mut self.tx, *billing_id.as_uuid()).await?)
    }

    async fn write_payment_state(
        &mut self,
        billing_id: BillingId,
        state: &PaymentState,
    ) -> Result<(), PortError> {
        BillingRepository::write_payment_state(&mut self.tx, *billing_id.as_uuid(), state).await?;
        Ok(())
    }

    async fn write_payment_snapshots(
        &mut self,
        billing_id: BillingId,
        snapshot: &PaymentSnapshot,
    ) -> Result<u64, PortError> {
        Ok(PaymentRepository::write_snapshots(&mut self.tx, *billing_id.as_uuid(), snapshot).await?)
    }

    async fn commit(self) -> Result<(), PortError> {
        self.tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), PortError> {
        self.tx.rollback().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}
