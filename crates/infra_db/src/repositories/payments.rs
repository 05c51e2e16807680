//! Payment transaction repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{BillingId, ClientId, CurrencyCode, PaymentId};
use domain_billing::{
    DocumentNumber, NewPayment, PaymentListing, PaymentSnapshot, PaymentTransaction,
};

use crate::error::DatabaseError;
use crate::repositories::billing::DbDocumentType;

const PAYMENT_COLUMNS: &str = r#"
    p.id, p.billing_id, p.payment_date, p.amount_paid, p.payment_method,
    p.transaction_reference, p.notes, p.grand_total, p.total_received,
    p.outstanding_balance, p.created_at, p.updated_at
"#;

/// Repository for the `payments` table
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Payments joined with document and customer display fields
    ///
    /// Ordered by payment date, then creation time, newest first.
    pub async fn list_with_documents(&self) -> Result<Vec<PaymentListingRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentListingRow>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS},
                b.doc_type,
                b.doc_suffix,
                b.currency,
                b.client_id,
                c.name AS client_name
            FROM payments p
            JOIN billing b ON b.id = p.billing_id
            LEFT JOIN customers c ON c.id = b.client_id
            ORDER BY p.payment_date DESC, p.created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_billing(&self, billing_id: Uuid) -> Result<Vec<PaymentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments p
            WHERE p.billing_id = $1
            ORDER BY p.payment_date DESC, p.created_at DESC
            "#
        ))
        .bind(billing_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<PaymentRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    pub async fn insert(conn: &mut PgConnection, row: &NewPayment) -> Result<PaymentRow, DatabaseError> {
        let payment = &row.payment;
        let inserted = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (
                id, billing_id, payment_date, amount_paid, payment_method,
                transaction_reference, notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
            RETURNING
                id, billing_id, payment_date, amount_paid, payment_method,
                transaction_reference, notes, grand_total, total_received,
                outstanding_balance, created_at, updated_at
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(payment.billing_id.as_uuid())
        .bind(payment.payment_date)
        .bind(payment.amount_paid)
        .bind(payment.payment_method.as_str())
        .bind(payment.transaction_reference.as_deref())
        .bind(payment.notes.as_deref())
        .fetch_one(conn)
        .await?;
        Ok(inserted)
    }

    /// Rewrites the editable columns; `billing_id` is not touched
    pub async fn update_editable(
        conn: &mut PgConnection,
        payment: &PaymentTransaction,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                payment_date = $2,
                amount_paid = $3,
                payment_method = $4,
                transaction_reference = $5,
                notes = $6,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.payment_date)
        .bind(payment.amount_paid)
        .bind(payment.payment_method.as_str())
        .bind(payment.transaction_reference.as_deref())
        .bind(payment.notes.as_deref())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_billing(conn: &mut PgConnection, billing_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM payments WHERE billing_id = $1")
            .bind(billing_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Sum of amounts for a document, zero when it has no payments
    pub async fn sum_for_billing(conn: &mut PgConnection, billing_id: Uuid) -> Result<Decimal, DatabaseError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount_paid), 0) FROM payments WHERE billing_id = $1",
        )
        .bind(billing_id)
        .fetch_one(conn)
        .await?;
        Ok(total)
    }

    pub async fn write_snapshots(
        conn: &mut PgConnection,
        billing_id: Uuid,
        snapshot: &PaymentSnapshot,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                grand_total = $2,
                total_received = $3,
                outstanding_balance = $4
            WHERE billing_id = $1
            "#,
        )
        .bind(billing_id)
        .bind(snapshot.grand_total)
        .bind(snapshot.total_received)
        .bind(snapshot.outstanding_balance)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Database row for a payment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub billing_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount_paid: Decimal,
    pub payment_method: String,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
    pub grand_total: Decimal,
    pub total_received: Decimal,
    pub outstanding_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment row joined with its document and customer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentListingRow {
    #[sqlx(flatten)]
    pub payment: PaymentRow,
    pub doc_type: DbDocumentType,
    pub doc_suffix: i32,
    pub currency: String,
    pub client_id: Uuid,
    pub client_name: Option<String>,
}

impl From<PaymentRow> for PaymentTransaction {
    fn from(row: PaymentRow) -> Self {
        PaymentTransaction {
            id: PaymentId::from_uuid(row.id),
            billing_id: BillingId::from_uuid(row.billing_id),
            payment_date: row.payment_date,
            amount_paid: row.amount_paid,
            payment_method: row.payment_method,
            transaction_reference: row.transaction_reference,
            notes: row.notes,
            snapshot: PaymentSnapshot {
                grand_total: row.grand_total,
                total_received: row.total_received,
                outstanding_balance: row.outstanding_balance,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TryFrom<PaymentListingRow> for PaymentListing {
    type Error = DatabaseError;

    fn try_from(row: PaymentListingRow) -> Result<Self, Self::Error> {
        let suffix = u32::try_from(row.doc_suffix)
            .map_err(|_| DatabaseError::CorruptRow(format!("negative doc_suffix on {}", row.payment.billing_id)))?;
        let doc_no = DocumentNumber::new(row.doc_type.into(), suffix)
            .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;
        let currency = CurrencyCode::parse(&row.currency)
            .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;

        Ok(PaymentListing {
            payment: row.payment.into(),
            doc_no,
            doc_type: doc_no.doc_type(),
            currency,
            client_id: ClientId::from_uuid(row.client_id),
            client_name: row.client_name,
        })
    }
}
