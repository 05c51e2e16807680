//! Billing document repository
//!
//! Reads run against the pool. Writes and the row lock take a
//! `&mut PgConnection` so they compose inside the caller's transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{BillingId, ClientId, CurrencyCode};
use domain_billing::{
    BillingDocument, DocumentListing, DocumentType, NewDocument, PaymentState, PaymentStatus,
    ServiceLine,
};

use crate::error::DatabaseError;

const SELECT_BILLING: &str = r#"
    SELECT
        b.id, b.doc_type, b.doc_suffix, b.currency, b.client_id, b.notes, b.services,
        b.subtotal, b.vat_total, b.grand_total, b.status, b.total_paid,
        b.outstanding_balance, b.created_at, b.updated_at
    FROM billing b
"#;

/// Repository for the `billing` table
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BillingRow>, DatabaseError> {
        let row = sqlx::query_as::<_, BillingRow>(&format!("{SELECT_BILLING} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Documents joined with customer display fields, newest first
    pub async fn list_with_clients(&self) -> Result<Vec<BillingListingRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BillingListingRow>(
            r#"
            SELECT
                b.id, b.doc_type, b.doc_suffix, b.currency, b.client_id, b.notes, b.services,
                b.subtotal, b.vat_total, b.grand_total, b.status, b.total_paid,
                b.outstanding_balance, b.created_at, b.updated_at,
                c.name AS client_name,
                c.email AS client_email
            FROM billing b
            LEFT JOIN customers c ON c.id = b.client_id
            ORDER BY b.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Reads a document and locks its row until the transaction ends
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<BillingRow>, DatabaseError> {
        let row = sqlx::query_as::<_, BillingRow>(&format!(
            "{SELECT_BILLING} WHERE b.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    pub async fn insert(conn: &mut PgConnection, row: &NewDocument) -> Result<BillingRow, DatabaseError> {
        let document = &row.document;
        let inserted = sqlx::query_as::<_, BillingRow>(
            r#"
            INSERT INTO billing (
                id, doc_type, doc_suffix, currency, client_id, notes, services,
                subtotal, vat_total, grand_total, status, total_paid,
                outstanding_balance, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, now(), now())
            RETURNING
                id, doc_type, doc_suffix, currency, client_id, notes, services,
                subtotal, vat_total, grand_total, status, total_paid,
                outstanding_balance, created_at, updated_at
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(DbDocumentType::from(document.doc_type))
        .bind(row.doc_no.suffix() as i32)
        .bind(document.currency.as_str())
        .bind(document.client_id.as_uuid())
        .bind(document.notes.as_deref())
        .bind(Json(&document.services))
        .bind(document.totals.subtotal)
        .bind(document.totals.vat_total)
        .bind(document.totals.grand_total)
        .bind(DbPaymentStatus::from(row.initial_state.status))
        .bind(row.initial_state.total_paid)
        .bind(row.initial_state.outstanding_balance)
        .fetch_one(conn)
        .await?;
        Ok(inserted)
    }

    /// Writes the author-owned columns; payment columns are left alone
    pub async fn update_authored(
        conn: &mut PgConnection,
        document: &BillingDocument,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE billing SET
                doc_type = $2,
                currency = $3,
                client_id = $4,
                notes = $5,
                services = $6,
                subtotal = $7,
                vat_total = $8,
                grand_total = $9,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(DbDocumentType::from(document.doc_type))
        .bind(document.currency.as_str())
        .bind(document.client_id.as_uuid())
        .bind(document.notes.as_deref())
        .bind(Json(&document.services))
        .bind(document.subtotal)
        .bind(document.vat_total)
        .bind(document.grand_total)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn write_payment_state(
        conn: &mut PgConnection,
        id: Uuid,
        state: &PaymentState,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE billing SET
                total_paid = $2,
                outstanding_balance = $3,
                status = $4,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(state.total_paid)
        .bind(state.outstanding_balance)
        .bind(DbPaymentStatus::from(state.status))
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM billing WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}

/// `document_type` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "document_type", rename_all = "lowercase")]
pub enum DbDocumentType {
    Invoice,
    Quotation,
}

impl From<DocumentType> for DbDocumentType {
    fn from(value: DocumentType) -> Self {
        match value {
            DocumentType::Invoice => DbDocumentType::Invoice,
            DocumentType::Quotation => DbDocumentType::Quotation,
        }
    }
}

impl From<DbDocumentType> for DocumentType {
    fn from(value: DbDocumentType) -> Self {
        match value {
            DbDocumentType::Invoice => DocumentType::Invoice,
            DbDocumentType::Quotation => DocumentType::Quotation,
        }
    }
}

/// `payment_status` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum DbPaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl From<PaymentStatus> for DbPaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Pending => DbPaymentStatus::Pending,
            PaymentStatus::Partial => DbPaymentStatus::Partial,
            PaymentStatus::Paid => DbPaymentStatus::Paid,
        }
    }
}

impl From<DbPaymentStatus> for PaymentStatus {
    fn from(value: DbPaymentStatus) -> Self {
        match value {
            DbPaymentStatus::Pending => PaymentStatus::Pending,
            DbPaymentStatus::Partial => PaymentStatus::Partial,
            DbPaymentStatus::Paid => PaymentStatus::Paid,
        }
    }
}

/// Database row for a billing document
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillingRow {
    pub id: Uuid,
    pub doc_type: DbDocumentType,
    pub doc_suffix: i32,
    pub currency: String,
    pub client_id: Uuid,
    pub notes: Option<String>,
    pub services: Json<Vec<ServiceLine>>,
    pub subtotal: Decimal,
    pub vat_total: Decimal,
    pub grand_total: Decimal,
    pub status: DbPaymentStatus,
    pub total_paid: Decimal,
    pub outstanding_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Billing row joined with customer display fields
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillingListingRow {
    #[sqlx(flatten)]
    pub billing: BillingRow,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
}

impl TryFrom<BillingRow> for BillingDocument {
    type Error = DatabaseError;

    fn try_from(row: BillingRow) -> Result<Self, Self::Error> {
        let doc_suffix = u32::try_from(row.doc_suffix)
            .map_err(|_| DatabaseError::CorruptRow(format!("negative doc_suffix on {}", row.id)))?;
        let currency = CurrencyCode::parse(&row.currency)
            .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;

        Ok(BillingDocument {
            id: BillingId::from_uuid(row.id),
            doc_type: row.doc_type.into(),
            doc_suffix,
            currency,
            client_id: ClientId::from_uuid(row.client_id),
            notes: row.notes,
            services: row.services.0,
            subtotal: row.subtotal,
            vat_total: row.vat_total,
            grand_total: row.grand_total,
            status: row.status.into(),
            total_paid: row.total_paid,
            outstanding_balance: row.outstanding_balance,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<BillingListingRow> for DocumentListing {
    type Error = DatabaseError;

    fn try_from(row: BillingListingRow) -> Result<Self, Self::Error> {
        Ok(DocumentListing {
            document: row.billing.try_into()?,
            client_name: row.client_name,
            client_email: row.client_email,
        })
    }
}
