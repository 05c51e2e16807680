//! Billing document DTOs
//!
//! Field names follow the ERP front end: camelCase, with the document type
//! under `type` and the totals under `sub`, `vat` and `grand`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::ClientId;
use domain_billing::{
    BillingDocument, CreateDocument, CreatedDocument, DeletedDocument, DocumentChanges,
    DocumentListing, PaymentState, ServiceLine, UpdatedDocument,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillingRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub doc_type: String,
    #[validate(length(min = 1, message = "currency is required"))]
    pub currency: String,
    pub client_id: Option<Uuid>,
    pub notes: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceLine>,
    pub sub: Option<Decimal>,
    pub vat: Option<Decimal>,
    pub grand: Option<Decimal>,
}

impl From<CreateBillingRequest> for CreateDocument {
    fn from(request: CreateBillingRequest) -> Self {
        CreateDocument {
            doc_type: request.doc_type,
            currency: request.currency,
            client_id: request.client_id.map(ClientId::from_uuid),
            notes: request.notes,
            services: request.services,
            subtotal: request.sub,
            vat_total: request.vat,
            grand_total: request.grand,
        }
    }
}

/// Editable document fields
///
/// Anything else in the body, payment fields included, is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillingRequest {
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub currency: Option<String>,
    pub client_id: Option<Uuid>,
    pub notes: Option<String>,
    pub services: Option<Vec<ServiceLine>>,
    pub sub: Option<Decimal>,
    pub vat: Option<Decimal>,
    pub grand: Option<Decimal>,
}

impl From<UpdateBillingRequest> for DocumentChanges {
    fn from(request: UpdateBillingRequest) -> Self {
        DocumentChanges {
            doc_type: request.doc_type,
            currency: request.currency,
            client_id: request.client_id.map(ClientId::from_uuid),
            notes: request.notes,
            services: request.services,
            subtotal: request.sub,
            vat_total: request.vat,
            grand_total: request.grand,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingResponse {
    pub id: Uuid,
    pub doc_no: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub currency: String,
    pub client_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    pub notes: Option<String>,
    pub services: Vec<ServiceLine>,
    pub sub: Decimal,
    pub vat: Decimal,
    pub grand: Decimal,
    pub status: String,
    pub total_paid: Decimal,
    pub outstanding_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BillingDocument> for BillingResponse {
    fn from(document: BillingDocument) -> Self {
        Self {
            id: *document.id.as_uuid(),
            doc_no: document.doc_no().to_string(),
            doc_type: document.doc_type.as_str().to_string(),
            currency: document.currency.as_str().to_string(),
            client_id: *document.client_id.as_uuid(),
            client_name: None,
            client_email: None,
            notes: document.notes,
            services: document.services,
            sub: document.subtotal,
            vat: document.vat_total,
            grand: document.grand_total,
            status: document.status.as_str().to_string(),
            total_paid: document.total_paid,
            outstanding_balance: document.outstanding_balance,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

impl From<DocumentListing> for BillingResponse {
    fn from(listing: DocumentListing) -> Self {
        Self {
            client_name: listing.client_name,
            client_email: listing.client_email,
            ..BillingResponse::from(listing.document)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBillingResponse {
    pub id: Uuid,
    pub doc_no: String,
    pub success: bool,
}

impl From<CreatedDocument> for CreatedBillingResponse {
    fn from(created: CreatedDocument) -> Self {
        Self {
            id: *created.id.as_uuid(),
            doc_no: created.doc_no.to_string(),
            success: true,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedBillingResponse {
    pub success: bool,
    pub doc_no: String,
    pub status: String,
    pub total_paid: Decimal,
    pub outstanding_balance: Decimal,
}

impl From<UpdatedDocument> for UpdatedBillingResponse {
    fn from(updated: UpdatedDocument) -> Self {
        Self {
            success: true,
            doc_no: updated.doc_no.to_string(),
            status: updated.state.status.as_str().to_string(),
            total_paid: updated.state.total_paid,
            outstanding_balance: updated.state.outstanding_balance,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBillingResponse {
    pub success: bool,
    pub payments_removed: u64,
}

impl From<DeletedDocument> for DeletedBillingResponse {
    fn from(deleted: DeletedDocument) -> Self {
        Self {
            success: true,
            payments_removed: deleted.payments_removed,
        }
    }
}

/// Payment fields of a document after a reconciliation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStateResponse {
    pub success: bool,
    pub status: String,
    pub total_paid: Decimal,
    pub outstanding_balance: Decimal,
}

impl From<PaymentState> for PaymentStateResponse {
    fn from(state: PaymentState) -> Self {
        Self {
            success: true,
            status: state.status.as_str().to_string(),
            total_paid: state.total_paid,
            outstanding_balance: state.outstanding_balance,
        }
    }
}
