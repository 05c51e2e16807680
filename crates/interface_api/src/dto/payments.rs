//! Payment DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{BillingId, PaymentId};
use domain_billing::{CreatePayment, PaymentChanges, PaymentListing, PaymentTransaction};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub billing_id: Option<Uuid>,
    /// Defaults to today
    pub payment_date: Option<NaiveDate>,
    pub amount_paid: Option<Decimal>,
    #[validate(length(max = 64, message = "payment_method must be at most 64 characters"))]
    pub payment_method: Option<String>,
    #[validate(length(max = 128, message = "transaction_reference must be at most 128 characters"))]
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

impl From<CreatePaymentRequest> for CreatePayment {
    fn from(request: CreatePaymentRequest) -> Self {
        CreatePayment {
            billing_id: request.billing_id.map(BillingId::from_uuid),
            payment_date: request.payment_date,
            amount_paid: request.amount_paid,
            payment_method: request.payment_method,
            transaction_reference: request.transaction_reference,
            notes: request.notes,
        }
    }
}

/// Editable payment fields; the parent document cannot be changed
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    pub payment_date: Option<NaiveDate>,
    pub amount_paid: Option<Decimal>,
    #[validate(length(max = 64, message = "payment_method must be at most 64 characters"))]
    pub payment_method: Option<String>,
    #[validate(length(max = 128, message = "transaction_reference must be at most 128 characters"))]
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdatePaymentRequest> for PaymentChanges {
    fn from(request: UpdatePaymentRequest) -> Self {
        PaymentChanges {
            payment_date: request.payment_date,
            amount_paid: request.amount_paid,
            payment_method: request.payment_method,
            transaction_reference: request.transaction_reference,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub billing_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount_paid: Decimal,
    pub payment_method: String,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
    /// Parent figures as of the last reconciliation
    pub grand_total: Decimal,
    pub total_received: Decimal,
    pub outstanding_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentTransaction> for PaymentResponse {
    fn from(payment: PaymentTransaction) -> Self {
        Self {
            id: *payment.id.as_uuid(),
            billing_id: *payment.billing_id.as_uuid(),
            payment_date: payment.payment_date,
            amount_paid: payment.amount_paid,
            payment_method: payment.payment_method,
            transaction_reference: payment.transaction_reference,
            notes: payment.notes,
            grand_total: payment.snapshot.grand_total,
            total_received: payment.snapshot.total_received,
            outstanding_balance: payment.snapshot.outstanding_balance,
            doc_no: None,
            doc_type: None,
            currency: None,
            client_id: None,
            client_name: None,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

impl From<PaymentListing> for PaymentResponse {
    fn from(listing: PaymentListing) -> Self {
        Self {
            doc_no: Some(listing.doc_no.to_string()),
            doc_type: Some(listing.doc_type.as_str().to_string()),
            currency: Some(listing.currency.as_str().to_string()),
            client_id: Some(*listing.client_id.as_uuid()),
            client_name: listing.client_name,
            ..PaymentResponse::from(listing.payment)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedPaymentResponse {
    pub id: Uuid,
    pub success: bool,
}

impl From<PaymentId> for CreatedPaymentResponse {
    fn from(id: PaymentId) -> Self {
        Self {
            id: *id.as_uuid(),
            success: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
