//! Billing document handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::BillingId;
use domain_billing::LedgerStore;

use crate::auth::{require_role, roles, Claims};
use crate::dto::billing::*;
use crate::dto::payments::PaymentResponse;
use crate::error::ApiError;
use crate::AppState;

/// Lists documents with client contact details, newest first
pub async fn list_documents<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<BillingResponse>>, ApiError> {
    let listings = state.documents.list_documents().await?;
    Ok(Json(listings.into_iter().map(BillingResponse::from).collect()))
}

pub async fn get_document<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BillingResponse>, ApiError> {
    let document = state.documents.get_document(BillingId::from_uuid(id)).await?;
    Ok(Json(document.into()))
}

/// Creates an invoice or quotation
pub async fn create_document<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreateBillingRequest>,
) -> Result<(StatusCode, Json<CreatedBillingResponse>), ApiError> {
    request.validate()?;
    let created = state.documents.create_document(request.into()).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Updates author fields and returns the reconciled payment state
pub async fn update_document<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBillingRequest>,
) -> Result<Json<UpdatedBillingResponse>, ApiError> {
    let updated = state
        .documents
        .update_document(BillingId::from_uuid(id), request.into())
        .await?;
    Ok(Json(updated.into()))
}

/// Deletes a document together with its payments
pub async fn delete_document<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedBillingResponse>, ApiError> {
    let deleted = state.documents.delete_document(BillingId::from_uuid(id)).await?;
    Ok(Json(deleted.into()))
}

/// Forces a reconciliation; admin only
pub async fn reconcile_document<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentStateResponse>, ApiError> {
    require_role(&claims, roles::ADMIN)?;
    let payment_state = state.documents.reconcile_document(BillingId::from_uuid(id)).await?;
    Ok(Json(payment_state.into()))
}

pub async fn list_document_payments<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = state
        .documents
        .payments_for_document(BillingId::from_uuid(id))
        .await?;
    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}
