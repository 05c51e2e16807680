//! Payment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::PaymentId;
use domain_billing::LedgerStore;

use crate::dto::payments::*;
use crate::error::ApiError;
use crate::AppState;

/// Lists payments with their document's display fields
pub async fn list_payments<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let listings = state.payments.list_payments().await?;
    Ok(Json(listings.into_iter().map(PaymentResponse::from).collect()))
}

/// Records a payment and reconciles its document
pub async fn create_payment<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<CreatedPaymentResponse>), ApiError> {
    request.validate()?;
    let id = state.payments.create_payment(request.into()).await?;
    Ok((StatusCode::CREATED, Json(id.into())))
}

pub async fn update_payment<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    request.validate()?;
    state
        .payments
        .update_payment(PaymentId::from_uuid(id), request.into())
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Reverses a payment
pub async fn delete_payment<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.payments.delete_payment(PaymentId::from_uuid(id)).await?;
    Ok(Json(SuccessResponse::ok()))
}
