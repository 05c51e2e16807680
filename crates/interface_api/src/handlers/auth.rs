//! Login handler

use axum::{extract::State, Json};
use tracing::{info, instrument, warn};
use validator::Validate;

use domain_billing::LedgerStore;

use crate::auth::{authenticate, create_token, AuthError};
use crate::dto::auth::{LoginRequest, LoginResponse};
use crate::error::ApiError;
use crate::AppState;

/// Exchanges staff credentials for a bearer token
#[instrument(skip(state, request))]
pub async fn login<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let account = match authenticate(state.staff.as_ref(), &request.email, &request.password).await {
        Ok(account) => account,
        Err(AuthError::InvalidCredentials) => {
            warn!("login rejected");
            return Err(ApiError::Unauthorized);
        }
        Err(other) => return Err(other.into()),
    };

    let token = create_token(
        &account.id.as_uuid().to_string(),
        vec![account.role.clone()],
        &state.config.jwt_secret,
        state.config.jwt_expiration_secs,
    )?;

    info!(staff_id = %account.id, role = %account.role, "staff logged in");
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiration_secs,
    }))
}
