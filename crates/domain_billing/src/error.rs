//! Billing domain errors

use core_kernel::{MoneyError, PortError};
use thiserror::Error;

/// Errors returned by the billing and payment services
///
/// Callers see three kinds of failure: their input was wrong, the target
/// does not exist, or storage failed. A storage failure always means the
/// whole operation was rolled back.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation targets an id with no matching row
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// Transaction, constraint or connection failure
    #[error("Storage error: {0}")]
    Storage(#[source] PortError),
}

impl BillingError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    /// Creates a not-found error for an entity and identifier
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        BillingError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Returns true for caller mistakes
    pub fn is_validation(&self) -> bool {
        matches!(self, BillingError::Validation(_))
    }

    /// Returns true if the target row did not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, BillingError::NotFound { .. })
    }
}

impl From<PortError> for BillingError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::Validation { message, .. } => BillingError::Validation(message),
            PortError::NotFound { entity_type, id } => BillingError::NotFound {
                entity: entity_type,
                id,
            },
            other => BillingError::Storage(other),
        }
    }
}

impl From<MoneyError> for BillingError {
    fn from(error: MoneyError) -> Self {
        BillingError::Validation(error.to_string())
    }
}
