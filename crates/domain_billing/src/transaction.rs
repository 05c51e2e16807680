//! Unit-of-work helper
//!
//! Service operations run their body against `&mut Tx` and hand the result
//! to [`complete`], which commits on success and rolls back otherwise.

use tracing::warn;

use crate::error::BillingError;
use crate::ports::LedgerTx;

/// Ends a transaction according to the outcome of the work done in it
///
/// A failed rollback is logged and the original error is returned; the
/// transaction is abandoned either way.
pub async fn complete<T, R>(tx: T, result: Result<R, BillingError>) -> Result<R, BillingError>
where
    T: LedgerTx,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(error = %rollback_error, "rollback failed");
            }
            Err(error)
        }
    }
}
