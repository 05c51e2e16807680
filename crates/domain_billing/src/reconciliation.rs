//! Reconciliation engine
//!
//! The single routine that recomputes a document's payment fields from its
//! payment rows. Every write path that can change the inputs (a payment
//! created, edited or deleted, or a document's totals edited) calls
//! [`reconcile`] inside the same transaction as the triggering write.
//!
//! # Derivation
//!
//! ```text
//! calculated_paid     = sum(amount_paid) over the document's payments
//! outstanding_balance = grand_total - calculated_paid   (may go negative)
//! status              = paid     if calculated_paid >= grand_total and grand_total > 0
//!                       partial  if calculated_paid > 0
//!                       pending  otherwise
//! ```
//!
//! After the document row is written, every payment of the document gets
//! the same snapshot of `grand_total`, `total_received` and
//! `outstanding_balance`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use core_kernel::{round_money, BillingId, PortError};

use crate::error::BillingError;
use crate::payment::PaymentSnapshot;
use crate::ports::LedgerTx;

/// Settlement status of a billing document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Nothing received
    #[default]
    Pending,
    /// Something received, not yet covering the grand total
    Partial,
    /// Fully settled
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(BillingError::validation(format!("unknown payment status '{}'", other))),
        }
    }
}

/// Derived payment fields of a billing document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentState {
    pub total_paid: Decimal,
    pub outstanding_balance: Decimal,
    pub status: PaymentStatus,
}

impl PaymentState {
    /// State of a document with no payments
    pub fn unpaid(grand_total: Decimal) -> Self {
        Self::derive(grand_total, Decimal::ZERO)
    }

    /// Derives the payment fields from a grand total and the sum of payments
    ///
    /// Overpayment is kept as a negative balance, not clamped.
    pub fn derive(grand_total: Decimal, calculated_paid: Decimal) -> Self {
        let total_paid = round_money(calculated_paid);
        let grand_total = round_money(grand_total);

        let status = if total_paid >= grand_total && grand_total > Decimal::ZERO {
            PaymentStatus::Paid
        } else if total_paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        };

        Self {
            total_paid,
            outstanding_balance: grand_total - total_paid,
            status,
        }
    }

    /// Snapshot copied onto each payment of the document
    pub fn snapshot(&self, grand_total: Decimal) -> PaymentSnapshot {
        PaymentSnapshot {
            grand_total: round_money(grand_total),
            total_received: self.total_paid,
            outstanding_balance: self.outstanding_balance,
        }
    }
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Document and payment snapshots were rewritten
    Applied {
        state: PaymentState,
        snapshots_refreshed: u64,
    },
    /// The document no longer exists; nothing was written
    Skipped { billing_id: BillingId },
}

impl Reconciliation {
    /// Returns the new state when the pass wrote anything
    pub fn state(&self) -> Option<&PaymentState> {
        match self {
            Reconciliation::Applied { state, .. } => Some(state),
            Reconciliation::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Reconciliation::Skipped { .. })
    }
}

/// Recomputes and persists the payment state of one billing document
///
/// Runs inside the caller's transaction. The document row is locked before
/// the payment sum is read, so two reconciliations of the same document
/// serialize and the later one sees the earlier one's payments.
///
/// A missing document is not an error: the pass logs a warning and reports
/// [`Reconciliation::Skipped`].
pub async fn reconcile<T>(tx: &mut T, billing_id: BillingId) -> Result<Reconciliation, PortError>
where
    T: LedgerTx + ?Sized,
{
    let Some(document) = tx.lock_document(billing_id).await? else {
        warn!(%billing_id, "reconciliation skipped: billing document not found");
        return Ok(Reconciliation::Skipped { billing_id });
    };

    let calculated_paid = tx.sum_payments(billing_id).await?;
    let state = PaymentState::derive(document.grand_total, calculated_paid);

    tx.write_payment_state(billing_id, &state).await?;
    let snapshot = state.snapshot(document.grand_total);
    let snapshots_refreshed = tx.write_payment_snapshots(billing_id, &snapshot).await?;

    debug!(
        %billing_id,
        total_paid = %state.total_paid,
        outstanding = %state.outstanding_balance,
        status = %state.status,
        snapshots_refreshed,
        "reconciled billing document"
    );

    Ok(Reconciliation::Applied {
        state,
        snapshots_refreshed,
    })
}
