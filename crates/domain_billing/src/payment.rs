//! Payment transactions
//!
//! A payment belongs to exactly one billing document for its whole life.
//! Edits may change the amount, date and descriptive fields but never the
//! parent document.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{check_amount_range, is_positive_amount, round_money, BillingId, PaymentId};

use crate::error::BillingError;

/// Parent figures copied onto a payment by the last reconciliation
///
/// Display only. The document's totals are always recomputed from the sum
/// of payment amounts, never from these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    pub grand_total: Decimal,
    pub total_received: Decimal,
    pub outstanding_balance: Decimal,
}

/// A recorded payment against a billing document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: PaymentId,
    /// Parent document, fixed at creation
    pub billing_id: BillingId,
    pub payment_date: NaiveDate,
    pub amount_paid: Decimal,
    /// Free text, e.g. "Bank Transfer" or "M-Pesa"
    pub payment_method: String,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
    pub snapshot: PaymentSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// Applies validated changes; unset fields keep their value
    pub fn apply(&mut self, changes: ValidatedPaymentChanges) {
        if let Some(payment_date) = changes.payment_date {
            self.payment_date = payment_date;
        }
        if let Some(amount_paid) = changes.amount_paid {
            self.amount_paid = amount_paid;
        }
        if let Some(payment_method) = changes.payment_method {
            self.payment_method = payment_method;
        }
        if let Some(reference) = changes.transaction_reference {
            self.transaction_reference = Some(reference);
        }
        if let Some(notes) = changes.notes {
            self.notes = Some(notes);
        }
        self.updated_at = Utc::now();
    }
}

fn check_amount(amount: Decimal) -> Result<Decimal, BillingError> {
    let amount = round_money(amount);
    if !is_positive_amount(amount) {
        return Err(BillingError::validation("amount_paid must be greater than zero"));
    }
    check_amount_range(amount)
        .map_err(|e| BillingError::validation(format!("amount_paid: {}", e)))
}

fn check_method(method: String) -> Result<String, BillingError> {
    let trimmed = method.trim();
    if trimmed.is_empty() {
        return Err(BillingError::validation("payment_method must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Untrusted input for recording a payment
#[derive(Debug, Clone, Default)]
pub struct CreatePayment {
    pub billing_id: Option<BillingId>,
    /// Defaults to today when absent
    pub payment_date: Option<NaiveDate>,
    pub amount_paid: Option<Decimal>,
    pub payment_method: Option<String>,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

/// A payment request that passed validation
///
/// Whether the parent document exists is checked by the service inside the
/// transaction, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayment {
    pub billing_id: BillingId,
    pub payment_date: NaiveDate,
    pub amount_paid: Decimal,
    pub payment_method: String,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

impl CreatePayment {
    pub fn validate(self) -> Result<ValidatedPayment, BillingError> {
        let billing_id = self
            .billing_id
            .ok_or_else(|| BillingError::validation("billing_id is required"))?;
        let amount_paid = self
            .amount_paid
            .ok_or_else(|| BillingError::validation("amount_paid is required"))
            .and_then(check_amount)?;
        let payment_method = check_method(self.payment_method.unwrap_or_default())?;

        Ok(ValidatedPayment {
            billing_id,
            payment_date: self.payment_date.unwrap_or_else(|| Utc::now().date_naive()),
            amount_paid,
            payment_method,
            transaction_reference: self.transaction_reference,
            notes: self.notes,
        })
    }
}

/// Untrusted partial update of a payment
///
/// Has no `billing_id`: a payment never moves to another document.
#[derive(Debug, Clone, Default)]
pub struct PaymentChanges {
    pub payment_date: Option<NaiveDate>,
    pub amount_paid: Option<Decimal>,
    pub payment_method: Option<String>,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedPaymentChanges {
    pub payment_date: Option<NaiveDate>,
    pub amount_paid: Option<Decimal>,
    pub payment_method: Option<String>,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

impl PaymentChanges {
    pub fn validate(self) -> Result<ValidatedPaymentChanges, BillingError> {
        Ok(ValidatedPaymentChanges {
            payment_date: self.payment_date,
            amount_paid: self.amount_paid.map(check_amount).transpose()?,
            payment_method: self.payment_method.map(check_method).transpose()?,
            transaction_reference: self.transaction_reference,
            notes: self.notes,
        })
    }
}
