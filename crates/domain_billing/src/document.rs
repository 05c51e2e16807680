//! Billing documents
//!
//! Invoices and quotations share one record type. The author controls the
//! line items and totals; the payment fields (`total_paid`,
//! `outstanding_balance`, `status`) belong to the reconciliation engine and
//! are never accepted from a client.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{check_amount_range, round_money, BillingId, ClientId, CurrencyCode};

use crate::error::BillingError;
use crate::reconciliation::{PaymentState, PaymentStatus};

/// VAT charged on line items flagged as VAT-applicable
pub const VAT_RATE: Decimal = dec!(0.16);

/// Document numbers keep the last six digits of the issue timestamp
const SUFFIX_MODULUS: i64 = 1_000_000;

/// Kind of billing document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Invoice,
    Quotation,
}

impl DocumentType {
    /// Prefix used in the human-facing document number
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "INV",
            DocumentType::Quotation => "QUO",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Quotation => "quotation",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "INV" => Some(DocumentType::Invoice),
            "QUO" => Some(DocumentType::Quotation),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoice" => Ok(DocumentType::Invoice),
            "quotation" => Ok(DocumentType::Quotation),
            other => Err(BillingError::validation(format!(
                "unknown document type '{}': expected invoice or quotation",
                other
            ))),
        }
    }
}

/// Human-facing document number, e.g. `INV-042517`
///
/// Only the numeric suffix is stored. The prefix always follows the
/// document's current type, so converting a quotation into an invoice keeps
/// the suffix and changes the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentNumber {
    doc_type: DocumentType,
    suffix: u32,
}

impl DocumentNumber {
    /// Creates a number from a type and a stored suffix
    ///
    /// # Errors
    ///
    /// Returns a validation error if the suffix has more than six digits
    pub fn new(doc_type: DocumentType, suffix: u32) -> Result<Self, BillingError> {
        if i64::from(suffix) >= SUFFIX_MODULUS {
            return Err(BillingError::validation(format!(
                "document number suffix {} exceeds six digits",
                suffix
            )));
        }
        Ok(Self { doc_type, suffix })
    }

    /// Issues a number from the trailing six digits of a timestamp
    pub fn issue(doc_type: DocumentType, at: DateTime<Utc>) -> Self {
        let suffix = at.timestamp_millis().rem_euclid(SUFFIX_MODULUS) as u32;
        Self { doc_type, suffix }
    }

    pub fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    pub fn suffix(&self) -> u32 {
        self.suffix
    }

    /// Returns the same suffix under another document type
    pub fn retyped(self, doc_type: DocumentType) -> Self {
        Self { doc_type, ..self }
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:06}", self.doc_type.prefix(), self.suffix)
    }
}

impl FromStr for DocumentNumber {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BillingError::validation(format!("malformed document number '{}'", s));

        let (prefix, digits) = s.split_once('-').ok_or_else(invalid)?;
        let doc_type = DocumentType::from_prefix(prefix).ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let suffix = digits.parse().map_err(|_| invalid())?;
        Self::new(doc_type, suffix)
    }
}

/// A line item on a billing document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub description: String,
    /// Unit price before VAT
    pub price: Decimal,
    /// Whether the fixed VAT rate applies to this line
    #[serde(default)]
    pub vat: bool,
    /// Billing frequency label, e.g. "One-off" or "Monthly"
    #[serde(default)]
    pub frequency: String,
}

impl ServiceLine {
    pub fn new(description: impl Into<String>, price: Decimal) -> Self {
        Self {
            description: description.into(),
            price,
            vat: false,
            frequency: String::new(),
        }
    }

    /// Marks the line as VAT-applicable
    pub fn with_vat(mut self) -> Self {
        self.vat = true;
        self
    }

    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = frequency.into();
        self
    }

    /// VAT due on this line, zero when the flag is unset
    pub fn vat_amount(&self) -> Decimal {
        if self.vat {
            self.price * VAT_RATE
        } else {
            Decimal::ZERO
        }
    }
}

/// Author-facing totals of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub vat_total: Decimal,
    pub grand_total: Decimal,
}

impl DocumentTotals {
    /// Computes totals from line items
    pub fn from_services(services: &[ServiceLine]) -> Self {
        let subtotal: Decimal = services.iter().map(|s| s.price).sum();
        let vat_total: Decimal = services.iter().map(ServiceLine::vat_amount).sum();
        let subtotal = round_money(subtotal);
        let vat_total = round_money(vat_total);

        Self {
            subtotal,
            vat_total,
            grand_total: subtotal + vat_total,
        }
    }

    fn check_non_negative(&self) -> Result<(), BillingError> {
        check_non_negative("subtotal", self.subtotal)?;
        check_non_negative("vat_total", self.vat_total)?;
        check_non_negative("grand_total", self.grand_total)
    }
}

fn check_non_negative(field: &str, value: Decimal) -> Result<(), BillingError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(BillingError::validation(format!("{} must not be negative", field)));
    }
    check_amount_range(value)
        .map(|_| ())
        .map_err(|e| BillingError::validation(format!("{}: {}", field, e)))
}

fn check_services(services: &[ServiceLine]) -> Result<(), BillingError> {
    for (index, line) in services.iter().enumerate() {
        if line.description.trim().is_empty() {
            return Err(BillingError::validation(format!(
                "service line {} has no description",
                index + 1
            )));
        }
        check_non_negative("service price", line.price)?;
    }
    Ok(())
}

/// A persisted invoice or quotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingDocument {
    pub id: BillingId,
    pub doc_type: DocumentType,
    /// Stored numeric part of the document number
    pub doc_suffix: u32,
    pub currency: CurrencyCode,
    pub client_id: ClientId,
    pub notes: Option<String>,
    pub services: Vec<ServiceLine>,
    pub subtotal: Decimal,
    pub vat_total: Decimal,
    pub grand_total: Decimal,
    pub status: PaymentStatus,
    pub total_paid: Decimal,
    pub outstanding_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillingDocument {
    /// Returns the display number derived from type and stored suffix
    pub fn doc_no(&self) -> DocumentNumber {
        DocumentNumber {
            doc_type: self.doc_type,
            suffix: self.doc_suffix,
        }
    }

    /// Returns the stored payment fields as of the last reconciliation
    pub fn payment_state(&self) -> PaymentState {
        PaymentState {
            total_paid: self.total_paid,
            outstanding_balance: self.outstanding_balance,
            status: self.status,
        }
    }

    /// Applies validated author changes; unset fields keep their value
    ///
    /// Payment fields are untouched: the caller must reconcile afterwards
    /// because `grand_total` may have moved.
    pub fn apply(&mut self, changes: ValidatedChanges) {
        if let Some(doc_type) = changes.doc_type {
            self.doc_type = doc_type;
        }
        if let Some(currency) = changes.currency {
            self.currency = currency;
        }
        if let Some(client_id) = changes.client_id {
            self.client_id = client_id;
        }
        if let Some(notes) = changes.notes {
            self.notes = Some(notes);
        }
        if let Some(services) = changes.services {
            self.services = services;
        }
        if let Some(subtotal) = changes.subtotal {
            self.subtotal = subtotal;
        }
        if let Some(vat_total) = changes.vat_total {
            self.vat_total = vat_total;
        }
        if let Some(grand_total) = changes.grand_total {
            self.grand_total = grand_total;
        }
        self.updated_at = Utc::now();
    }
}

/// Untrusted input for creating a document
#[derive(Debug, Clone, Default)]
pub struct CreateDocument {
    pub doc_type: String,
    pub currency: String,
    pub client_id: Option<ClientId>,
    pub notes: Option<String>,
    pub services: Vec<ServiceLine>,
    pub subtotal: Option<Decimal>,
    pub vat_total: Option<Decimal>,
    pub grand_total: Option<Decimal>,
}

/// A creation request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDocument {
    pub doc_type: DocumentType,
    pub currency: CurrencyCode,
    pub client_id: ClientId,
    pub notes: Option<String>,
    pub services: Vec<ServiceLine>,
    pub totals: DocumentTotals,
}

impl CreateDocument {
    /// Validates the request
    ///
    /// Totals the author leaves out are computed from the line items.
    pub fn validate(self) -> Result<ValidatedDocument, BillingError> {
        let client_id = self
            .client_id
            .ok_or_else(|| BillingError::validation("client_id is required"))?;
        let doc_type: DocumentType = self.doc_type.parse()?;
        let currency = CurrencyCode::parse(&self.currency)?;
        check_services(&self.services)?;

        let computed = DocumentTotals::from_services(&self.services);
        let totals = DocumentTotals {
            subtotal: self.subtotal.map(round_money).unwrap_or(computed.subtotal),
            vat_total: self.vat_total.map(round_money).unwrap_or(computed.vat_total),
            grand_total: self.grand_total.map(round_money).unwrap_or(computed.grand_total),
        };
        totals.check_non_negative()?;

        Ok(ValidatedDocument {
            doc_type,
            currency,
            client_id,
            notes: self.notes,
            services: self.services,
            totals,
        })
    }
}

/// Untrusted partial update of a document
///
/// This is the complete list of fields a client may change.
#[derive(Debug, Clone, Default)]
pub struct DocumentChanges {
    pub doc_type: Option<String>,
    pub currency: Option<String>,
    pub client_id: Option<ClientId>,
    pub notes: Option<String>,
    pub services: Option<Vec<ServiceLine>>,
    pub subtotal: Option<Decimal>,
    pub vat_total: Option<Decimal>,
    pub grand_total: Option<Decimal>,
}

/// A partial update that passed validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedChanges {
    pub doc_type: Option<DocumentType>,
    pub currency: Option<CurrencyCode>,
    pub client_id: Option<ClientId>,
    pub notes: Option<String>,
    pub services: Option<Vec<ServiceLine>>,
    pub subtotal: Option<Decimal>,
    pub vat_total: Option<Decimal>,
    pub grand_total: Option<Decimal>,
}

impl DocumentChanges {
    pub fn validate(self) -> Result<ValidatedChanges, BillingError> {
        let doc_type = self.doc_type.as_deref().map(str::parse).transpose()?;
        let currency = self.currency.as_deref().map(CurrencyCode::parse).transpose()?;
        if let Some(services) = &self.services {
            check_services(services)?;
        }

        let subtotal = self.subtotal.map(round_money);
        let vat_total = self.vat_total.map(round_money);
        let grand_total = self.grand_total.map(round_money);
        for (field, value) in [("subtotal", subtotal), ("vat_total", vat_total), ("grand_total", grand_total)] {
            if let Some(value) = value {
                check_non_negative(field, value)?;
            }
        }

        Ok(ValidatedChanges {
            doc_type,
            currency,
            client_id: self.client_id,
            notes: self.notes,
            services: self.services,
            subtotal,
            vat_total,
            grand_total,
        })
    }
}
