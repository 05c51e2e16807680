//! Test Data Builders
//!
//! Builders for the service commands, with defaults matching the reference
//! scenarios (a KES invoice with a grand total of 1000).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BillingId, ClientId};
use domain_billing::{CreateDocument, CreatePayment, DocumentChanges, PaymentChanges, ServiceLine};

use crate::fixtures::{DateFixtures, MoneyFixtures, ServiceFixtures};

/// Builder for `CreateDocument`
pub struct CreateDocumentBuilder {
    doc_type: String,
    currency: String,
    client_id: Option<ClientId>,
    notes: Option<String>,
    services: Vec<ServiceLine>,
    subtotal: Option<Decimal>,
    vat_total: Option<Decimal>,
    grand_total: Option<Decimal>,
}

impl CreateDocumentBuilder {
    /// An invoice for `client_id` with a grand total of 1000 KES
    pub fn invoice(client_id: ClientId) -> Self {
        let grand = MoneyFixtures::grand_total();
        Self {
            doc_type: "invoice".to_string(),
            currency: MoneyFixtures::kes().to_string(),
            client_id: Some(client_id),
            notes: None,
            services: vec![ServiceFixtures::flat(grand)],
            subtotal: Some(grand),
            vat_total: Some(Decimal::ZERO),
            grand_total: Some(grand),
        }
    }

    pub fn quotation(client_id: ClientId) -> Self {
        Self::invoice(client_id).with_type("quotation")
    }

    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = doc_type.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn without_client(mut self) -> Self {
        self.client_id = None;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets all three totals so that `grand_total = subtotal`
    pub fn with_grand_total(mut self, grand_total: Decimal) -> Self {
        self.services = vec![ServiceFixtures::flat(grand_total)];
        self.subtotal = Some(grand_total);
        self.vat_total = Some(Decimal::ZERO);
        self.grand_total = Some(grand_total);
        self
    }

    /// Replaces the line items and clears the totals so they are computed
    pub fn with_services(mut self, services: Vec<ServiceLine>) -> Self {
        self.services = services;
        self.subtotal = None;
        self.vat_total = None;
        self.grand_total = None;
        self
    }

    pub fn build(self) -> CreateDocument {
        CreateDocument {
            doc_type: self.doc_type,
            currency: self.currency,
            client_id: self.client_id,
            notes: self.notes,
            services: self.services,
            subtotal: self.subtotal,
            vat_total: self.vat_total,
            grand_total: self.grand_total,
        }
    }
}

/// Builder for `CreatePayment`
pub struct CreatePaymentBuilder {
    inner: CreatePayment,
}

impl CreatePaymentBuilder {
    /// A bank transfer of `amount` against `billing_id`
    pub fn new(billing_id: BillingId, amount: Decimal) -> Self {
        Self {
            inner: CreatePayment {
                billing_id: Some(billing_id),
                payment_date: Some(DateFixtures::first_payment()),
                amount_paid: Some(amount),
                payment_method: Some("Bank Transfer".to_string()),
                transaction_reference: None,
                notes: None,
            },
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.inner.payment_date = Some(date);
        self
    }

    pub fn via(mut self, method: impl Into<String>) -> Self {
        self.inner.payment_method = Some(method.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.inner.transaction_reference = Some(reference.into());
        self
    }

    pub fn without_date(mut self) -> Self {
        self.inner.payment_date = None;
        self
    }

    pub fn build(self) -> CreatePayment {
        self.inner
    }
}

/// Document change that only moves the grand total
pub fn grand_total_change(grand_total: Decimal) -> DocumentChanges {
    DocumentChanges {
        grand_total: Some(grand_total),
        ..Default::default()
    }
}

/// Payment change that only moves the amount
pub fn amount_change(amount: Decimal) -> PaymentChanges {
    PaymentChanges {
        amount_paid: Some(amount),
        ..Default::default()
    }
}

/// A small mixed invoice used where the computed totals matter
pub fn mixed_services() -> Vec<ServiceLine> {
    vec![
        ServiceFixtures::web_hosting(),
        ServiceFixtures::domain_renewal(),
        ServiceLine::new("Setup fee", dec!(80.50)),
    ]
}
