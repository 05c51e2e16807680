//! Table-level data access
//!
//! Each repository owns the SQL for one table and the mapping between its
//! rows and domain types. Queries are runtime-checked (`query_as` with
//! `FromRow`), so the crate builds without a live database.
//!
//! Reads use the pool; anything that must join a transaction takes a
//! `&mut PgConnection` instead.

pub mod billing;
pub mod payments;
pub mod staff;

pub use billing::{BillingListingRow, BillingRepository, BillingRow, DbDocumentType, DbPaymentStatus};
pub use payments::{PaymentListingRow, PaymentRepository, PaymentRow};
pub use staff::{StaffRepository, StaffRow};
