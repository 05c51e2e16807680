//! Test Utilities Crate
//!
//! Shared test infrastructure for the billing ledger.
//!
//! # Modules
//!
//! - `ledger`: in-memory `LedgerStore` and `StaffDirectory` adapters
//! - `fixtures`: predictable currencies, line items, dates and staff
//! - `builders`: builders for service commands
//! - `assertions`: ledger invariant checks
//! - `generators`: proptest strategies and `fake` data
//! - `database`: PostgreSQL test containers

pub mod assertions;
pub mod builders;
pub mod database;
pub mod fixtures;
pub mod generators;
pub mod ledger;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use fixtures::*;
pub use generators::*;
pub use ledger::{Customer, InMemoryLedger, InMemoryLedgerTx, InMemoryStaffDirectory};
