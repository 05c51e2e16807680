//! Port adapters
//!
//! Implementations of the domain ports backed by PostgreSQL:
//! - [`PostgresLedger`] for `domain_billing::LedgerStore` / `LedgerTx`
//! - [`PostgresStaffDirectory`] for `core_kernel::StaffDirectory`
//!
//! Database errors are translated to `PortError` here; nothing above this
//! layer sees SQLx types.

pub mod ledger;
pub mod staff;

pub use ledger::{PostgresLedger, PostgresLedgerTx};
pub use staff::PostgresStaffDirectory;
