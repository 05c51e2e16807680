//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the billing ledger using SQLx.
//!
//! # Layout
//!
//! - [`pool`]: connection pool configuration and embedded migrations
//! - [`repositories`]: per-table SQL and row mapping
//! - [`adapters`]: implementations of the domain ports
//!
//! # Locking
//!
//! Every reconciliation starts with `SELECT ... FOR UPDATE` on the billing
//! row, so concurrent payment writes on the same document serialize while
//! writes on different documents never contend.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedger};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/erp")).await?;
//! run_migrations(&pool).await?;
//! let ledger = PostgresLedger::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PostgresLedger, PostgresLedgerTx, PostgresStaffDirectory};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
