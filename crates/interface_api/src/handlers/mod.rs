//! Request handlers, one module per resource

pub mod auth;
pub mod billing;
pub mod health;
pub mod payments;
