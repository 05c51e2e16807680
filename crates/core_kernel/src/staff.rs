//! Staff directory port
//!
//! Authentication only needs to look staff members up by email and read
//! their stored password hash; account management itself lives elsewhere.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::identifiers::StaffId;
use crate::ports::{DomainPort, PortError};

/// A staff member as seen by the login flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffAccount {
    pub id: StaffId,
    pub email: String,
    pub display_name: String,
    /// Argon2 PHC string; never serialized back to clients
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

/// Lookup of staff credentials
#[async_trait]
pub trait StaffDirectory: DomainPort {
    /// Finds an account by email, compared case-insensitively
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffAccount>, PortError>;
}
