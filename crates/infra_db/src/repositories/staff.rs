//! Staff user repository (login lookups only)

use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{StaffAccount, StaffId};

use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: PgPool,
}

impl StaffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Case-insensitive lookup by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<StaffRow>, DatabaseError> {
        let row = sqlx::query_as::<_, StaffRow>(
            r#"
            SELECT id, email, display_name, password_hash, role, is_active
            FROM staff_users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

impl From<StaffRow> for StaffAccount {
    fn from(row: StaffRow) -> Self {
        StaffAccount {
            id: StaffId::from_uuid(row.id),
            email: row.email,
            display_name: row.display_name,
            password_hash: row.password_hash,
            role: row.role,
            is_active: row.is_active,
        }
    }
}
