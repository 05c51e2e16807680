//! PostgreSQL staff directory

use async_trait::async_trait;
use sqlx::PgPool;

use core_kernel::{DomainPort, PortError, StaffAccount, StaffDirectory};

use crate::repositories::StaffRepository;

#[derive(Debug, Clone)]
pub struct PostgresStaffDirectory {
    repository: StaffRepository,
}

impl PostgresStaffDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: StaffRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresStaffDirectory {}

#[async_trait]
impl StaffDirectory for PostgresStaffDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffAccount>, PortError> {
        let row = self.repository.find_by_email(email).await?;
        Ok(row.map(StaffAccount::from))
    }
}
