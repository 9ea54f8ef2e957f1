use async_trait::async_trait;
use sqlx::PgPool;

use super::record::AuditEvent;

#[derive(Debug)]
pub struct AuditStoreError {
    pub message: String,
}

impl std::fmt::Display for AuditStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<sqlx::Error> for AuditStoreError {
    fn from(err: sqlx::Error) -> Self {
        AuditStoreError {
            message: err.to_string(),
        }
    }
}

/// Append-only sink for audit events. The recorder only ever inserts; reads
/// live in `db::audit` and are not part of this seam.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, event: &AuditEvent) -> Result<(), AuditStoreError>;
}

/// Production store: one row per event in the `audit_log` table.
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn insert(&self, event: &AuditEvent) -> Result<(), AuditStoreError> {
        crate::db::audit::insert(&self.pool, event).await?;
        Ok(())
    }
}
